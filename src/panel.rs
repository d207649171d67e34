//! One-line text rendering of the player panel.

use crate::audio::state::{PlaybackStatus, PlayerState};
use crate::audio::visualizer::IDLE_FLOOR;

const PROGRESS_WIDTH: usize = 20;
const BAR_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn status_glyph(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "▶",
        PlaybackStatus::Paused => "⏸",
        PlaybackStatus::Loading => "…",
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let mut bar = String::with_capacity(PROGRESS_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat('#').take(filled));
    bar.extend(std::iter::repeat('-').take(PROGRESS_WIDTH - filled));
    bar.push(']');
    bar
}

/// Bar height (20..=100) to a block glyph.
fn bar_glyph(height: f32) -> char {
    let span = 100.0 - IDLE_FLOOR;
    let level = ((height - IDLE_FLOOR) / span * (BAR_GLYPHS.len() - 1) as f32).round();
    BAR_GLYPHS[(level.max(0.0) as usize).min(BAR_GLYPHS.len() - 1)]
}

pub fn render(state: &PlayerState) -> String {
    let bars: String = state.visualizer_bars.iter().map(|h| bar_glyph(*h)).collect();

    let mut flags = Vec::new();
    if state.shuffle_enabled {
        flags.push("shuffle".to_string());
    }
    if state.repeat_enabled {
        flags.push("repeat".to_string());
    }
    if state.is_muted {
        flags.push("muted".to_string());
    } else {
        flags.push(format!("vol {:.0}%", state.volume * 100.0));
    }

    format!(
        "{} {} - {}  {} / {}  {}  {}  {}",
        status_glyph(state.status),
        state.current_track.title,
        state.current_track.artist,
        state.current_time_label,
        state.duration_label,
        progress_bar(state.progress_percent),
        bars,
        flags.join(" ")
    )
}
