use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio::time::format_time;
use crate::audio::visualizer::{VisualizerBars, IDLE_BARS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// File path or http(s) URL handed to the media element
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Paused,
    Playing,
    Loading,
}

/// Display state of the player panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    pub current_index: usize,
    pub current_track: Track,
    pub status: PlaybackStatus,
    pub progress_percent: f64,
    pub current_time_label: String,
    pub duration_label: String,
    pub volume: f32,
    pub is_muted: bool,
    pub visualizer_bars: VisualizerBars,
    pub shuffle_enabled: bool,
    pub repeat_enabled: bool,
}

impl PlayerState {
    pub fn new(current_index: usize, current_track: Track) -> Self {
        Self {
            current_index,
            current_track,
            status: PlaybackStatus::Paused,
            progress_percent: 0.0,
            current_time_label: format_time(None),
            duration_label: format_time(None),
            volume: 1.0,
            is_muted: false,
            visualizer_bars: IDLE_BARS,
            shuffle_enabled: false,
            repeat_enabled: false,
        }
    }
}

pub type SharedState = Arc<RwLock<PlayerState>>;

pub fn create_shared_state(initial: PlayerState) -> SharedState {
    Arc::new(RwLock::new(initial))
}
