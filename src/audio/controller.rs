//! Playback and visualizer state machine behind the player panel.
//!
//! The controller is the single owner of player state. It is driven entirely
//! by [`PlayerInput`]s: user actions, media notifications, frame ticks and the
//! loading-hold timer. Each input runs to completion before the next one.
//!
//! Phases:
//! - `Paused`
//! - `Playing { frame }`: a visualizer frame is pending
//! - `Loading { hold, resume }`: a track change is waiting out the hold
//!
//! Frames and timers carry handles; a callback whose handle is not the one
//! the current phase is waiting for is stale and gets dropped.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::commands::UserAction;
use crate::audio::host::{
    FrameHandle, FrequencyAnalyzer, MediaElement, MediaEvent, Scheduler, TimerHandle,
};
use crate::audio::playlist::Playlist;
use crate::audio::state::{PlaybackStatus, PlayerState, Track};
use crate::audio::time::format_time;
use crate::audio::visualizer::{bars_from_spectrum, VisualizerBars, IDLE_BARS};

/// Artificial buffering pause inserted on every track change
pub const DEFAULT_LOADING_HOLD: Duration = Duration::from_millis(500);

/// Initial settings for a controller.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub start_index: usize,
    pub volume: f32,
    pub loading_hold: Duration,
    pub shuffle: bool,
    pub repeat: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            start_index: 0,
            volume: 1.0,
            loading_hold: DEFAULT_LOADING_HOLD,
            shuffle: false,
            repeat: false,
        }
    }
}

/// Everything that can drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerInput {
    User(UserAction),
    Media(MediaEvent),
    Frame(FrameHandle),
    HoldElapsed(TimerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Paused,
    Playing { frame: FrameHandle },
    Loading { hold: TimerHandle, resume: bool },
}

impl Phase {
    fn status(&self) -> PlaybackStatus {
        match self {
            Phase::Paused => PlaybackStatus::Paused,
            Phase::Playing { .. } => PlaybackStatus::Playing,
            Phase::Loading { .. } => PlaybackStatus::Loading,
        }
    }
}

pub struct PlayerController<M, A, S>
where
    M: MediaElement,
    A: FrequencyAnalyzer,
    S: Scheduler,
{
    playlist: Playlist,
    media: M,
    analyzer: A,
    scheduler: S,
    rng: StdRng,
    phase: Phase,
    current_index: usize,
    progress_percent: f64,
    current_time_label: String,
    duration_label: String,
    volume: f32,
    muted: bool,
    bars: VisualizerBars,
    shuffle: bool,
    repeat: bool,
    loading_hold: Duration,
}

impl<M, A, S> PlayerController<M, A, S>
where
    M: MediaElement,
    A: FrequencyAnalyzer,
    S: Scheduler,
{
    /// Mount the player: point the media element at the first track and apply the volume.
    pub fn new(
        playlist: Playlist,
        options: PlayerOptions,
        mut media: M,
        analyzer: A,
        scheduler: S,
    ) -> Self {
        let current_index = if options.start_index < playlist.len() {
            options.start_index
        } else {
            log::warn!(
                "Start index {} out of range for {} tracks, starting at 0",
                options.start_index,
                playlist.len()
            );
            0
        };
        let volume = if options.volume.is_finite() {
            options.volume.clamp(0.0, 1.0)
        } else {
            1.0
        };

        // Same rule as the volume slider: starting at zero starts muted.
        let muted = volume == 0.0;
        media.set_volume(volume);
        media.set_muted(muted);
        if let Some(track) = playlist.get(current_index) {
            media.set_source(&track.source);
            media.load();
        }

        log::info!(
            "Player mounted with {} tracks at index {}",
            playlist.len(),
            current_index
        );

        Self {
            playlist,
            media,
            analyzer,
            scheduler,
            rng: StdRng::from_os_rng(),
            phase: Phase::Paused,
            current_index,
            progress_percent: 0.0,
            current_time_label: format_time(None),
            duration_label: format_time(None),
            volume,
            muted,
            bars: IDLE_BARS,
            shuffle: options.shuffle,
            repeat: options.repeat,
            loading_hold: options.loading_hold,
        }
    }

    /// Replace the shuffle random source (deterministic tests, replays).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn handle(&mut self, input: PlayerInput) {
        match input {
            PlayerInput::User(action) => self.dispatch(action),
            PlayerInput::Media(event) => self.on_media_event(event),
            PlayerInput::Frame(handle) => self.on_frame(handle),
            PlayerInput::HoldElapsed(handle) => self.on_hold_elapsed(handle),
        }
    }

    pub fn dispatch(&mut self, action: UserAction) {
        match action {
            UserAction::TogglePlay => self.toggle_play(),
            UserAction::SkipForward => self.skip_forward(),
            UserAction::SkipBackward => self.skip_backward(),
            UserAction::ToggleShuffle => self.toggle_shuffle(),
            UserAction::ToggleRepeat => self.toggle_repeat(),
            UserAction::ToggleMute => self.toggle_mute(),
            UserAction::SetVolume(volume) => self.set_volume(volume),
            UserAction::SeekPercent(percent) => self.seek_percent(percent),
            UserAction::Select(index) => self.select(index),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.phase.status()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_track(&self) -> &Track {
        &self.playlist.tracks()[self.current_index]
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Snapshot of everything the panel displays.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            current_index: self.current_index,
            current_track: self.current_track().clone(),
            status: self.status(),
            progress_percent: self.progress_percent,
            current_time_label: self.current_time_label.clone(),
            duration_label: self.duration_label.clone(),
            volume: self.volume,
            is_muted: self.muted,
            visualizer_bars: self.bars,
            shuffle_enabled: self.shuffle,
            repeat_enabled: self.repeat,
        }
    }

    // User actions

    pub fn toggle_play(&mut self) {
        match self.phase {
            Phase::Loading { .. } => log::trace!("Ignoring toggle while loading"),
            Phase::Paused => {
                self.ensure_analyzer();
                if self.start_playback() {
                    log::debug!("Playing {}", self.current_track().title);
                }
            }
            Phase::Playing { .. } => {
                self.media.pause();
                self.settle_paused();
                log::debug!("Paused");
            }
        }
    }

    pub fn skip_forward(&mut self) {
        if self.is_loading() {
            log::trace!("Ignoring skip forward while loading");
            return;
        }
        let next = self.next_index();
        self.begin_track_change(next);
    }

    pub fn skip_backward(&mut self) {
        if self.is_loading() {
            log::trace!("Ignoring skip backward while loading");
            return;
        }
        let prev = self.playlist.prev_index(self.current_index);
        self.begin_track_change(prev);
    }

    /// Jump to a playlist entry. Re-selecting the current entry restarts it.
    pub fn select(&mut self, index: usize) {
        if self.is_loading() {
            log::trace!("Ignoring select while loading");
            return;
        }
        if index >= self.playlist.len() {
            log::warn!(
                "Ignoring select of track {} ({} tracks)",
                index,
                self.playlist.len()
            );
            return;
        }
        self.begin_track_change(index);
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        log::debug!("Shuffle {}", if self.shuffle { "on" } else { "off" });
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
        log::debug!("Repeat {}", if self.repeat { "on" } else { "off" });
    }

    /// Flip mute without touching the volume level.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.media.set_muted(self.muted);
    }

    /// Volume slider. Dragging to exactly zero mutes; other values leave mute alone.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            log::warn!("Ignoring non-finite volume {}", volume);
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        self.media.set_volume(volume);
        if volume == 0.0 {
            self.muted = true;
            self.media.set_muted(true);
        }
    }

    /// Progress bar click. Needs a known duration.
    pub fn seek_percent(&mut self, percent: f64) {
        if self.is_loading() {
            log::trace!("Ignoring seek while loading");
            return;
        }
        let Some(duration) = self
            .media
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
        else {
            log::debug!("Ignoring seek, duration unknown");
            return;
        };
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.media.set_current_time(percent / 100.0 * duration);
    }

    // Host callbacks

    pub fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate => self.on_time_update(),
            MediaEvent::MetadataLoaded => self.on_metadata_loaded(),
            MediaEvent::Ended => self.on_ended(),
        }
    }

    pub fn on_frame(&mut self, handle: FrameHandle) {
        match self.phase {
            Phase::Playing { frame } if frame == handle => {
                self.bars = bars_from_spectrum(self.analyzer.sample());
                let frame = self.scheduler.request_frame();
                self.phase = Phase::Playing { frame };
            }
            _ => log::trace!("Dropping stale frame {:?}", handle),
        }
    }

    /// End of the loading hold: load the new source and resume if playback was active.
    pub fn on_hold_elapsed(&mut self, handle: TimerHandle) {
        let resume = match self.phase {
            Phase::Loading { hold, resume } if hold == handle => resume,
            _ => {
                log::trace!("Dropping stale hold timer {:?}", handle);
                return;
            }
        };

        self.phase = Phase::Paused;
        let source = self.current_track().source.clone();
        self.media.set_source(&source);
        self.media.load();
        log::info!(
            "Loaded track {}: {} - {}",
            self.current_index,
            self.current_track().artist,
            self.current_track().title
        );

        if resume {
            self.start_playback();
        }
    }

    fn on_time_update(&mut self) {
        if self.is_loading() {
            return;
        }
        let current = self.media.current_time();
        let current = if current.is_finite() && current > 0.0 {
            current
        } else {
            0.0
        };
        let duration = self
            .media
            .duration()
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        self.progress_percent = (current / duration.max(1.0) * 100.0).clamp(0.0, 100.0);
        self.current_time_label = format_time(Some(current));
    }

    fn on_metadata_loaded(&mut self) {
        self.duration_label = format_time(self.media.duration());
    }

    fn on_ended(&mut self) {
        match self.phase {
            Phase::Loading { .. } => log::trace!("Ignoring ended while loading"),
            _ if self.repeat => {
                log::debug!("Repeating {}", self.current_track().title);
                self.media.set_current_time(0.0);
                if matches!(self.phase, Phase::Playing { .. }) {
                    self.start_playback();
                }
            }
            _ => {
                let next = self.next_index();
                self.begin_track_change(next);
            }
        }
    }

    // Transitions

    fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    fn next_index(&mut self) -> usize {
        if self.shuffle {
            self.playlist.random_other(self.current_index, &mut self.rng)
        } else {
            self.playlist.next_index(self.current_index)
        }
    }

    fn ensure_analyzer(&mut self) {
        if self.analyzer.is_attached() {
            return;
        }
        match self.analyzer.attach(self.media.output_tap()) {
            Ok(()) => log::debug!("Frequency analyzer attached"),
            Err(e) => log::warn!("Visualizer disabled: {}", e),
        }
    }

    /// Ask the media element to play. Refusal settles in `Paused`.
    fn start_playback(&mut self) -> bool {
        match self.media.play() {
            Ok(()) => {
                self.enter_playing();
                true
            }
            Err(e) => {
                log::warn!("Playback refused: {}", e);
                self.settle_paused();
                false
            }
        }
    }

    fn enter_playing(&mut self) {
        if matches!(self.phase, Phase::Playing { .. }) {
            return;
        }
        self.cancel_pending();
        let frame = self.scheduler.request_frame();
        self.phase = Phase::Playing { frame };
    }

    fn settle_paused(&mut self) {
        self.cancel_pending();
        self.phase = Phase::Paused;
        self.bars = IDLE_BARS;
    }

    fn cancel_pending(&mut self) {
        match self.phase {
            Phase::Playing { frame } => self.scheduler.cancel_frame(frame),
            Phase::Loading { hold, .. } => self.scheduler.clear_timeout(hold),
            Phase::Paused => {}
        }
    }

    fn begin_track_change(&mut self, index: usize) {
        let resume = match self.phase {
            Phase::Playing { .. } => true,
            Phase::Loading { resume, .. } => resume,
            Phase::Paused => false,
        };

        self.cancel_pending();
        self.bars = IDLE_BARS;
        self.media.pause();

        self.current_index = index;
        self.progress_percent = 0.0;
        self.current_time_label = format_time(None);

        let hold = self.scheduler.set_timeout(self.loading_hold);
        self.phase = Phase::Loading { hold, resume };
        log::debug!(
            "Switching to track {} ({}), resume: {}",
            index,
            self.current_track().title,
            resume
        );
    }
}

impl<M, A, S> Drop for PlayerController<M, A, S>
where
    M: MediaElement,
    A: FrequencyAnalyzer,
    S: Scheduler,
{
    fn drop(&mut self) {
        self.cancel_pending();
        self.media.pause();
        log::debug!("Player unmounted");
    }
}
