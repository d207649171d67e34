//! Collaborators the player controller drives.
//!
//! The controller never blocks on these. Anything that happens later (media
//! notifications, frame ticks, timer expiry) is fed back into the controller
//! as a [`PlayerInput`](crate::audio::controller::PlayerInput) by whoever owns it.

use std::time::Duration;

use crate::audio::error::PlayerError;
use crate::audio::tap::SampleTap;

/// Notifications emitted by a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Playback position advanced (or was moved by a seek)
    TimeUpdate,
    /// Duration of the loaded source is known
    MetadataLoaded,
    /// Playback reached the end of the source
    Ended,
}

/// Playback primitive. Decoding and transport live behind this trait.
pub trait MediaElement {
    /// Point the element at a new source. Takes effect on the next `load`.
    fn set_source(&mut self, locator: &str);

    /// Reset the element to its current source.
    fn load(&mut self);

    /// Start playback. May be refused, e.g. when the source failed to load.
    fn play(&mut self) -> Result<(), PlayerError>;

    fn pause(&mut self);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Duration in seconds, `None` until known.
    fn duration(&self) -> Option<f64>;

    fn set_current_time(&mut self, seconds: f64);

    fn set_volume(&mut self, volume: f32);

    fn set_muted(&mut self, muted: bool);

    /// Tap on the audio output, used to attach a frequency analyzer.
    fn output_tap(&self) -> SampleTap;

    /// Drain notifications raised since the last call.
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

/// Frequency magnitude source attached to the media output.
pub trait FrequencyAnalyzer {
    fn attach(&mut self, tap: SampleTap) -> Result<(), PlayerError>;

    fn is_attached(&self) -> bool;

    /// Current spectrum, one byte (0-255) per bin.
    fn sample(&mut self) -> &[u8];
}

/// Identifies a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Identifies a pending timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Display-rate callback source.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// One-shot delay used for the loading hold.
pub trait HoldTimer {
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// Frames plus timeouts, which is everything the controller schedules.
pub trait Scheduler: FrameScheduler + HoldTimer {}

impl<T: FrameScheduler + HoldTimer> Scheduler for T {}
