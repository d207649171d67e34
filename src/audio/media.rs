//! Media element backed by a Rodio sink.
//!
//! An element opened on the default device owns the output stream, which is
//! not Send, so it must be created on the thread that drives it (see `engine`).

use std::io::Cursor;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::audio::error::PlayerError;
use crate::audio::host::{MediaElement, MediaEvent};
use crate::audio::source::{container_duration, TrackSource};
use crate::audio::tap::{SampleTap, TappedSource};

/// Interval between time updates while playing
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Tracks playback position using wall-clock time.
///
/// Since Rodio doesn't expose the current playback position, we track it
/// by measuring elapsed time while playing.
#[derive(Debug)]
struct PositionTracker {
    /// When playback started (or resumed)
    play_start: Option<Instant>,
    /// Accumulated position from previous play segments
    accumulated_secs: f64,
}

impl PositionTracker {
    fn new() -> Self {
        Self {
            play_start: None,
            accumulated_secs: 0.0,
        }
    }

    /// Start or resume tracking
    fn start(&mut self) {
        if self.play_start.is_none() {
            self.play_start = Some(Instant::now());
        }
    }

    /// Pause tracking, accumulating elapsed time
    fn pause(&mut self) {
        if let Some(start) = self.play_start.take() {
            self.accumulated_secs += start.elapsed().as_secs_f64();
        }
    }

    fn reset(&mut self) {
        self.play_start = None;
        self.accumulated_secs = 0.0;
    }

    /// Seek to a specific position
    fn seek(&mut self, position_secs: f64) {
        self.accumulated_secs = position_secs;
        if self.play_start.is_some() {
            self.play_start = Some(Instant::now());
        }
    }

    /// Current position in seconds
    fn position(&self) -> f64 {
        let current_segment = self
            .play_start
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.accumulated_secs + current_segment
    }

    fn is_playing(&self) -> bool {
        self.play_start.is_some()
    }
}

/// Decoded track ready to be queued on the sink.
fn decode(
    payload: &Bytes,
    tap: &SampleTap,
) -> Result<TappedSource<impl Source<Item = f32>>, PlayerError> {
    let decoder = Decoder::new(Cursor::new(payload.clone()))
        .map_err(|e| PlayerError::Decode(e.to_string()))?;
    Ok(TappedSource::new(decoder.convert_samples::<f32>(), tap.clone()))
}

pub struct RodioMediaElement {
    /// Kept alive while the sink plays through it; `None` for detached sinks
    _stream: Option<OutputStream>,
    sink: Sink,
    tap: SampleTap,
    source: Option<TrackSource>,
    payload: Option<Bytes>,
    /// Reason the last load failed, reported by `play`
    load_error: Option<String>,
    duration: Option<f64>,
    position: PositionTracker,
    volume: f32,
    muted: bool,
    events: Vec<MediaEvent>,
    last_time_update: Instant,
}

impl RodioMediaElement {
    /// Open the default audio output.
    pub fn open() -> Result<Self, PlayerError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| PlayerError::OutputUnavailable(e.to_string()))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| PlayerError::OutputUnavailable(e.to_string()))?;

        log::info!("Audio output opened");
        Ok(Self {
            _stream: Some(stream),
            ..Self::with_sink(sink)
        })
    }

    /// Drive an existing sink, e.g. one from `Sink::new_idle` whose queue
    /// output is consumed elsewhere.
    pub fn with_sink(sink: Sink) -> Self {
        sink.pause();
        Self {
            _stream: None,
            sink,
            tap: SampleTap::new(),
            source: None,
            payload: None,
            load_error: None,
            duration: None,
            position: PositionTracker::new(),
            volume: 1.0,
            muted: false,
            events: Vec::new(),
            last_time_update: Instant::now(),
        }
    }

    fn apply_volume(&self) {
        self.sink.set_volume(if self.muted { 0.0 } else { self.volume });
    }

    /// Queue the loaded payload again once the sink has drained.
    fn ensure_queued(&mut self) -> Result<(), PlayerError> {
        if !self.sink.empty() {
            return Ok(());
        }
        let payload = self.payload.as_ref().ok_or(PlayerError::NotLoaded)?;
        let source = decode(payload, &self.tap)?;
        self.sink.append(source);
        Ok(())
    }

    fn fetch_current(&mut self) -> Result<(), PlayerError> {
        let source = self.source.as_ref().ok_or(PlayerError::NotLoaded)?;
        let payload = source.fetch()?;

        let extension = source.extension();
        let decoded = decode(&payload, &self.tap)?;
        self.duration = container_duration(&payload, extension.as_deref())
            .or_else(|| decoded.total_duration().map(|d| d.as_secs_f64()));

        self.sink.append(decoded);
        self.payload = Some(payload);
        Ok(())
    }
}

impl MediaElement for RodioMediaElement {
    fn set_source(&mut self, locator: &str) {
        self.source = Some(TrackSource::from_url(locator));
    }

    fn load(&mut self) {
        self.sink.stop();
        self.sink.pause();
        self.tap.clear();
        self.position.reset();
        self.payload = None;
        self.duration = None;
        self.load_error = None;
        self.events.clear();

        match self.fetch_current() {
            Ok(()) => {
                log::debug!("Source loaded, duration {:?}", self.duration);
                self.events.push(MediaEvent::MetadataLoaded);
            }
            Err(e) => {
                log::warn!("Failed to load source: {}", e);
                self.load_error = Some(e.to_string());
            }
        }
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if let Some(reason) = &self.load_error {
            return Err(PlayerError::SourceUnavailable {
                locator: self
                    .source
                    .as_ref()
                    .map(TrackSource::locator)
                    .unwrap_or_default(),
                reason: reason.clone(),
            });
        }

        let finished = self.sink.empty()
            && self
                .duration
                .is_some_and(|d| self.position.position() >= d);
        self.ensure_queued()?;
        if finished {
            self.position.reset();
        }

        self.sink.play();
        self.position.start();
        self.last_time_update = Instant::now();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        if self.position.is_playing() {
            self.position.pause();
            self.events.push(MediaEvent::TimeUpdate);
        }
    }

    fn current_time(&self) -> f64 {
        let position = self.position.position();
        match self.duration {
            Some(d) => position.min(d),
            None => position,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_current_time(&mut self, seconds: f64) {
        if self.payload.is_none() {
            return;
        }
        let max = self.duration.unwrap_or(f64::MAX);
        let clamped = if seconds.is_finite() {
            seconds.clamp(0.0, max)
        } else {
            0.0
        };

        if let Err(e) = self.ensure_queued() {
            log::warn!("Seek failed: {}", e);
            return;
        }
        let Ok(target) = Duration::try_from_secs_f64(clamped) else {
            log::warn!("Seek target {} out of range", clamped);
            return;
        };
        match self.sink.try_seek(target) {
            Ok(()) => log::debug!("Seeked to {:.1}s", clamped),
            Err(e) => log::warn!("Seek failed: {}", e),
        }

        self.position.seek(clamped);
        self.events.push(MediaEvent::TimeUpdate);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }

    fn output_tap(&self) -> SampleTap {
        self.tap.clone()
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        if self.position.is_playing() {
            if self.sink.empty() {
                log::debug!("Track ended");
                self.sink.pause();
                self.position.pause();
                if let Some(d) = self.duration {
                    self.position.seek(d);
                }
                self.events.push(MediaEvent::TimeUpdate);
                self.events.push(MediaEvent::Ended);
            } else if self.last_time_update.elapsed() >= TIME_UPDATE_INTERVAL {
                self.events.push(MediaEvent::TimeUpdate);
                self.last_time_update = Instant::now();
            }
        }
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::queue::SourcesQueueOutput;
    use std::thread;

    #[test]
    fn position_accumulates_across_segments() {
        let mut position = PositionTracker::new();
        position.start();
        thread::sleep(Duration::from_millis(20));
        position.pause();
        let first = position.position();
        assert!(first >= 0.02);
        assert!(!position.is_playing());

        thread::sleep(Duration::from_millis(20));
        assert_eq!(position.position(), first);

        position.seek(10.0);
        assert_eq!(position.position(), 10.0);
        position.reset();
        assert_eq!(position.position(), 0.0);
    }

    #[test]
    fn decodes_wav_payload_through_tap() {
        let wav = crate::audio::source::tests::wav_bytes(8_000, 800);
        let tap = SampleTap::new();
        let source = decode(&wav, &tap).unwrap();
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 8_000);
        assert_eq!(source.count(), 800);
        assert_eq!(tap.len(), 800);
    }

    #[test]
    fn rejects_undecodable_payload() {
        let junk = Bytes::from_static(b"definitely not audio");
        assert!(matches!(
            decode(&junk, &SampleTap::new()),
            Err(PlayerError::Decode(_))
        ));
    }

    /// Element on an idle sink plus the queue output standing in for the device.
    fn detached() -> (RodioMediaElement, SourcesQueueOutput<f32>) {
        let (sink, output) = Sink::new_idle();
        (RodioMediaElement::with_sink(sink), output)
    }

    /// Mono 8 kHz WAV on disk.
    fn wav_file(dir: &tempfile::TempDir, frames: u32) -> String {
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, crate::audio::source::tests::wav_bytes(8_000, frames)).unwrap();
        path.display().to_string()
    }

    /// Pull samples the way the output device would until the sink drains.
    fn drain(media: &RodioMediaElement, output: &mut SourcesQueueOutput<f32>) {
        for _ in 0..1_000_000 {
            if media.sink.empty() {
                return;
            }
            output.next();
        }
        panic!("sink never drained");
    }

    #[test]
    fn load_reports_metadata_and_duration() {
        let dir = tempfile::tempdir().unwrap();
        let (mut media, _output) = detached();
        media.set_source(&wav_file(&dir, 800));
        media.load();

        assert_eq!(media.poll_events(), vec![MediaEvent::MetadataLoaded]);
        assert!((media.duration().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(media.current_time(), 0.0);
        assert!(media.output_tap().is_empty());
    }

    #[test]
    fn drained_sink_ends_at_duration() {
        let dir = tempfile::tempdir().unwrap();
        let (mut media, mut output) = detached();
        media.set_source(&wav_file(&dir, 800));
        media.load();
        media.poll_events();

        media.play().unwrap();
        drain(&media, &mut output);

        assert_eq!(
            media.poll_events(),
            vec![MediaEvent::TimeUpdate, MediaEvent::Ended]
        );
        assert!((media.current_time() - 0.1).abs() < 1e-6);
        assert!(!media.output_tap().is_empty());
        assert!(media.poll_events().is_empty());

        // Playing again after the end starts over.
        media.play().unwrap();
        assert!(media.current_time() < 0.05);
        assert!(!media.sink.empty());
    }

    #[test]
    fn time_updates_follow_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let (mut media, _output) = detached();
        media.set_source(&wav_file(&dir, 8_000));
        media.load();
        media.poll_events();

        media.play().unwrap();
        assert!(media.poll_events().is_empty());

        thread::sleep(TIME_UPDATE_INTERVAL + Duration::from_millis(20));
        assert_eq!(media.poll_events(), vec![MediaEvent::TimeUpdate]);
        assert!(media.poll_events().is_empty());

        media.pause();
        assert_eq!(media.poll_events(), vec![MediaEvent::TimeUpdate]);
        thread::sleep(TIME_UPDATE_INTERVAL + Duration::from_millis(20));
        assert!(media.poll_events().is_empty());
    }

    #[test]
    fn muted_sink_stays_silent_across_volume_changes() {
        let (mut media, _output) = detached();
        media.set_volume(0.6);
        assert_eq!(media.sink.volume(), 0.6);

        media.set_muted(true);
        assert_eq!(media.sink.volume(), 0.0);
        media.set_volume(0.3);
        assert_eq!(media.sink.volume(), 0.0);

        media.set_muted(false);
        assert_eq!(media.sink.volume(), 0.3);
    }

    #[test]
    fn failed_load_is_reported_by_play() {
        let (mut media, _output) = detached();
        assert!(matches!(media.play(), Err(PlayerError::NotLoaded)));

        media.set_source("/definitely/not/here.wav");
        media.load();
        assert!(media.poll_events().is_empty());
        assert_eq!(media.duration(), None);

        match media.play() {
            Err(PlayerError::SourceUnavailable { locator, .. }) => {
                assert_eq!(locator, "/definitely/not/here.wav")
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
        assert!(media.poll_events().is_empty());
    }
}
