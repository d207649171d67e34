//! Copies the playback stream into a ring buffer for analysis.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::Source;

/// Mono samples retained for analysis
pub const TAP_CAPACITY: usize = 4096;

/// Shared ring of the most recent mono samples sent to the output.
#[derive(Clone, Default)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl SampleTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample, evicting the oldest once full.
    /// Skips the write if a reader holds the lock so the audio path never waits.
    pub fn push(&self, sample: f32) {
        if let Some(mut buf) = self.samples.try_lock() {
            if buf.len() >= TAP_CAPACITY {
                buf.pop_front();
            }
            buf.push_back(sample);
        }
    }

    /// Copy the newest `out.len()` samples into `out`, oldest first.
    /// Missing history is zero-filled at the front.
    pub fn read_latest(&self, out: &mut [f32]) {
        let buf = self.samples.lock();
        let available = buf.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);
        for (slot, sample) in out[pad..].iter_mut().zip(buf.range(buf.len() - available..)) {
            *slot = *sample;
        }
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source wrapper that down-mixes each frame into the tap while passing samples through.
pub struct TappedSource<S> {
    inner: S,
    tap: SampleTap,
    frame_sum: f32,
    frame_pos: u16,
}

impl<S> TappedSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, tap: SampleTap) -> Self {
        Self {
            inner,
            tap,
            frame_sum: 0.0,
            frame_pos: 0,
        }
    }
}

impl<S> Iterator for TappedSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        let channels = self.inner.channels().max(1);

        self.frame_sum += sample;
        self.frame_pos += 1;
        if self.frame_pos >= channels {
            self.tap.push(self.frame_sum / channels as f32);
            self.frame_sum = 0.0;
            self.frame_pos = 0;
        }

        Some(sample)
    }
}

impl<S> Source for TappedSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.frame_sum = 0.0;
        self.frame_pos = 0;
        self.inner.try_seek(pos)
    }
}
