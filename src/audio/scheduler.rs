//! Deadline-based frame and timeout scheduling for the player thread.
//!
//! Nothing here runs callbacks itself. The owning loop asks for the next
//! deadline, sleeps until then, and collects whatever wakeups are due.

use std::time::{Duration, Instant};

use crate::audio::host::{FrameHandle, FrameScheduler, HoldTimer, TimerHandle};

/// Default display refresh interval (~60 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Something that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Frame(FrameHandle),
    Hold(TimerHandle),
}

#[derive(Debug)]
struct Pending {
    wakeup: Wakeup,
    due: Instant,
}

#[derive(Debug)]
pub struct DeadlineScheduler {
    frame_interval: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

impl DeadlineScheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Remove and return every wakeup due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<Wakeup> {
        let mut due: Vec<Pending> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| p.due);
        due.into_iter().map(|p| p.wakeup).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn schedule(&mut self, delay: Duration, wakeup: Wakeup) {
        self.pending.push(Pending {
            wakeup,
            due: Instant::now() + delay,
        });
    }

    fn cancel(&mut self, wakeup: Wakeup) {
        self.pending.retain(|p| p.wakeup != wakeup);
    }
}

impl Default for DeadlineScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameScheduler for DeadlineScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.allocate_id());
        self.schedule(self.frame_interval, Wakeup::Frame(handle));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancel(Wakeup::Frame(handle));
    }
}

impl HoldTimer for DeadlineScheduler {
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.allocate_id());
        self.schedule(delay, Wakeup::Hold(handle));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.cancel(Wakeup::Hold(handle));
    }
}
