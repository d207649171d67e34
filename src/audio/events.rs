use crossbeam_channel::{Sender, TrySendError};
use serde::Serialize;

use crate::audio::state::{PlayerState, Track};

/// Notifications published by the player thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PlayerNotification {
    StateChanged(PlayerState),
    TrackChanged { index: usize, track: Track },
}

impl PlayerNotification {
    /// One-line JSON rendering for machine consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Publishing side of the notification channel. Never blocks the player thread.
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<PlayerNotification>,
}

impl Notifier {
    pub fn new(tx: Sender<PlayerNotification>) -> Self {
        Self { tx }
    }

    pub fn emit_state_update(&self, state: &PlayerState) {
        self.emit(PlayerNotification::StateChanged(state.clone()));
    }

    pub fn emit_track_changed(&self, index: usize, track: &Track) {
        self.emit(PlayerNotification::TrackChanged {
            index,
            track: track.clone(),
        });
    }

    fn emit(&self, notification: PlayerNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("Notification dropped, listener behind"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
