//! Player engine: a dedicated thread that owns the controller.
//!
//! Architecture:
//! - `PlayerEngineHandle`: Send + Sync handle that sends commands to the player thread
//! - `PlayerThread`: owns the media element, analyzer, scheduler and controller
//! - Uses crossbeam channels for commands and notifications
//! - SharedState (Arc<RwLock<PlayerState>>) for reading state from any thread

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::audio::analyzer::FftAnalyzer;
use crate::audio::commands::UserAction;
use crate::audio::controller::{PlayerController, PlayerInput, PlayerOptions};
use crate::audio::error::PlayerError;
use crate::audio::events::{Notifier, PlayerNotification};
use crate::audio::host::MediaElement;
use crate::audio::media::RodioMediaElement;
use crate::audio::playlist::Playlist;
use crate::audio::scheduler::{DeadlineScheduler, Wakeup, DEFAULT_FRAME_INTERVAL};
use crate::audio::state::{create_shared_state, PlayerState, SharedState};

/// Longest the thread sleeps before polling the media element
const TICK_INTERVAL: Duration = Duration::from_millis(250);

const COMMAND_CAPACITY: usize = 32;
const NOTIFICATION_CAPACITY: usize = 256;

/// Commands sent to the player thread
#[derive(Debug)]
pub enum EngineCommand {
    Action(UserAction),
    Shutdown,
}

/// Everything needed to start the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub playlist: Playlist,
    pub options: PlayerOptions,
    pub frame_interval: Duration,
}

impl EngineSettings {
    pub fn new(playlist: Playlist) -> Self {
        Self {
            playlist,
            options: PlayerOptions::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Handle for driving the player from other threads.
///
/// Dropping the handle shuts the player thread down and waits for it.
pub struct PlayerEngineHandle {
    cmd_tx: Sender<EngineCommand>,
    state: SharedState,
    notifications: Receiver<PlayerNotification>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerEngineHandle {
    /// Spawn the player on the default audio output.
    pub fn spawn(settings: EngineSettings) -> Result<Self, PlayerError> {
        Self::spawn_with(settings, RodioMediaElement::open)
    }

    /// Spawn the player with a custom media element.
    ///
    /// `make_media` runs on the player thread, so the element itself need not be Send.
    pub fn spawn_with<M, F>(settings: EngineSettings, make_media: F) -> Result<Self, PlayerError>
    where
        M: MediaElement + 'static,
        F: FnOnce() -> Result<M, PlayerError> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = bounded::<EngineCommand>(COMMAND_CAPACITY);
        let (note_tx, note_rx) = bounded::<PlayerNotification>(NOTIFICATION_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<Result<(), PlayerError>>(1);

        let first = settings.playlist.tracks()[0].clone();
        let state = create_shared_state(PlayerState::new(0, first));

        let state_clone = state.clone();
        let thread = thread::Builder::new()
            .name("lumina-player".into())
            .spawn(move || {
                let media = match make_media() {
                    Ok(media) => media,
                    Err(e) => {
                        log::error!("Failed to open media element: {}", e);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let notifier = Notifier::new(note_tx);
                let player = PlayerThread::new(settings, media, state_clone, notifier);
                let _ = ready_tx.send(Ok(()));
                player.run(cmd_rx);
            })
            .map_err(|e| {
                log::error!("Failed to spawn player thread: {}", e);
                PlayerError::EngineUnavailable
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(PlayerError::EngineUnavailable);
            }
        }

        log::info!("Player engine initialized");
        Ok(Self {
            cmd_tx,
            state,
            notifications: note_rx,
            thread: Some(thread),
        })
    }

    pub fn send(&self, action: UserAction) -> Result<(), PlayerError> {
        self.cmd_tx
            .send(EngineCommand::Action(action))
            .map_err(|_| PlayerError::EngineUnavailable)
    }

    pub fn toggle_play(&self) -> Result<(), PlayerError> {
        self.send(UserAction::TogglePlay)
    }

    pub fn skip_forward(&self) -> Result<(), PlayerError> {
        self.send(UserAction::SkipForward)
    }

    pub fn skip_backward(&self) -> Result<(), PlayerError> {
        self.send(UserAction::SkipBackward)
    }

    pub fn get_state(&self) -> PlayerState {
        self.state.read().clone()
    }

    /// Receiver for state and track-change notifications.
    pub fn notifications(&self) -> Receiver<PlayerNotification> {
        self.notifications.clone()
    }
}

impl Drop for PlayerEngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Player thread panicked");
            }
        }
    }
}

/// The player thread.
///
/// Owns the media element (which may hold a non-Send output stream) and
/// feeds every input into the controller one at a time.
struct PlayerThread<M: MediaElement> {
    controller: PlayerController<M, FftAnalyzer, DeadlineScheduler>,
    state: SharedState,
    notifier: Notifier,
    /// Last snapshot published
    published: PlayerState,
}

impl<M: MediaElement> PlayerThread<M> {
    fn new(settings: EngineSettings, media: M, state: SharedState, notifier: Notifier) -> Self {
        let controller = PlayerController::new(
            settings.playlist,
            settings.options,
            media,
            FftAnalyzer::new(),
            DeadlineScheduler::new(settings.frame_interval),
        );
        let published = controller.state();
        *state.write() = published.clone();
        notifier.emit_state_update(&published);

        Self {
            controller,
            state,
            notifier,
            published,
        }
    }

    /// Main loop: sleep until the next deadline or command.
    fn run(mut self, cmd_rx: Receiver<EngineCommand>) {
        log::info!("Player thread started");

        // Pick up whatever the initial load raised.
        self.pump();

        loop {
            match cmd_rx.recv_timeout(self.next_timeout()) {
                Ok(EngineCommand::Action(action)) => {
                    self.controller.handle(PlayerInput::User(action));
                }
                Ok(EngineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.pump();
        }

        log::info!("Player thread shutting down");
    }

    fn next_timeout(&self) -> Duration {
        match self.controller.scheduler().next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(TICK_INTERVAL),
            None => TICK_INTERVAL,
        }
    }

    /// Deliver due wakeups and media notifications, then publish.
    fn pump(&mut self) {
        let due = self.controller.scheduler_mut().take_due(Instant::now());
        for wakeup in due {
            let input = match wakeup {
                Wakeup::Frame(handle) => PlayerInput::Frame(handle),
                Wakeup::Hold(handle) => PlayerInput::HoldElapsed(handle),
            };
            self.controller.handle(input);
        }

        for event in self.controller.media_mut().poll_events() {
            self.controller.handle(PlayerInput::Media(event));
        }

        self.publish();
    }

    fn publish(&mut self) {
        let snapshot = self.controller.state();
        if snapshot == self.published {
            return;
        }

        *self.state.write() = snapshot.clone();
        if snapshot.current_index != self.published.current_index {
            self.notifier
                .emit_track_changed(snapshot.current_index, &snapshot.current_track);
        }
        self.notifier.emit_state_update(&snapshot);
        self.published = snapshot;
    }
}
