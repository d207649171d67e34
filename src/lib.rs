pub mod audio;
pub mod config;
pub mod panel;

use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use audio::commands::UserAction;
use audio::engine::{EngineSettings, PlayerEngineHandle};
use audio::error::PlayerError;
use audio::events::PlayerNotification;

/// How notifications are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Redraw a single panel line in place
    #[default]
    Panel,
    /// One JSON object per notification
    Json,
}

fn is_quit(line: &str) -> bool {
    matches!(line, "quit" | "q" | "exit")
}

/// Render notifications until the player thread goes away.
fn spawn_printer(
    notifications: Receiver<PlayerNotification>,
    mode: OutputMode,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("lumina-panel".into())
        .spawn(move || {
            let stdout = io::stdout();
            for notification in notifications.iter() {
                let mut out = stdout.lock();
                let written = match (mode, &notification) {
                    (OutputMode::Json, n) => match n.to_json() {
                        Ok(json) => writeln!(out, "{}", json),
                        Err(e) => {
                            log::warn!("Failed to serialize notification: {}", e);
                            continue;
                        }
                    },
                    (OutputMode::Panel, PlayerNotification::StateChanged(state)) => {
                        write!(out, "\r{}\x1b[K", panel::render(state))
                    }
                    (OutputMode::Panel, PlayerNotification::TrackChanged { .. }) => continue,
                };
                if written.and_then(|_| out.flush()).is_err() {
                    break;
                }
            }
        })
}

/// Run the player with commands read from stdin, one per line.
pub fn run(settings: EngineSettings, mode: OutputMode) -> Result<(), PlayerError> {
    let engine = PlayerEngineHandle::spawn(settings)?;
    let printer = spawn_printer(engine.notifications(), mode).map_err(|e| {
        log::error!("Failed to spawn panel thread: {}", e);
        PlayerError::EngineUnavailable
    })?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read command: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_quit(line) {
            break;
        }
        match line.parse::<UserAction>() {
            Ok(action) => engine.send(action)?,
            Err(e) => eprintln!("{}", e),
        }
    }

    // Joins the player thread, which closes the notification channel.
    drop(engine);
    if printer.join().is_err() {
        log::error!("Panel thread panicked");
    }
    println!();
    Ok(())
}
