pub mod analyzer;
pub mod commands;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod media;
pub mod playlist;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod tap;
pub mod time;
pub mod visualizer;

pub use commands::{CommandParseError, UserAction};
pub use controller::{PlayerController, PlayerInput, PlayerOptions};
pub use engine::{EngineSettings, PlayerEngineHandle};
pub use error::PlayerError;
pub use events::PlayerNotification;
pub use playlist::Playlist;
pub use state::{PlaybackStatus, PlayerState, Track};
