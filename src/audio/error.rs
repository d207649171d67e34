/// Errors raised by the player and its native backend.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    /// A playlist needs at least one track
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// The track source could not be read
    #[error("Cannot open source {locator}: {reason}")]
    SourceUnavailable {
        /// Locator that failed to open
        locator: String,
        /// Underlying failure
        reason: String,
    },

    /// Fetching a remote source failed
    #[error("Network error: {0}")]
    Network(String),

    /// The payload is not a supported audio format
    #[error("Unsupported audio format: {0}")]
    Decode(String),

    /// The audio output device could not be opened
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// Playback was requested before any source was loaded
    #[error("No source loaded")]
    NotLoaded,

    /// The frequency analyzer could not attach to the media output
    #[error("Frequency analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    /// The player thread is gone
    #[error("Player engine not responding")]
    EngineUnavailable,
}
