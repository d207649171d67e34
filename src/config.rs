//! Playlist file loading.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::controller::PlayerOptions;
use crate::audio::engine::EngineSettings;
use crate::audio::playlist::Playlist;
use crate::audio::state::Track;

const APP_DIR: &str = "lumina";
const PLAYLIST_FILE: &str = "playlist.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid playlist file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    #[error("start_index {index} is out of range for {len} tracks")]
    StartIndexOutOfRange { index: usize, len: usize },

    #[error("volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),

    #[error("frame_interval_ms must be at least 1")]
    InvalidFrameInterval,

    #[error("No configuration directory on this platform")]
    NoConfigDir,
}

fn default_volume() -> f32 {
    1.0
}

fn default_loading_hold_ms() -> u64 {
    500
}

fn default_frame_interval_ms() -> u64 {
    16
}

/// Contents of `playlist.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub playlist: Vec<Track>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_loading_hold_ms")]
    pub loading_hold_ms: u64,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: bool,
}

impl PlayerConfig {
    /// `<config dir>/lumina/playlist.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(PLAYLIST_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Reading playlist from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playlist.is_empty() {
            return Err(ConfigError::EmptyPlaylist);
        }
        if self.start_index >= self.playlist.len() {
            return Err(ConfigError::StartIndexOutOfRange {
                index: self.start_index,
                len: self.playlist.len(),
            });
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidFrameInterval);
        }
        Ok(())
    }

    pub fn into_settings(self) -> Result<EngineSettings, ConfigError> {
        self.validate()?;
        let options = PlayerOptions {
            start_index: self.start_index,
            volume: self.volume,
            loading_hold: Duration::from_millis(self.loading_hold_ms),
            shuffle: self.shuffle,
            repeat: self.repeat,
        };
        let playlist = Playlist::new(self.playlist).map_err(|_| ConfigError::EmptyPlaylist)?;
        Ok(EngineSettings {
            playlist,
            options,
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        })
    }
}
