//! Audio source abstraction for different playback sources.

use std::io::Cursor;
use std::path::PathBuf;

use bytes::Bytes;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::error::PlayerError;

/// Represents the source of an audio track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// HTTP/HTTPS stream
    HttpStream { url: String },
    /// Local file on disk
    LocalFile { path: PathBuf },
}

impl TrackSource {
    /// Parse a locator string into the appropriate source type.
    ///
    /// HTTP/HTTPS URLs become `HttpStream`, everything else is treated as a local path.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            TrackSource::HttpStream {
                url: url.to_string(),
            }
        } else {
            TrackSource::LocalFile { path: url.into() }
        }
    }

    pub fn locator(&self) -> String {
        match self {
            TrackSource::HttpStream { url } => url.clone(),
            TrackSource::LocalFile { path } => path.display().to_string(),
        }
    }

    /// File extension, used as a format hint when probing.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            TrackSource::HttpStream { url } => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or(path).to_string()
            }
            TrackSource::LocalFile { path } => path.file_name()?.to_string_lossy().into_owned(),
        };
        let (_, ext) = name.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Read the whole payload into memory.
    pub fn fetch(&self) -> Result<Bytes, PlayerError> {
        match self {
            TrackSource::LocalFile { path } => {
                log::debug!("Loading local file: {}", path.display());
                let data = std::fs::read(path).map_err(|e| PlayerError::SourceUnavailable {
                    locator: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Bytes::from(data))
            }
            TrackSource::HttpStream { url } => {
                log::debug!("Loading HTTP stream: {}", url);
                let response = reqwest::blocking::get(url.as_str())
                    .map_err(|e| PlayerError::Network(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(PlayerError::Network(format!(
                        "Server error: {}",
                        response.status()
                    )));
                }

                let bytes = response
                    .bytes()
                    .map_err(|e| PlayerError::Network(format!("Failed to download: {}", e)))?;
                log::debug!("Downloaded {} bytes", bytes.len());
                Ok(bytes)
            }
        }
    }
}

/// Ask the container for the duration of its default track, in seconds.
pub fn container_duration(payload: &Bytes, extension: Option<&str>) -> Option<f64> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let stream = MediaSourceStream::new(Box::new(Cursor::new(payload.clone())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| log::debug!("Duration lookup failed: {}", e))
        .ok()?;

    let track = probed.format.default_track()?;
    let params = &track.codec_params;
    let frames = params.n_frames?;

    if let Some(rate) = params.sample_rate.filter(|r| *r > 0) {
        return Some(frames as f64 / rate as f64);
    }
    params.time_base.map(|base| {
        let time = base.calc_time(frames);
        time.seconds as f64 + time.frac
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Mono 16-bit PCM WAV of silence.
    pub(crate) fn wav_bytes(sample_rate: u32, frames: u32) -> Bytes {
        let data_len = frames * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, 0);
        Bytes::from(out)
    }

    #[test]
    fn classifies_locators() {
        assert_eq!(
            TrackSource::from_url("https://example.com/a.mp3"),
            TrackSource::HttpStream {
                url: "https://example.com/a.mp3".into()
            }
        );
        assert_eq!(
            TrackSource::from_url("/music/a.flac"),
            TrackSource::LocalFile {
                path: "/music/a.flac".into()
            }
        );
    }

    #[test]
    fn extension_ignores_query_strings() {
        let remote = TrackSource::from_url("https://cdn.example.com/x/Song.MP3?token=1");
        assert_eq!(remote.extension().as_deref(), Some("mp3"));
        let local = TrackSource::from_url("/music/track.ogg");
        assert_eq!(local.extension().as_deref(), Some("ogg"));
        assert_eq!(TrackSource::from_url("/music/noext").extension(), None);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let source = TrackSource::from_url("/definitely/not/here.mp3");
        assert!(matches!(
            source.fetch(),
            Err(PlayerError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn reads_wav_duration() {
        let wav = wav_bytes(8_000, 12_000);
        let duration = container_duration(&wav, Some("wav")).unwrap();
        assert!((duration - 1.5).abs() < 1e-6);
    }

    #[test]
    fn garbage_has_no_duration() {
        let junk = Bytes::from_static(b"not audio at all");
        assert_eq!(container_duration(&junk, None), None);
    }
}
