//! TOML configuration file loading
//!
//! Supports `~/.config/voice-assist/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::voice::VoiceGender;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Command interpretation
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Persistence backend the assistant reports to
    #[serde(default)]
    pub backend: BackendFileConfig,

    /// Persistence API server
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Data directory override
    pub data_dir: Option<String>,
}

/// Command interpretation settings
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Search URL the encoded song query is appended to
    pub search_url: Option<String>,

    /// Slice song names at the first release's 10-character offset
    pub legacy_song_offset: Option<bool>,

    /// Pause before re-arming capture after an error, in milliseconds
    pub rearm_delay_ms: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone input and synthesized speech
    pub enabled: Option<bool>,

    /// Recognition language (e.g. "en")
    pub language: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Voice names to prefer, in order (substring match)
    pub preferred_voices: Option<Vec<String>>,

    /// Voice gender to prefer when no named voice is available
    pub preferred_gender: Option<VoiceGender>,
}

/// Persistence backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// Report names and commands to the backend
    pub enabled: Option<bool>,

    /// Backend base URL
    pub url: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `VOICE_ASSIST_CONFIG` or
/// `~/.config/voice-assist/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VOICE_ASSIST_CONFIG") {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-assist").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let fc: ConfigFile = toml::from_str(
            r#"
            [assistant]
            legacy_song_offset = true

            [voice]
            preferred_voices = ["nova", "shimmer"]
            preferred_gender = "female"

            [backend]
            url = "http://backend:5000"
            "#,
        )
        .unwrap();

        assert_eq!(fc.assistant.legacy_song_offset, Some(true));
        assert!(fc.assistant.search_url.is_none());
        assert_eq!(
            fc.voice.preferred_voices.as_deref(),
            Some(&["nova".to_string(), "shimmer".to_string()][..])
        );
        assert_eq!(fc.voice.preferred_gender, Some(VoiceGender::Female));
        assert_eq!(fc.backend.url.as_deref(), Some("http://backend:5000"));
        assert!(fc.server.port.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let fc = load_config_file_from(Path::new("/nonexistent/voice-assist.toml"));
        assert!(fc.backend.url.is_none());
    }

    #[test]
    fn test_invalid_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[voice\nenabled = ").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.voice.enabled.is_none());
    }
}
