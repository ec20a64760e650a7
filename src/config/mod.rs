//! Configuration management for the voice assistant
//!
//! Values resolve in the order env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::backend::DEFAULT_BACKEND_URL;
use crate::interpreter::{CommandOptions, DEFAULT_SEARCH_URL};
use crate::voice::{VoiceGender, VoicePreferences};
use crate::Result;

/// Default persistence API port
pub const DEFAULT_PORT: u16 = 5000;

/// Voice assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (local cache, server database)
    pub data_dir: PathBuf,

    /// Command interpretation
    pub assistant: AssistantConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Persistence backend the assistant reports to
    pub backend: BackendConfig,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Command interpretation configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Search URL the encoded song query is appended to
    pub search_url: String,

    /// Slice song names at the first release's 10-character offset
    pub legacy_song_offset: bool,

    /// Pause before re-arming capture after a capture error
    pub rearm_delay: Duration,
}

impl AssistantConfig {
    /// Options for the command interpreter
    #[must_use]
    pub fn command_options(&self) -> CommandOptions {
        CommandOptions {
            search_url: self.search_url.clone(),
            legacy_song_offset: self.legacy_song_offset,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone input and synthesized speech
    pub enabled: bool,

    /// Recognition language hint for STT (ISO-639-1)
    pub language: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Synthesis voice selection policy
    pub preferences: VoicePreferences,
}

/// Persistence backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Report names and commands to the backend
    pub enabled: bool,

    /// Backend base URL
    pub url: String,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<SecretString>,
}

impl Clone for ApiKeys {
    fn clone(&self) -> Self {
        Self {
            openai: self
                .openai
                .as_ref()
                .map(|k| SecretString::new(k.expose_secret().into())),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::resolve(fc, |key| std::env::var(key).ok(), disable_voice);

        std::fs::create_dir_all(&config.data_dir)?;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        Ok(config)
    }

    /// Merge a parsed config file with environment lookups and defaults
    pub fn resolve(
        fc: file::ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        disable_voice: bool,
    ) -> Self {
        // Data directory (~/.local/share/voice-assist on Linux)
        let data_dir = env("VOICE_ASSIST_DATA_DIR")
            .or(fc.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        let assistant = AssistantConfig {
            search_url: fc
                .assistant
                .search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            legacy_song_offset: fc.assistant.legacy_song_offset.unwrap_or(false),
            rearm_delay: Duration::from_millis(fc.assistant.rearm_delay_ms.unwrap_or(250)),
        };

        let voice = VoiceConfig {
            enabled: !disable_voice && fc.voice.enabled.unwrap_or(true),
            language: fc.voice.language.unwrap_or_else(|| "en".to_string()),
            stt_model: env("VOICE_ASSIST_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("VOICE_ASSIST_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
            preferences: VoicePreferences {
                names: fc.voice.preferred_voices.unwrap_or_default(),
                gender: fc.voice.preferred_gender.or(Some(VoiceGender::Female)),
            },
        };

        let backend = BackendConfig {
            enabled: !env("VOICE_ASSIST_BACKEND_DISABLED")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                && fc.backend.enabled.unwrap_or(true),
            url: env("VOICE_ASSIST_BACKEND_URL")
                .or(fc.backend.url)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        };

        let api_server = ApiServerConfig {
            port: env("VOICE_ASSIST_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .filter(|k| !k.is_empty())
                .map(|k| SecretString::new(k.into())),
        };

        Self {
            data_dir,
            assistant,
            voice,
            backend,
            api_server,
            api_keys,
        }
    }

    /// Path of the assistant's local cache database
    #[must_use]
    pub fn cache_db_path(&self) -> PathBuf {
        self.data_dir.join("assistant.db")
    }

    /// Path of the persistence API database
    #[must_use]
    pub fn server_db_path(&self) -> PathBuf {
        self.data_dir.join("server.db")
    }
}

/// Default data directory: `~/.local/share/voice-assist`
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/voice-assist"),
        |d| d.data_dir().join("voice-assist"),
    )
}
