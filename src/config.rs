use crate::defaults;
use crate::error::{ConvoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub chat: ChatConfig,
    pub voice: VoiceConfig,
    pub speech: SpeechConfig,
}

/// Streaming chat configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Model name sent with each request unless overridden per call.
    pub model: String,
    /// Chat mode / scene identifier sent with each request.
    pub chat_mode: String,
    /// Whether streamed chunks append to the assistant turn (true) or
    /// replace its text (false).
    pub incremental: bool,
}

/// Voice capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Auto-stop deadline in milliseconds; 0 disables the timer.
    pub auto_stop_ms: u64,
}

/// Avatar speech configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub voice_name: String,
    pub speed: u32,
    pub volume: u32,
    /// Animation used to interrupt an in-flight utterance.
    pub neutral_pose: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            chat_mode: defaults::DEFAULT_CHAT_MODE.to_string(),
            incremental: false,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            auto_stop_ms: defaults::AUTO_STOP_MS,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice_name: defaults::TTS_VOICE_NAME.to_string(),
            speed: defaults::TTS_SPEED,
            volume: defaults::TTS_VOLUME,
            neutral_pose: defaults::NEUTRAL_POSE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML or out-of-range
    /// values. Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvoError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConvoError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConvoError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Check value ranges. Speed and volume are percentages.
    fn validate(&self) -> Result<()> {
        if self.speech.speed > 100 {
            return Err(ConvoError::ConfigInvalidValue {
                key: "speech.speed".to_string(),
                message: format!("{} is out of range 0-100", self.speech.speed),
            });
        }
        if self.speech.volume > 100 {
            return Err(ConvoError::ConfigInvalidValue {
                key: "speech.volume".to_string(),
                message: format!("{} is out of range 0-100", self.speech.volume),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CONVO_MODEL → chat.model
    /// - CONVO_CHAT_MODE → chat.chat_mode
    /// - CONVO_AUTO_STOP_MS → voice.auto_stop_ms
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("CONVO_MODEL")
            && !model.is_empty()
        {
            self.chat.model = model;
        }

        if let Ok(mode) = std::env::var("CONVO_CHAT_MODE")
            && !mode.is_empty()
        {
            self.chat.chat_mode = mode;
        }

        if let Ok(ms) = std::env::var("CONVO_AUTO_STOP_MS")
            && let Ok(parsed) = ms.parse::<u64>()
        {
            self.voice.auto_stop_ms = parsed;
        }

        self
    }
}
