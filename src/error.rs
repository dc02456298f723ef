//! Error types for convo.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvoError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Streaming chat errors
    #[error("Chat transport failed: {message}")]
    ChatTransport { message: String },

    #[error("An exchange is already in flight for this conversation")]
    ExchangeInFlight,

    // Voice capture errors
    #[error("Voice transport failed to open: {message}")]
    VoiceSocket { message: String },

    #[error("Microphone unavailable: {message}")]
    MicrophoneDenied { message: String },

    #[error("Final transcript flush failed: {message}")]
    VoiceFlush { message: String },

    // Speech output errors
    #[error("An utterance is already being spoken")]
    SpeechBusy,

    #[error("Avatar engine failed: {message}")]
    SpeechEngine { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ConvoError>;
