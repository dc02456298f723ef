//! convo - Streaming conversation core with voice in and speech out
//!
//! Transcript management, streaming chat exchanges, microphone capture
//! sessions and avatar speech playback behind transport traits, with an
//! orchestrator tying them into one submission surface.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod chat;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod notice;
pub mod orchestrator;
pub mod prompt;
pub mod speech;
pub mod transcript;
pub mod voice;

pub use chat::{ChatSession, ChatTransport, ExchangeOutcome, SendOptions, Terminal, UserContent};
pub use config::Config;
pub use error::{ConvoError, Result};
pub use notice::{Notice, NoticeSender};
pub use orchestrator::Orchestrator;
pub use speech::{AvatarEngine, SpeechBridge};
pub use transcript::{Role, TranscriptStore, Turn, UpdateMode};
pub use voice::{VoiceCaptureSession, VoiceTransport};
