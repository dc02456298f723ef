//! Speech output: markdown sanitization, engine abstraction, playback bridge.

pub mod bridge;
pub mod engine;
pub mod sanitize;

pub use bridge::{BridgeState, SpeechBridge};
pub use engine::{
    AvatarEngine, ConsoleAvatar, MockAvatarEngine, SpeechHandle, SpeechOutcome, TtsOptions,
    Utterance,
};
pub use sanitize::sanitize_for_speech;
