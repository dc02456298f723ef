//! Default configuration constants for convo.
//!
//! Shared constants used across configuration types to keep the session
//! components consistent.

/// Default auto-stop deadline for a voice capture session, in milliseconds.
///
/// A recognition session that has been listening this long without an
/// explicit stop is drained and closed as if the user had stopped it.
pub const AUTO_STOP_MS: u64 = 30_000;

/// Default model name used when neither the caller nor the app info
/// supplies one.
pub const DEFAULT_MODEL: &str = "proxyllm";

/// Default chat mode sent with every streaming request.
pub const DEFAULT_CHAT_MODE: &str = "chat_normal";

/// Default TTS voice for avatar speech.
pub const TTS_VOICE_NAME: &str = "zh-CN-YunyangNeural";

/// Default TTS speaking speed (engine scale, 0-100).
pub const TTS_SPEED: u32 = 50;

/// Default TTS volume (engine scale, 0-100).
pub const TTS_VOLUME: u32 = 50;

/// Animation the avatar returns to when speech is interrupted.
pub const NEUTRAL_POSE: &str = "anim/Anim_daiji_M01";

/// Capacity of the bounded channel carrying stream events for one exchange.
///
/// Partials arrive at network pace and are applied immediately, so a small
/// buffer is enough; a full channel applies backpressure to the transport.
pub const STREAM_EVENT_BUFFER: usize = 32;
