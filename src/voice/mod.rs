//! Voice input: one microphone-to-text recognition session at a time.

pub mod capture;
pub mod transport;

pub use capture::{CaptureState, VoiceCaptureSession};
pub use transport::{MockVoiceTransport, VoiceTransport};
