//! Transient user-visible notices emitted by the session components.
//!
//! Components carry an optional non-blocking sender; the embedding UI polls
//! the receiving end and renders toasts/messages. Dropped notices (full or
//! disconnected channel) are not an error.

use serde::{Deserialize, Serialize};

/// One transient notice for the embedding UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// Voice capture entered the listening state.
    ListeningStarted,
    /// Voice capture stopped cleanly with the drained final text.
    ListeningStopped { final_text: String },
    /// The auto-stop deadline elapsed and forced a stop.
    AutoStopped,
    /// The realtime voice transport failed to open.
    VoiceSocketFailed { message: String },
    /// The microphone could not be acquired.
    MicrophoneDenied { message: String },
    /// The avatar began speaking an utterance.
    SpeechStarted,
    /// The avatar finished (or was interrupted mid-) utterance.
    SpeechEnded,
    /// The avatar engine reported a failure for the current utterance.
    SpeechFailed { message: String },
}

/// Non-blocking notice sender shared by the session components.
///
/// `send` never blocks and never fails: a full or disconnected channel
/// silently drops the notice, matching the fire-and-forget event sender the
/// components are built around.
#[derive(Debug, Clone, Default)]
pub struct NoticeSender {
    tx: Option<crossbeam_channel::Sender<Notice>>,
}

impl NoticeSender {
    /// A sender that discards every notice.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn new(tx: crossbeam_channel::Sender<Notice>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn send(&self, notice: Notice) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(notice);
        }
    }
}
