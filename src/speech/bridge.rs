//! Speech output bridge: sanitizes replies and plays them through the
//! avatar engine, one utterance at a time.

use crate::config::SpeechConfig;
use crate::error::{ConvoError, Result};
use crate::notice::{Notice, NoticeSender};
use crate::speech::engine::{AvatarEngine, SpeechOutcome, TtsOptions, Utterance};
use crate::speech::sanitize::sanitize_for_speech;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the bridge is currently playing an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Speaking,
}

/// Owns the avatar engine and serializes speech through it.
///
/// A second `speak` while one is playing is rejected, not queued.
pub struct SpeechBridge {
    engine: Arc<dyn AvatarEngine>,
    config: SpeechConfig,
    speaking: Arc<AtomicBool>,
    notices: NoticeSender,
}

/// Clears the speaking flag on every exit from `speak`.
struct SpeakingGuard(Arc<AtomicBool>);

impl Drop for SpeakingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SpeechBridge {
    pub fn new(engine: Arc<dyn AvatarEngine>, config: SpeechConfig) -> Self {
        Self {
            engine,
            config,
            speaking: Arc::new(AtomicBool::new(false)),
            notices: NoticeSender::disabled(),
        }
    }

    pub fn with_notice_sender(mut self, notices: NoticeSender) -> Self {
        self.notices = notices;
        self
    }

    pub fn state(&self) -> BridgeState {
        if self.speaking.load(Ordering::SeqCst) {
            BridgeState::Speaking
        } else {
            BridgeState::Idle
        }
    }

    /// Sanitize `raw` and speak it to completion.
    ///
    /// Markup-only input is a silent no-op. A call while already speaking
    /// fails with [`ConvoError::SpeechBusy`] without touching the engine.
    pub async fn speak(&self, raw: &str) -> Result<()> {
        let text = sanitize_for_speech(raw);
        if text.is_empty() {
            return Ok(());
        }
        if self
            .speaking
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConvoError::SpeechBusy);
        }
        let _guard = SpeakingGuard(Arc::clone(&self.speaking));

        let utterance = Utterance {
            text,
            tts: TtsOptions::from(&self.config),
        };
        let handle = match self.engine.speak(utterance).await {
            Ok(handle) => handle,
            Err(e) => {
                self.notices.send(Notice::SpeechFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };
        self.notices.send(Notice::SpeechStarted);

        match handle.wait().await {
            SpeechOutcome::Finished => {
                self.notices.send(Notice::SpeechEnded);
                Ok(())
            }
            SpeechOutcome::Error(message) => {
                self.notices.send(Notice::SpeechFailed {
                    message: message.clone(),
                });
                Err(ConvoError::SpeechEngine { message })
            }
        }
    }

    /// Interrupt playback by driving the avatar back to its neutral pose.
    ///
    /// No-op while idle. Safe to call repeatedly.
    pub async fn stop(&self) -> Result<()> {
        if !self.speaking.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.set_pose(&self.config.neutral_pose).await
    }
}
