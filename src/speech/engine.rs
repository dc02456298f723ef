//! Abstract avatar speech engine.
//!
//! One utterance at a time; completion is reported through a handle that
//! resolves exactly once.

use crate::config::SpeechConfig;
use crate::error::{ConvoError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Synthesis parameters passed with every utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOptions {
    pub voice_name: String,
    pub speed: u32,
    pub volume: u32,
}

impl From<&SpeechConfig> for TtsOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            voice_name: config.voice_name.clone(),
            speed: config.speed,
            volume: config.volume,
        }
    }
}

/// One piece of text to speak, with its synthesis parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub tts: TtsOptions,
}

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Finished,
    Error(String),
}

/// Resolves exactly once when the engine finishes or fails an utterance.
#[derive(Debug)]
pub struct SpeechHandle {
    rx: oneshot::Receiver<SpeechOutcome>,
}

impl SpeechHandle {
    /// Pair a handle with the sender the engine resolves it through.
    pub fn channel() -> (oneshot::Sender<SpeechOutcome>, SpeechHandle) {
        let (tx, rx) = oneshot::channel();
        (tx, SpeechHandle { rx })
    }

    /// Wait for the utterance to end. An engine that drops its sender
    /// without resolving counts as an error.
    pub async fn wait(self) -> SpeechOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => SpeechOutcome::Error("speech engine went away".to_string()),
        }
    }
}

/// Trait for the avatar playback engine.
#[async_trait]
pub trait AvatarEngine: Send + Sync {
    /// Begin speaking. Returns a handle resolving when playback ends.
    async fn speak(&self, utterance: Utterance) -> Result<SpeechHandle>;

    /// Drive the avatar to a named pose, interrupting any motion.
    async fn set_pose(&self, pose: &str) -> Result<()>;
}

/// Mock avatar engine for testing.
///
/// Records utterances and poses, and resolves each handle with a scripted
/// outcome.
#[derive(Clone, Default)]
pub struct MockAvatarEngine {
    utterances: Arc<Mutex<Vec<Utterance>>>,
    poses: Arc<Mutex<Vec<String>>>,
    fail_speak: Arc<Mutex<Option<String>>>,
    resolve_with_error: Arc<Mutex<Option<String>>>,
}

impl MockAvatarEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `speak` itself to fail before playback starts.
    pub fn with_speak_failure(self, message: &str) -> Self {
        *lock(&self.fail_speak) = Some(message.to_string());
        self
    }

    /// Configure every handle to resolve with a playback error.
    pub fn with_playback_error(self, message: &str) -> Self {
        *lock(&self.resolve_with_error) = Some(message.to_string());
        self
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        lock(&self.utterances).clone()
    }

    pub fn poses(&self) -> Vec<String> {
        lock(&self.poses).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl AvatarEngine for MockAvatarEngine {
    async fn speak(&self, utterance: Utterance) -> Result<SpeechHandle> {
        if let Some(message) = lock(&self.fail_speak).clone() {
            return Err(ConvoError::SpeechEngine { message });
        }
        lock(&self.utterances).push(utterance);
        let (tx, handle) = SpeechHandle::channel();
        let outcome = match lock(&self.resolve_with_error).clone() {
            Some(message) => SpeechOutcome::Error(message),
            None => SpeechOutcome::Finished,
        };
        let _ = tx.send(outcome);
        Ok(handle)
    }

    async fn set_pose(&self, pose: &str) -> Result<()> {
        lock(&self.poses).push(pose.to_string());
        Ok(())
    }
}

/// Avatar engine that prints utterances to stdout. Used by the CLI, where
/// there is no real synthesis backend.
#[derive(Debug, Clone, Default)]
pub struct ConsoleAvatar;

#[async_trait]
impl AvatarEngine for ConsoleAvatar {
    async fn speak(&self, utterance: Utterance) -> Result<SpeechHandle> {
        println!("[speak:{}] {}", utterance.tts.voice_name, utterance.text);
        let (tx, handle) = SpeechHandle::channel();
        let _ = tx.send(SpeechOutcome::Finished);
        Ok(handle)
    }

    async fn set_pose(&self, _pose: &str) -> Result<()> {
        Ok(())
    }
}
