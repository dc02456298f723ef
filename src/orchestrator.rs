//! Conversation orchestrator: wires the transcript store, chat transport,
//! prompt codes and speech bridge behind a single submission surface.
//!
//! One exchange at a time. A submission while one is in flight is rejected
//! immediately so the transcript never interleaves two answers.

use crate::chat::{ChatSession, ChatTransport, ExchangeHandle, ExchangeOutcome, SendOptions,
    Terminal, UserContent};
use crate::config::Config;
use crate::error::{ConvoError, Result};
use crate::notice::NoticeSender;
use crate::prompt::PromptCodeStore;
use crate::speech::SpeechBridge;
use crate::transcript::{TranscriptStore, Turn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct Orchestrator {
    transport: Arc<dyn ChatTransport>,
    store: Arc<Mutex<TranscriptStore>>,
    bridge: SpeechBridge,
    prompts: PromptCodeStore,
    config: Config,
    conversation_id: String,
    in_flight: Arc<AtomicBool>,
    current: Mutex<Option<ExchangeHandle>>,
}

/// Releases the in-flight slot and the abort handle on every exit from
/// `submit`, including a dropped future.
struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
    current: &'a Mutex<Option<ExchangeHandle>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *lock(self.current) = None;
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        bridge: SpeechBridge,
        config: Config,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store: Arc::new(Mutex::new(TranscriptStore::new())),
            bridge,
            prompts: PromptCodeStore::new(),
            config,
            conversation_id: conversation_id.into(),
            in_flight: Arc::new(AtomicBool::new(false)),
            current: Mutex::new(None),
        }
    }

    pub fn with_notice_sender(mut self, notices: NoticeSender) -> Self {
        self.bridge = self.bridge.with_notice_sender(notices);
        self
    }

    /// Stage a prompt code for the next submission only.
    pub fn stage_prompt_code(&self, code: &str) {
        self.prompts.put(&self.conversation_id, code);
    }

    /// Run one exchange to its terminal and speak the answer if it
    /// completed.
    ///
    /// Fails fast with [`ConvoError::ExchangeInFlight`] while another
    /// submission is outstanding. A staged prompt code is consumed here
    /// whether or not the exchange succeeds. Speech failures do not fail
    /// the exchange; the transcript already holds the answer.
    pub async fn submit(
        &self,
        content: UserContent,
        options: SendOptions,
    ) -> Result<ExchangeOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConvoError::ExchangeInFlight);
        }
        let _guard = FlightGuard {
            in_flight: &self.in_flight,
            current: &self.current,
        };

        let prompt_code = self.prompts.take(&self.conversation_id);

        let session = ChatSession::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            self.conversation_id.clone(),
            self.config.chat.clone(),
        );
        *lock(&self.current) = Some(session.handle());

        let outcome = session.send(content, prompt_code, options).await;

        if outcome.terminal == Terminal::Complete
            && let Some(text) = &outcome.final_text
            && let Err(_e) = self.bridge.speak(text).await
        {
            // Best effort; the bridge already raised a failure notice.
        }

        Ok(outcome)
    }

    /// Abort the in-flight exchange, if any. The exchange resolves through
    /// its closed terminal; delivered partials stay in the transcript.
    pub fn abort(&self) {
        if let Some(handle) = lock(&self.current).as_ref() {
            handle.cancel();
        }
    }

    /// Interrupt speech playback without touching the exchange.
    pub async fn stop_speaking(&self) -> Result<()> {
        self.bridge.stop().await
    }

    /// Clear the transcript. Rejected while an exchange is in flight.
    pub fn reset(&self) -> Result<()> {
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(ConvoError::ExchangeInFlight);
        }
        lock(&self.store).reset();
        Ok(())
    }

    /// Replace the transcript with persisted history. Rejected while an
    /// exchange is in flight.
    pub fn load(&self, turns: Vec<Turn>) -> Result<()> {
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(ConvoError::ExchangeInFlight);
        }
        lock(&self.store).load(turns);
        Ok(())
    }

    /// Shared handle to the transcript store.
    pub fn store(&self) -> Arc<Mutex<TranscriptStore>> {
        Arc::clone(&self.store)
    }

    /// Snapshot of the transcript.
    pub fn turns(&self) -> Vec<Turn> {
        lock(&self.store).turns().to_vec()
    }
}
