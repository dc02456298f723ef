//! One streaming chat exchange, from submission to terminal event.

use crate::chat::content::UserContent;
use crate::chat::machine::{self, Action, ExchangePhase, Terminal};
use crate::chat::transport::{ChatRequest, ChatTransport, StreamEvent};
use crate::config::ChatConfig;
use crate::defaults;
use crate::transcript::{TranscriptStore, UpdateMode};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Per-call options for `ChatSession::send`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Override the configured update mode for this exchange.
    pub incremental: Option<bool>,
    /// Override the configured model for this exchange.
    pub model_name: Option<String>,
    /// Extra fields merged into the wire payload.
    pub extra: Option<serde_json::Value>,
}

/// How an exchange ended, and the answer if it is eligible for speech.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOutcome {
    pub terminal: Terminal,
    /// Final assistant text, present only on the `Complete` terminal.
    pub final_text: Option<String>,
    /// Index of the assistant turn this exchange wrote.
    pub turn_index: usize,
}

/// Abort handle for an in-flight exchange.
///
/// Cancellation is cooperative: the transport is signalled and delivered
/// partials stay in the transcript. The token is owned by one exchange and
/// never reused.
#[derive(Debug, Clone)]
pub struct ExchangeHandle {
    cancel: CancellationToken,
}

impl ExchangeHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// One outstanding question→answer exchange.
///
/// Created per submission and consumed by `send`; callers must not run two
/// sessions against the same conversation concurrently (the orchestrator's
/// in-flight slot enforces this).
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    store: Arc<Mutex<TranscriptStore>>,
    conversation_id: String,
    config: ChatConfig,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<Mutex<TranscriptStore>>,
        conversation_id: impl Into<String>,
        config: ChatConfig,
    ) -> Self {
        Self {
            transport,
            store,
            conversation_id: conversation_id.into(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Handle for aborting this exchange from outside.
    pub fn handle(&self) -> ExchangeHandle {
        ExchangeHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Run the exchange to its terminal event.
    ///
    /// The turn pair is appended synchronously before any transport
    /// activity, so the UI reflects the submission immediately. Exactly one
    /// of complete/closed/error ends the exchange and this future settles
    /// exactly once; a transport that drops its event sender without a
    /// terminal counts as `Closed`, and an open failure takes the error
    /// path.
    pub async fn send(
        self,
        content: UserContent,
        prompt_code: Option<String>,
        options: SendOptions,
    ) -> ExchangeOutcome {
        let incremental = options.incremental.unwrap_or(self.config.incremental);
        let mode = if incremental {
            UpdateMode::Incremental
        } else {
            UpdateMode::Replace
        };
        let model_name = options
            .model_name
            .unwrap_or_else(|| self.config.model.clone());

        let turn_index = self
            .lock_store()
            .append_pair(content.display_text(), &model_name);

        let request = ChatRequest {
            conversation_id: self.conversation_id.clone(),
            chat_mode: self.config.chat_mode.clone(),
            model_name,
            user_input: content.to_payload(),
            prompt_code,
            incremental,
            extra: options.extra,
        };

        let (events_tx, mut events_rx) = mpsc::channel(defaults::STREAM_EVENT_BUFFER);

        let mut phase = ExchangePhase::Thinking;

        if let Err(e) = self
            .transport
            .open_stream(request, events_tx, self.cancel.clone())
            .await
        {
            let (_, action) = machine::step(phase, StreamEvent::Error(e.to_string()));
            return self.finish(turn_index, Terminal::Error, action);
        }

        loop {
            let event = match events_rx.recv().await {
                Some(event) => event,
                // Sender dropped with no terminal: the connection is gone.
                None => StreamEvent::Closed,
            };

            let (next, action) = machine::step(phase, event);
            phase = next;

            match action {
                Action::UpdateText(text) => {
                    self.lock_store().update_last(&text, mode);
                }
                Action::Ignore => {}
                finishing => {
                    let ExchangePhase::Done(terminal) = phase else {
                        unreachable!("finishing action outside Done phase");
                    };
                    return self.finish(turn_index, terminal, finishing);
                }
            }
        }
    }

    fn finish(self, turn_index: usize, terminal: Terminal, action: Action) -> ExchangeOutcome {
        let final_text = {
            let mut store = self.lock_store();
            if let Action::FinishWithError(message) = &action {
                // Error text always replaces, regardless of session mode.
                store.update_last(message, UpdateMode::Replace);
            }
            store.finalize(turn_index);
            match terminal {
                Terminal::Complete => store.last_assistant_text().map(str::to_string),
                Terminal::Closed | Terminal::Error => None,
            }
        };

        ExchangeOutcome {
            terminal,
            final_text,
            turn_index,
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, TranscriptStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}
