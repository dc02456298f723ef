//! Abstract streaming transport for chat exchanges.
//!
//! This trait allows swapping implementations (real SSE/WebSocket client vs
//! mock). The transport delivers events for one request in emission order
//! and emits at most one terminal event; the session tolerates transports
//! that violate this by ignoring everything after the first terminal.

use crate::chat::content;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One event on a streaming chat request.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of assistant text (replace or append per session mode).
    Partial(String),
    /// The answer completed normally.
    Complete,
    /// The connection closed without an explicit completion.
    Closed,
    /// The exchange failed; the message becomes the assistant turn's text.
    Error(String),
}

impl StreamEvent {
    /// True for `Complete`, `Closed` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Partial(_))
    }
}

/// Request payload for one streaming exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub chat_mode: String,
    pub model_name: String,
    /// The submission exactly as the user provided it.
    pub user_input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_code: Option<String>,
    pub incremental: bool,
    /// Caller-supplied extra fields merged into the wire payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl ChatRequest {
    /// Flat wire payload: the request fields with `extra` object entries
    /// merged over them.
    pub fn to_payload(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("conv_uid".to_string(), Value::String(self.conversation_id.clone()));
        map.insert("chat_mode".to_string(), Value::String(self.chat_mode.clone()));
        map.insert("model_name".to_string(), Value::String(self.model_name.clone()));
        map.insert("user_input".to_string(), self.user_input.clone());
        map.insert("incremental".to_string(), Value::Bool(self.incremental));
        if let Some(code) = &self.prompt_code {
            map.insert("prompt_code".to_string(), Value::String(code.clone()));
        }
        if let Some(Value::Object(extra)) = &self.extra {
            for (k, v) in extra {
                map.insert(k.clone(), v.clone());
            }
        }
        Value::Object(map)
    }

    /// Plain text of `user_input`, best effort (used by demo transports).
    pub fn input_text(&self) -> String {
        match &self.user_input {
            Value::String(s) => s.clone(),
            other => serde_json::from_value::<content::UserContent>(other.clone())
                .map(|c| c.display_text())
                .unwrap_or_default(),
        }
    }
}

/// Trait for the streaming chat transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a cancellable streaming request.
    ///
    /// Returns once the stream is established; events are then delivered
    /// through `events` until a terminal event. An `Err` return means the
    /// stream never opened and no events will be delivered.
    async fn open_stream(
        &self,
        request: ChatRequest,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<()>;
}

/// Mock chat transport for testing.
///
/// Plays back a scripted event sequence and records every request it was
/// asked to open.
#[derive(Debug, Clone, Default)]
pub struct MockChatTransport {
    script: Vec<StreamEvent>,
    open_failure: Option<String>,
    /// Emit `Closed` when the cancellation token fires after the script
    /// (used to model a transport honoring an abort).
    close_on_cancel: bool,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChatTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the events delivered after a successful open.
    pub fn with_events(mut self, events: Vec<StreamEvent>) -> Self {
        self.script = events;
        self
    }

    /// Configure the mock to fail the open call.
    pub fn with_open_failure(mut self, message: &str) -> Self {
        self.open_failure = Some(message.to_string());
        self
    }

    /// After the script runs out without a terminal, wait for cancellation
    /// and then emit `Closed`.
    pub fn with_close_on_cancel(mut self) -> Self {
        self.close_on_cancel = true;
        self
    }

    /// Requests recorded so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ChatTransport for MockChatTransport {
    async fn open_stream(
        &self,
        request: ChatRequest,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(message) = &self.open_failure {
            return Err(crate::error::ConvoError::ChatTransport {
                message: message.clone(),
            });
        }

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let script = self.script.clone();
        let close_on_cancel = self.close_on_cancel;
        tokio::spawn(async move {
            for event in script {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            if close_on_cancel {
                cancel.cancelled().await;
                let _ = events.send(StreamEvent::Closed).await;
            }
        });
        Ok(())
    }
}

/// Demo transport that streams the user's own text back.
///
/// Incremental requests receive word-sized chunks; replace-mode requests
/// receive growing prefixes, imitating a server that resends the full
/// answer on every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTransport;

#[async_trait]
impl ChatTransport for EchoTransport {
    async fn open_stream(
        &self,
        request: ChatRequest,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let text = request.input_text();
        let incremental = request.incremental;

        tokio::spawn(async move {
            let words: Vec<&str> = text.split_whitespace().collect();
            let mut sofar = String::new();
            for (i, word) in words.iter().enumerate() {
                if !sofar.is_empty() {
                    sofar.push(' ');
                }
                sofar.push_str(word);

                let chunk = if incremental {
                    let mut piece = String::new();
                    if i > 0 {
                        piece.push(' ');
                    }
                    piece.push_str(word);
                    piece
                } else {
                    sofar.clone()
                };

                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = events.send(StreamEvent::Closed).await;
                        return;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_millis(30)) => {}
                }
                if events.send(StreamEvent::Partial(chunk)).await.is_err() {
                    return;
                }
            }
            let _ = events.send(StreamEvent::Complete).await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: Value, incremental: bool) -> ChatRequest {
        ChatRequest {
            conversation_id: "c1".to_string(),
            chat_mode: "chat_normal".to_string(),
            model_name: "m".to_string(),
            user_input: input,
            prompt_code: None,
            incremental,
            extra: None,
        }
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!StreamEvent::Partial("x".to_string()).is_terminal());
        assert!(StreamEvent::Complete.is_terminal());
        assert!(StreamEvent::Closed.is_terminal());
        assert!(StreamEvent::Error("e".to_string()).is_terminal());
    }

    #[test]
    fn test_request_payload_merges_extra_fields() {
        let mut req = request(Value::String("hi".to_string()), false);
        req.prompt_code = Some("p-1".to_string());
        req.extra = Some(serde_json::json!({"temperature": 0.6, "model_name": "override"}));

        let payload = req.to_payload();
        assert_eq!(payload["conv_uid"], "c1");
        assert_eq!(payload["user_input"], "hi");
        assert_eq!(payload["prompt_code"], "p-1");
        assert_eq!(payload["temperature"], 0.6);
        // Extra fields win over the request's own, as the caller merged last.
        assert_eq!(payload["model_name"], "override");
    }

    #[test]
    fn test_input_text_from_structured_payload() {
        let req = request(
            serde_json::json!({"content": [{"type": "text", "text": "hello"}]}),
            false,
        );
        assert_eq!(req.input_text(), "hello");
    }

    #[tokio::test]
    async fn test_mock_transport_plays_script_and_records_request() {
        let transport = MockChatTransport::new().with_events(vec![
            StreamEvent::Partial("a".to_string()),
            StreamEvent::Complete,
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        transport
            .open_stream(
                request(Value::String("q".to_string()), false),
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(StreamEvent::Partial("a".to_string())));
        assert_eq!(rx.recv().await, Some(StreamEvent::Complete));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].conversation_id, "c1");
    }

    #[tokio::test]
    async fn test_mock_transport_open_failure_delivers_nothing() {
        let transport = MockChatTransport::new().with_open_failure("boom");
        let (tx, mut rx) = mpsc::channel(8);
        let result = transport
            .open_stream(
                request(Value::String("q".to_string()), false),
                tx,
                CancellationToken::new(),
            )
            .await;
        assert!(result.is_err());
        assert!(rx.recv().await.is_none());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mock_transport_close_on_cancel() {
        let transport = MockChatTransport::new()
            .with_events(vec![StreamEvent::Partial("half".to_string())])
            .with_close_on_cancel();
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        transport
            .open_stream(request(Value::String("q".to_string()), false), tx, cancel.clone())
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::Partial("half".to_string()))
        );
        cancel.cancel();
        assert_eq!(rx.recv().await, Some(StreamEvent::Closed));
    }

    #[tokio::test]
    async fn test_echo_transport_replace_mode_sends_growing_prefixes() {
        let transport = EchoTransport;
        let (tx, mut rx) = mpsc::channel(8);
        transport
            .open_stream(
                request(Value::String("hi there".to_string()), false),
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(StreamEvent::Partial("hi".to_string())));
        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::Partial("hi there".to_string()))
        );
        assert_eq!(rx.recv().await, Some(StreamEvent::Complete));
    }

    #[tokio::test]
    async fn test_echo_transport_incremental_mode_sends_pieces() {
        let transport = EchoTransport;
        let (tx, mut rx) = mpsc::channel(8);
        transport
            .open_stream(
                request(Value::String("a b".to_string()), true),
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let mut collected = String::new();
        loop {
            match rx.recv().await {
                Some(StreamEvent::Partial(p)) => collected.push_str(&p),
                Some(StreamEvent::Complete) => break,
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert_eq!(collected, "a b");
    }
}
