//! Abstract realtime speech-recognition transport.
//!
//! Mirrors the consumed contract of the recognition SDK: open a socket,
//! acquire the microphone, push interim transcripts to a registered sink,
//! drain buffered audio into a final transcript on stop.

use crate::error::{ConvoError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Trait for the realtime voice transport.
///
/// The capture session owns the transport exclusively for its lifetime and
/// releases it on every exit path.
#[async_trait]
pub trait VoiceTransport: Send {
    /// Open the realtime connection.
    async fn open_socket(&mut self) -> Result<()>;

    /// Acquire the microphone. `Ok(false)` means capture is unavailable
    /// without being a transport fault (e.g. the user declined).
    async fn open_microphone(&mut self) -> Result<bool>;

    /// Register the sink receiving interim transcripts. Each delivered
    /// string is the latest full interim text, not a delta.
    fn set_transcript_sink(&mut self, sink: mpsc::UnboundedSender<String>);

    /// Drain buffered audio and return the final transcript.
    async fn flush_final(&mut self) -> Result<String>;

    /// Close the connection. Safe to call more than once.
    fn close(&mut self);

    /// Discard any buffered recognition state.
    fn clear(&mut self);
}

/// Mock voice transport for testing.
///
/// Scripts interim transcripts (delivered when the sink is registered) and
/// the final flush text, can fail the socket or deny the microphone, and
/// records every call it receives.
#[derive(Debug, Clone)]
pub struct MockVoiceTransport {
    interims: Vec<String>,
    final_text: String,
    socket_failure: Option<String>,
    deny_microphone: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockVoiceTransport {
    fn default() -> Self {
        Self {
            interims: Vec::new(),
            final_text: "mock final transcript".to_string(),
            socket_failure: None,
            deny_microphone: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockVoiceTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interim transcripts pushed once the sink is registered.
    pub fn with_interims(mut self, interims: &[&str]) -> Self {
        self.interims = interims.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_final_text(mut self, text: &str) -> Self {
        self.final_text = text.to_string();
        self
    }

    /// Configure `open_socket` to fail.
    pub fn with_socket_failure(mut self, message: &str) -> Self {
        self.socket_failure = Some(message.to_string());
        self
    }

    /// Configure `open_microphone` to return `Ok(false)`.
    pub fn with_microphone_denied(mut self) -> Self {
        self.deny_microphone = true;
        self
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.to_string());
    }
}

#[async_trait]
impl VoiceTransport for MockVoiceTransport {
    async fn open_socket(&mut self) -> Result<()> {
        self.record("open_socket");
        match &self.socket_failure {
            Some(message) => Err(ConvoError::VoiceSocket {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn open_microphone(&mut self) -> Result<bool> {
        self.record("open_microphone");
        Ok(!self.deny_microphone)
    }

    fn set_transcript_sink(&mut self, sink: mpsc::UnboundedSender<String>) {
        self.record("set_transcript_sink");
        for interim in &self.interims {
            let _ = sink.send(interim.clone());
        }
    }

    async fn flush_final(&mut self) -> Result<String> {
        self.record("flush_final");
        Ok(self.final_text.clone())
    }

    fn close(&mut self) {
        self.record("close");
    }

    fn clear(&mut self) {
        self.record("clear");
    }
}
