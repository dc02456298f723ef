//! Exchange state machine.
//!
//! Transitions are pure functions of (phase, event), which makes the
//! "exactly one terminal event per exchange" guarantee checkable in
//! isolation: once a terminal moves the exchange to `Done`, every further
//! event maps to `Ignore`.

use crate::chat::transport::StreamEvent;

/// Which terminal event ended an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Normal completion; the answer is eligible for speech.
    Complete,
    /// Connection closed (including cancellation); no speech.
    Closed,
    /// Mid-stream failure; the error text replaced the answer.
    Error,
}

/// Phase of one streaming exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Pair appended, no text delivered yet.
    Thinking,
    /// At least one partial applied.
    Streaming,
    /// A terminal event fired; the exchange is over.
    Done(Terminal),
}

/// What the session must do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Apply the chunk to the assistant turn per the session's mode.
    UpdateText(String),
    /// Finalize and hand the answer to the speech bridge.
    FinishWithSpeech,
    /// Finalize without speech.
    FinishSilently,
    /// Replace the assistant text with the message and finalize.
    FinishWithError(String),
    /// Event arrived after the terminal; drop it.
    Ignore,
}

/// Advance the exchange by one event.
pub fn step(phase: ExchangePhase, event: StreamEvent) -> (ExchangePhase, Action) {
    match phase {
        ExchangePhase::Done(_) => (phase, Action::Ignore),
        ExchangePhase::Thinking | ExchangePhase::Streaming => match event {
            StreamEvent::Partial(text) => (ExchangePhase::Streaming, Action::UpdateText(text)),
            StreamEvent::Complete => (
                ExchangePhase::Done(Terminal::Complete),
                Action::FinishWithSpeech,
            ),
            StreamEvent::Closed => (ExchangePhase::Done(Terminal::Closed), Action::FinishSilently),
            StreamEvent::Error(message) => (
                ExchangePhase::Done(Terminal::Error),
                Action::FinishWithError(message),
            ),
        },
    }
}
