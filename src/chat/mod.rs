//! Streaming chat: one question→answer exchange delivered incrementally.

pub mod content;
pub mod machine;
pub mod session;
pub mod transport;

pub use content::{ContentPart, ImageRef, UserContent};
pub use machine::{Action, ExchangePhase, Terminal};
pub use session::{ChatSession, ExchangeHandle, ExchangeOutcome, SendOptions};
pub use transport::{ChatRequest, ChatTransport, EchoTransport, MockChatTransport, StreamEvent};
