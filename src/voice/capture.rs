//! Voice capture session: one recognition run from start to stop.
//!
//! State machine: idle → connecting → listening → (stopping) → idle, with
//! every failure path returning to idle. The transport handle and the
//! auto-stop timer are released on every exit, including drop.

use crate::config::VoiceConfig;
use crate::error::{ConvoError, Result};
use crate::notice::{Notice, NoticeSender};
use crate::voice::transport::VoiceTransport;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// State of a voice capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Opening the socket and the microphone.
    Connecting,
    /// Interim transcripts flowing, auto-stop timer armed.
    Listening,
    /// Draining the final transcript and releasing the transport.
    Stopping,
}

struct Inner {
    transport: Box<dyn VoiceTransport>,
    state: CaptureState,
    /// Last interim transcript, overwritten on each update.
    interim_text: String,
    /// Final transcript from the last clean stop (explicit or auto).
    final_text: String,
}

/// Auto-stop timer slot, kept outside the session lock so teardown can
/// always disarm it. Cancelling the token stops the timer task.
type TimerSlot = std::sync::Mutex<Option<CancellationToken>>;

fn take_token(slot: &TimerSlot) -> Option<CancellationToken> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Manages one microphone-to-text recognition session.
///
/// Exclusively owns its transport; only one session should be listening at
/// a time (the microphone is not shareable).
pub struct VoiceCaptureSession {
    inner: Arc<Mutex<Inner>>,
    timer: Arc<TimerSlot>,
    auto_stop_ms: u64,
    interim_tx: Option<mpsc::UnboundedSender<String>>,
    notices: NoticeSender,
}

impl VoiceCaptureSession {
    pub fn new(transport: Box<dyn VoiceTransport>, config: VoiceConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                transport,
                state: CaptureState::Idle,
                interim_text: String::new(),
                final_text: String::new(),
            })),
            timer: Arc::new(TimerSlot::default()),
            auto_stop_ms: config.auto_stop_ms,
            interim_tx: None,
            notices: NoticeSender::disabled(),
        }
    }

    /// Forward each interim transcript to this sender as it arrives.
    ///
    /// Push semantics: only the latest value matters, no buffering is
    /// promised beyond it.
    pub fn with_interim_sender(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.interim_tx = Some(tx);
        self
    }

    pub fn with_notice_sender(mut self, notices: NoticeSender) -> Self {
        self.notices = notices;
        self
    }

    /// Open the transport and start listening.
    ///
    /// No-op unless the session is idle. Socket and microphone failures
    /// are reported distinctly and both leave the session idle with the
    /// transport released.
    pub async fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != CaptureState::Idle {
            return Ok(());
        }
        inner.state = CaptureState::Connecting;

        if let Err(e) = inner.transport.open_socket().await {
            inner.transport.close();
            inner.state = CaptureState::Idle;
            self.notices.send(Notice::VoiceSocketFailed {
                message: e.to_string(),
            });
            return Err(e);
        }

        let mic_ok = match inner.transport.open_microphone().await {
            Ok(ok) => ok,
            Err(e) => {
                inner.transport.close();
                inner.state = CaptureState::Idle;
                self.notices.send(Notice::MicrophoneDenied {
                    message: e.to_string(),
                });
                return Err(ConvoError::MicrophoneDenied {
                    message: e.to_string(),
                });
            }
        };
        if !mic_ok {
            inner.transport.close();
            inner.state = CaptureState::Idle;
            self.notices.send(Notice::MicrophoneDenied {
                message: "capture unavailable".to_string(),
            });
            return Err(ConvoError::MicrophoneDenied {
                message: "capture unavailable".to_string(),
            });
        }

        inner.interim_text.clear();
        inner.final_text.clear();

        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();
        inner.transport.set_transcript_sink(sink_tx);

        // Interim pump: overwrite the latest value and push it to the
        // caller immediately. Ends when the transport drops its sink.
        let pump_inner = Arc::clone(&self.inner);
        let caller_tx = self.interim_tx.clone();
        tokio::spawn(async move {
            while let Some(text) = sink_rx.recv().await {
                pump_inner.lock().await.interim_text = text.clone();
                if let Some(tx) = &caller_tx {
                    let _ = tx.send(text);
                }
            }
        });

        if self.auto_stop_ms > 0 {
            let token = CancellationToken::new();
            *self.timer.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
            let timer_inner = Arc::clone(&self.inner);
            let timer_slot = Arc::clone(&self.timer);
            let notices = self.notices.clone();
            let deadline = std::time::Duration::from_millis(self.auto_stop_ms);
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(deadline) => {
                        let _ = stop_session(&timer_inner, &timer_slot, &notices, true).await;
                    }
                }
            });
        }

        inner.state = CaptureState::Listening;
        self.notices.send(Notice::ListeningStarted);
        Ok(())
    }

    /// Drain the final transcript and release the transport.
    ///
    /// No-op while idle: returns an empty string without touching the
    /// transport.
    pub async fn stop(&self) -> Result<String> {
        stop_session(&self.inner, &self.timer, &self.notices, false).await
    }

    /// Forced synchronous teardown: release the transport and disarm the
    /// timer without draining a final transcript. Used on owner disposal.
    ///
    /// The timer is disarmed unconditionally; it lives outside the session
    /// lock. For the transport, the only path holding that lock across an
    /// await is the stop path, which performs this same close+clear before
    /// releasing it, so a contended lock here never leaves the transport
    /// open. The retry covers the interim pump's momentary lock hold on a
    /// multithreaded runtime.
    pub fn close_now(&self) {
        if let Some(token) = take_token(&self.timer) {
            token.cancel();
        }
        for _ in 0..64 {
            match self.inner.try_lock() {
                Ok(mut inner) => {
                    if inner.state != CaptureState::Idle {
                        inner.transport.close();
                        inner.transport.clear();
                        inner.state = CaptureState::Idle;
                    }
                    return;
                }
                Err(_) => std::thread::yield_now(),
            }
        }
    }

    pub async fn state(&self) -> CaptureState {
        self.inner.lock().await.state
    }

    /// Last interim transcript delivered while listening.
    pub async fn interim_text(&self) -> String {
        self.inner.lock().await.interim_text.clone()
    }

    /// Final transcript from the last clean stop.
    pub async fn final_text(&self) -> String {
        self.inner.lock().await.final_text.clone()
    }
}

impl Drop for VoiceCaptureSession {
    fn drop(&mut self) {
        self.close_now();
    }
}

/// Shared stop path for explicit stops and auto-stop expiry.
async fn stop_session(
    inner: &Arc<Mutex<Inner>>,
    timer: &TimerSlot,
    notices: &NoticeSender,
    auto: bool,
) -> Result<String> {
    let mut inner = inner.lock().await;
    if inner.state != CaptureState::Listening {
        return Ok(String::new());
    }
    inner.state = CaptureState::Stopping;

    if let Some(token) = take_token(timer) {
        token.cancel();
    }

    let flushed = inner.transport.flush_final().await;
    inner.transport.close();
    inner.transport.clear();
    inner.state = CaptureState::Idle;

    match flushed {
        Ok(text) => {
            inner.final_text = text.clone();
            if auto {
                notices.send(Notice::AutoStopped);
            }
            notices.send(Notice::ListeningStopped {
                final_text: text.clone(),
            });
            Ok(text)
        }
        Err(e) => Err(ConvoError::VoiceFlush {
            message: e.to_string(),
        }),
    }
}
