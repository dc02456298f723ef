//! Full-loop tests: submission through streaming to transcript state and
//! spoken output, against mock transports.

use convo::chat::{MockChatTransport, StreamEvent};
use convo::config::{Config, SpeechConfig, VoiceConfig};
use convo::speech::{MockAvatarEngine, SpeechBridge};
use convo::transcript::Role;
use convo::voice::{MockVoiceTransport, VoiceCaptureSession};
use convo::{ConvoError, Orchestrator, SendOptions, Terminal, UserContent};
use std::sync::Arc;

fn orchestrator(transport: MockChatTransport) -> (Orchestrator, Arc<MockAvatarEngine>) {
    let engine = Arc::new(MockAvatarEngine::new());
    let bridge = SpeechBridge::new(engine.clone(), SpeechConfig::default());
    let orch = Orchestrator::new(Arc::new(transport), bridge, Config::default(), "conv-e2e");
    (orch, engine)
}

fn partial(s: &str) -> StreamEvent {
    StreamEvent::Partial(s.to_string())
}

#[tokio::test]
async fn completed_exchange_lands_in_transcript_and_speech() {
    let transport = MockChatTransport::new().with_events(vec![
        partial("hi"),
        partial("hi there"),
        StreamEvent::Complete,
    ]);
    let (orch, engine) = orchestrator(transport);

    let outcome = orch
        .submit(UserContent::text("hello"), SendOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.terminal, Terminal::Complete);
    assert_eq!(outcome.final_text.as_deref(), Some("hi there"));

    let turns = orch.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::Human);
    assert_eq!(turns[0].text, "hello");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].text, "hi there");
    assert!(!turns[1].thinking);
    assert_eq!(turns[0].order, turns[1].order);

    // Spoken exactly once, sanitized.
    assert_eq!(engine.utterances().len(), 1);
    assert_eq!(engine.utterances()[0].text, "hi there");
}

#[tokio::test]
async fn incremental_mode_accumulates_chunks() {
    let transport = MockChatTransport::new().with_events(vec![
        partial("a"),
        partial("b"),
        StreamEvent::Complete,
    ]);
    let (orch, _) = orchestrator(transport);

    let outcome = orch
        .submit(
            UserContent::text("spell it"),
            SendOptions {
                incremental: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.final_text.as_deref(), Some("ab"));
    assert_eq!(orch.turns()[1].text, "ab");
}

#[tokio::test]
async fn error_before_any_chunk_replaces_placeholder_and_stays_silent() {
    let transport =
        MockChatTransport::new().with_events(vec![StreamEvent::Error("model offline".to_string())]);
    let (orch, engine) = orchestrator(transport);

    let outcome = orch
        .submit(UserContent::text("q"), SendOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.terminal, Terminal::Error);
    assert_eq!(outcome.final_text, None);
    assert_eq!(orch.turns()[1].text, "model offline");
    assert!(!orch.turns()[1].thinking);
    assert!(engine.utterances().is_empty());
}

#[tokio::test]
async fn closed_connection_keeps_partials_and_stays_silent() {
    let transport =
        MockChatTransport::new().with_events(vec![partial("half an"), StreamEvent::Closed]);
    let (orch, engine) = orchestrator(transport);

    let outcome = orch
        .submit(UserContent::text("q"), SendOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.terminal, Terminal::Closed);
    assert_eq!(orch.turns()[1].text, "half an");
    assert!(engine.utterances().is_empty());
}

#[tokio::test]
async fn concurrent_submission_is_rejected_then_slot_reopens() {
    let transport = MockChatTransport::new()
        .with_events(vec![partial("thinking...")])
        .with_close_on_cancel();
    let (orch, _) = orchestrator(transport);
    let orch = Arc::new(orch);

    let first = {
        let orch = Arc::clone(&orch);
        tokio::spawn(
            async move { orch.submit(UserContent::text("one"), SendOptions::default()).await },
        )
    };
    while orch.turns().is_empty() {
        tokio::task::yield_now().await;
    }

    let err = orch
        .submit(UserContent::text("two"), SendOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvoError::ExchangeInFlight));

    orch.abort();
    assert_eq!(first.await.unwrap().unwrap().terminal, Terminal::Closed);

    // The aborted exchange released the slot: a new submission gets past
    // the guard and appends its pair.
    let turns_before = orch.turns().len();
    let second = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move {
            orch.submit(UserContent::text("three"), SendOptions::default())
                .await
        })
    };
    while orch.turns().len() == turns_before {
        tokio::task::yield_now().await;
    }
    orch.abort();
    assert_eq!(second.await.unwrap().unwrap().terminal, Terminal::Closed);
}

#[tokio::test]
async fn voice_final_transcript_feeds_a_chat_exchange() {
    // Speak into the microphone, stop, submit what was recognized.
    let voice = MockVoiceTransport::new()
        .with_interims(&["what", "what time"])
        .with_final_text("what time is it");
    let capture = VoiceCaptureSession::new(Box::new(voice), VoiceConfig::default());

    capture.start().await.unwrap();
    let question = capture.stop().await.unwrap();
    assert_eq!(question, "what time is it");

    let transport =
        MockChatTransport::new().with_events(vec![partial("noon"), StreamEvent::Complete]);
    let (orch, engine) = orchestrator(transport);

    let outcome = orch
        .submit(UserContent::text(&question), SendOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.final_text.as_deref(), Some("noon"));
    assert_eq!(orch.turns()[0].text, "what time is it");
    assert_eq!(engine.utterances()[0].text, "noon");
}

#[tokio::test]
async fn prompt_code_applies_to_exactly_one_exchange() {
    let transport = MockChatTransport::new().with_events(vec![StreamEvent::Complete]);
    let (orch, _) = orchestrator(transport.clone());

    orch.stage_prompt_code("code_news");
    orch.submit(UserContent::text("headlines"), SendOptions::default())
        .await
        .unwrap();
    orch.submit(UserContent::text("more"), SendOptions::default())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].prompt_code.as_deref(), Some("code_news"));
    assert_eq!(requests[1].prompt_code, None);
}
