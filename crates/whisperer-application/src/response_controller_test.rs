//! State-machine tests for the response controller, driven by a scripted
//! mock model client.

use crate::response_controller::{ControllerConfig, ResponseController};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use whisperer_core::error::{Result, WhispererError};
use whisperer_core::model_client::ModelClient;
use whisperer_core::session::Session;
use whisperer_core::settings::GenerationSettings;
use whisperer_core::turn::{Turn, TurnOutcome, Verdict};

/// One scripted reaction of the mock model.
enum Scripted {
    Answer(&'static str),
    Fail(WhispererError),
    /// Never completes; only a timeout or cancellation gets past it.
    Hang,
}

struct RecordedCall {
    prompt: String,
    context: Vec<String>,
}

/// Deterministic stand-in for the hosted model: replays a script and
/// records every call it receives.
struct MockModelClient {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockModelClient {
    fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<RecordedCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl ModelClient for MockModelClient {
    async fn generate(
        &self,
        prompt: &str,
        context: &[String],
        _settings: &GenerationSettings,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            context: context.to_vec(),
        });
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock script exhausted");
        match next {
            Scripted::Answer(answer) => Ok(answer.to_string()),
            Scripted::Fail(err) => Err(err),
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hanging call should have been abandoned")
            }
        }
    }
}

fn turn(question: &str, context: &[&str]) -> Turn {
    Turn::new(
        question,
        context.iter().map(|c| c.to_string()).collect(),
        GenerationSettings::default(),
    )
    .unwrap()
}

fn controller() -> ResponseController {
    ResponseController::new(ControllerConfig::default())
}

#[tokio::test]
async fn test_grounded_answer_accepted_on_first_attempt() {
    let client = MockModelClient::new(vec![Scripted::Answer("foo returns 42")]);
    let mut session = Session::new();

    let output = controller()
        .handle(
            &mut session,
            turn("What does function foo return?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::Accepted);
    assert_eq!(output.verdict, Verdict::Grounded);
    assert_eq!(output.attempts_made, 1);
    assert_eq!(output.text, "foo returns 42");
    assert!(output.annotation.is_none());
    assert!(!output.is_flagged());

    assert_eq!(session.records.len(), 1);
    assert_eq!(session.records[0].attempt.attempt_index, 0);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_context_ends_in_clarification_request() {
    // Every attempt makes a specific unverifiable claim.
    let client = MockModelClient::new(vec![
        Scripted::Answer("It uses Django 4.2 with Celery workers"),
        Scripted::Answer("It uses Flask behind nginx"),
        Scripted::Answer("It uses Rails with Sidekiq"),
    ]);
    let mut session = Session::new();

    let output = controller()
        .handle(
            &mut session,
            turn("What framework does this project use?", &[]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::ClarificationRequested);
    assert_eq!(output.verdict, Verdict::Ungrounded);
    assert_eq!(output.attempts_made, 3);
    assert!(output.text.contains("share the relevant code"));
    assert!(output.is_flagged());

    // Retry prompts acknowledge that nothing supported the answer.
    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[1].prompt.contains("No context chunk supported"));
    assert!(calls[1].context.is_empty());
    assert_eq!(session.records.len(), 1);
}

#[tokio::test]
async fn test_partial_answer_retries_with_supportive_chunks_only() {
    let client = MockModelClient::new(vec![
        Scripted::Answer("foo returns 42 and is thread-safe"),
        Scripted::Answer("foo returns 42"),
    ]);
    let mut session = Session::new();

    let output = controller()
        .handle(
            &mut session,
            turn(
                "What does function foo return?",
                &["def foo(): return 42", "unrelated build notes"],
            ),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::Accepted);
    assert_eq!(output.verdict, Verdict::Grounded);
    assert_eq!(output.attempts_made, 2);

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    // The refined call restates the question and carries only the chunk
    // that supported the first attempt.
    assert!(calls[1].prompt.contains("What does function foo return?"));
    assert!(calls[1].prompt.contains("avoid any claim"));
    assert_eq!(calls[1].context, vec!["def foo(): return 42".to_string()]);
}

#[tokio::test]
async fn test_gave_up_selects_best_scoring_attempt() {
    // Scores: 0.0, ~0.33, 0.0 - the middle attempt must win.
    let client = MockModelClient::new(vec![
        Scripted::Answer("It sends emails to the moon server"),
        Scripted::Answer("add returns the sum and it caches results and it is recursive"),
        Scripted::Answer("This was written by a famous pianist"),
    ]);
    let mut session = Session::new();

    let output = controller()
        .handle(
            &mut session,
            turn("What does add do?", &["def add(x, y): return x + y"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::GaveUp);
    assert_eq!(output.attempts_made, 3);
    assert_eq!(
        output.text,
        "add returns the sum and it caches results and it is recursive"
    );
    assert!(output.confidence > 0.0 && output.confidence < 0.4);
    let annotation = output.annotation.as_deref().unwrap();
    assert!(annotation.contains("Low confidence"));
    assert!(output.rendered().contains(annotation));

    // The recorded attempt is the chosen one; its index stays within the cap.
    assert_eq!(session.records.len(), 1);
    assert_eq!(session.records[0].attempt.raw_answer, output.text);
    assert!(session.records[0].attempt.attempt_index <= 2);
    assert_eq!(session.records[0].outcome, TurnOutcome::GaveUp);
}

#[tokio::test]
async fn test_partial_at_cap_accepted_with_annotation() {
    let client = MockModelClient::new(vec![
        Scripted::Answer("foo returns 42 and is thread-safe"),
        Scripted::Answer("foo returns 42 and is thread-safe"),
        Scripted::Answer("foo returns 42 and is thread-safe"),
    ]);
    let mut session = Session::new();

    let output = controller()
        .handle(
            &mut session,
            turn("What does function foo return?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::Accepted);
    assert_eq!(output.verdict, Verdict::Partial);
    assert_eq!(output.attempts_made, 3);
    assert!(output.is_flagged());
    assert!(
        output
            .annotation
            .as_deref()
            .unwrap()
            .contains("may not be supported")
    );
}

#[tokio::test]
async fn test_model_failure_propagates_without_retry() {
    let client = MockModelClient::new(vec![Scripted::Fail(
        WhispererError::model_unavailable_with_status("rate limited", 429, true),
    )]);
    let mut session = Session::new();

    let err = controller()
        .handle(
            &mut session,
            turn("What does foo do?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap_err();

    assert!(err.is_model_unavailable());
    // Infra failure is not a grounding problem: one call, nothing recorded.
    assert_eq!(client.calls().len(), 1);
    assert!(session.records.is_empty());
}

#[tokio::test]
async fn test_zero_retries_accepts_partial_immediately() {
    let client = MockModelClient::new(vec![Scripted::Answer(
        "foo returns 42 and is thread-safe",
    )]);
    let mut session = Session::new();
    let controller = ResponseController::new(ControllerConfig {
        max_retries: 0,
        ..Default::default()
    });

    let output = controller
        .handle(
            &mut session,
            turn("What does function foo return?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::Accepted);
    assert_eq!(output.verdict, Verdict::Partial);
    assert_eq!(output.attempts_made, 1);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_gives_up_with_best_attempt_so_far() {
    let client = MockModelClient::new(vec![
        Scripted::Answer("add returns the sum and it caches results and it is recursive"),
        Scripted::Hang,
    ]);
    let mut session = Session::new();
    let controller = ResponseController::new(ControllerConfig {
        turn_timeout: Duration::from_millis(200),
        ..Default::default()
    });

    let output = controller
        .handle(
            &mut session,
            turn("What does add do?", &["def add(x, y): return x + y"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::GaveUp);
    assert_eq!(output.attempts_made, 1);
    assert!(output.text.contains("add returns the sum"));
    assert_eq!(session.records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_before_any_answer_is_still_gave_up() {
    let client = MockModelClient::new(vec![Scripted::Hang]);
    let mut session = Session::new();
    let controller = ResponseController::new(ControllerConfig {
        turn_timeout: Duration::from_millis(50),
        ..Default::default()
    });

    let output = controller
        .handle(
            &mut session,
            turn("What does foo do?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(output.outcome, TurnOutcome::GaveUp);
    assert_eq!(output.attempts_made, 0);
    assert_eq!(output.confidence, 0.0);
    assert!(output.is_flagged());
    // Nothing was scored, so nothing is recorded.
    assert!(session.records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_abandons_in_flight_call() {
    let client = MockModelClient::new(vec![Scripted::Hang]);
    let mut session = Session::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = controller()
        .handle_with_cancellation(
            &mut session,
            turn("What does foo do?", &["def foo(): return 42"]),
            &client,
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(session.records.is_empty());
}

#[tokio::test]
async fn test_session_accumulates_across_turns() {
    let client = MockModelClient::new(vec![
        Scripted::Answer("foo returns 42"),
        Scripted::Answer("add adds the numbers x and y"),
    ]);
    let mut session = Session::new();
    let controller = controller();

    controller
        .handle(
            &mut session,
            turn("What does function foo return?", &["def foo(): return 42"]),
            &client,
        )
        .await
        .unwrap();
    controller
        .handle(
            &mut session,
            turn("What does add do?", &["def add(x, y): return x + y"]),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(session.records.len(), 2);
    assert_eq!(session.records[0].outcome, TurnOutcome::Accepted);

    session.clear();
    assert!(session.records.is_empty());
}
