use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use services::{
    Advance, AnswerEvaluator, AnswerSubmission, Clock, CompletionSink, EvaluatorError,
    GeneratedQuestion, GradedAnswer, ProviderError, QuestionProvider, SessionError, SessionRunner,
    ValidationError,
};
use storage::repository::InMemoryMasteryStore;
use tutor_core::model::{
    Evaluation, LearnerId, Level, Mastery, Question, ROUND_LIMIT, Score, SessionStatus, TopicId,
};
use tutor_core::time::fixed_now;

//
// ─── MOCK COLLABORATORS ────────────────────────────────────────────────────────
//

#[derive(Default)]
struct ScriptedProvider {
    calls: AtomicUsize,
    fail_next: AtomicBool,
    seen_mastery: Mutex<Vec<f64>>,
}

#[async_trait]
impl QuestionProvider for ScriptedProvider {
    async fn generate_question(
        &self,
        _topic: &str,
        mastery: Mastery,
    ) -> Result<GeneratedQuestion, ProviderError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("scripted outage".into()));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_mastery.lock().unwrap().push(mastery.value());
        Ok(GeneratedQuestion {
            question: Question::new(
                format!("Question {n}"),
                vec!["a".into(), "b".into(), "c".into()],
                "b",
            )
            .unwrap(),
            level: Level::new("adaptive"),
        })
    }
}

/// Grades correct answers at 0.8 and bumps mastery by 0.1 per correct answer.
#[derive(Default)]
struct SteppingEvaluator {
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

#[async_trait]
impl AnswerEvaluator for SteppingEvaluator {
    async fn evaluate(
        &self,
        submission: AnswerSubmission<'_>,
    ) -> Result<GradedAnswer, EvaluatorError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EvaluatorError::Unavailable("scripted outage".into()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let correct = submission.answer == submission.correct_answer;
        let (score, delta) = if correct { (0.8, 0.1) } else { (0.2, -0.05) };
        Ok(GradedAnswer {
            evaluation: Evaluation::new(
                Score::clamped(score),
                "graded",
                Some("None needed".into()),
            ),
            new_mastery: Mastery::clamped(submission.mastery.value() + delta),
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    calls: AtomicUsize,
    last: Mutex<Option<f64>>,
}

#[async_trait]
impl CompletionSink for RecordingSink {
    async fn on_complete(&self, final_mastery: Mastery) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(final_mastery.value());
    }
}

struct Harness {
    runner: SessionRunner,
    store: InMemoryMasteryStore,
    provider: Arc<ScriptedProvider>,
    evaluator: Arc<SteppingEvaluator>,
    sink: Arc<RecordingSink>,
}

fn harness() -> Harness {
    let store = InMemoryMasteryStore::new();
    let provider = Arc::new(ScriptedProvider::default());
    let evaluator = Arc::new(SteppingEvaluator::default());
    let sink = Arc::new(RecordingSink::default());
    let runner = SessionRunner::new(
        Clock::fixed(fixed_now()),
        Arc::new(store.clone()),
        provider.clone(),
        evaluator.clone(),
        sink.clone(),
    );
    Harness {
        runner,
        store,
        provider,
        evaluator,
        sink,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn absent_mastery_starts_the_session_at_zero() {
    let h = harness();
    let session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
    assert_eq!(session.mastery(), Mastery::clamped(0.0));
    assert_eq!(h.provider.seen_mastery.lock().unwrap().as_slice(), &[0.0]);
}

#[tokio::test]
async fn stored_mastery_reaches_the_first_question_request() {
    let h = harness();
    h.store
        .set_mastery(
            &LearnerId::new("alice").unwrap(),
            &TopicId::new("rust-ownership").unwrap(),
            Mastery::clamped(0.2),
        )
        .unwrap();

    let session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    assert_eq!(session.mastery(), Mastery::clamped(0.2));
    assert_eq!(h.provider.seen_mastery.lock().unwrap().as_slice(), &[0.2]);
}

#[tokio::test]
async fn blank_learner_fails_before_any_collaborator_call() {
    let h = harness();
    let err = h
        .runner
        .start_session("   ", "rust-ownership", "Ownership")
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Identity(_)));
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_choice_is_rejected_without_an_evaluator_call() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    let err = h.runner.submit_answer(&mut session, "").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyChoice)
    ));
    assert_eq!(h.evaluator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
    assert_eq!(session.questions_answered(), 0);
    assert_eq!(session.mastery(), Mastery::clamped(0.0));
}

#[tokio::test]
async fn out_of_set_choice_is_rejected_without_an_evaluator_call() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    let err = h
        .runner
        .submit_answer(&mut session, "not-an-option")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::ChoiceNotOffered { .. })
    ));
    assert_eq!(h.evaluator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
}

#[tokio::test]
async fn a_graded_answer_moves_mastery_and_the_counter() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    let outcome = h.runner.submit_answer(&mut session, "b").await.unwrap();

    assert_eq!(session.status(), SessionStatus::Evaluated);
    assert_eq!(session.questions_answered(), 1);
    assert!(close(session.mastery().value(), 0.1));
    assert_eq!(outcome.evaluation.score(), Score::clamped(0.8));
    // The stub evaluator always reports the sentinel correction.
    assert_eq!(outcome.evaluation.correction(), None);
    assert_eq!(outcome.progress.answered, 1);
}

#[tokio::test]
async fn evaluator_failure_leaves_the_round_retryable() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    h.evaluator.fail_next.store(true, Ordering::SeqCst);
    let err = h.runner.submit_answer(&mut session, "b").await.unwrap_err();
    assert!(matches!(err, SessionError::Evaluator(_)));
    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
    assert_eq!(session.questions_answered(), 0);
    assert_eq!(session.mastery(), Mastery::clamped(0.0));

    // Retrying the identical submission behaves as if the failure never happened.
    let outcome = h.runner.submit_answer(&mut session, "b").await.unwrap();
    assert_eq!(session.questions_answered(), 1);
    assert!(close(outcome.mastery.value(), 0.1));
}

#[tokio::test]
async fn advance_before_evaluation_changes_nothing() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    let advance = h.runner.advance(&mut session).await.unwrap();
    assert_eq!(advance, Advance::Unchanged);
    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_failure_while_advancing_keeps_the_evaluated_state() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();
    h.runner.submit_answer(&mut session, "b").await.unwrap();

    h.provider.fail_next.store(true, Ordering::SeqCst);
    let err = h.runner.advance(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::Provider(_)));
    assert_eq!(session.status(), SessionStatus::Evaluated);
    assert_eq!(session.questions_answered(), 1);

    // Manual retry is the recovery path.
    let advance = h.runner.advance(&mut session).await.unwrap();
    assert_eq!(advance, Advance::NextQuestion);
    assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
}

#[tokio::test]
async fn next_question_is_requested_with_the_updated_mastery() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    h.runner.submit_answer(&mut session, "b").await.unwrap();
    h.runner.advance(&mut session).await.unwrap();

    let seen = h.provider.seen_mastery.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(close(seen[1], 0.1));
}

#[tokio::test]
async fn five_rounds_complete_the_session_and_fire_the_sink_once() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    let mut completed = None;
    for _ in 0..ROUND_LIMIT {
        h.runner.submit_answer(&mut session, "b").await.unwrap();
        match h.runner.advance(&mut session).await.unwrap() {
            Advance::NextQuestion => {}
            Advance::Completed(summary) => completed = Some(summary),
            Advance::Unchanged => panic!("advance should always act after an evaluation"),
        }
    }

    let summary = completed.expect("session should complete after five rounds");
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(summary.rounds_answered(), ROUND_LIMIT);
    assert!(close(summary.final_mastery().value(), 0.5));

    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);
    let reported = h.sink.last.lock().unwrap().expect("sink saw a value");
    assert!(close(reported, 0.5));

    // Exactly five questions were generated; completion requested none.
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn advancing_a_completed_session_is_idempotent() {
    let h = harness();
    let mut session = h
        .runner
        .start_session("alice", "rust-ownership", "Ownership")
        .await
        .unwrap();

    for _ in 0..ROUND_LIMIT {
        h.runner.submit_answer(&mut session, "b").await.unwrap();
        h.runner.advance(&mut session).await.unwrap();
    }
    assert_eq!(session.status(), SessionStatus::Completed);

    let advance = h.runner.advance(&mut session).await.unwrap();
    assert_eq!(advance, Advance::Unchanged);
    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);

    // Submitting after completion is rejected locally as well.
    let err = h.runner.submit_answer(&mut session, "b").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::NotAwaitingAnswer { .. })
    ));
    assert_eq!(h.evaluator.calls.load(Ordering::SeqCst), 5);
}
