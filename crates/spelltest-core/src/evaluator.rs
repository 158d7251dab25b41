//! Answer evaluation: score one submission and persist the slot.
//!
//! Re-submitting is an idempotent overwrite. Every call recomputes the
//! outcome from the latest submission and the slot's frozen question, so no
//! state accumulates across calls.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::locks::TestLocks;
use crate::model::{Answer, AnswerSlot};
use crate::policy::{FeedbackHint, ScoringPolicy};
use crate::traits::AssessmentStore;

/// Messages shown on a fully correct answer, one picked at random.
pub const MOTIVATIONAL_MESSAGES: [&str; 4] =
    ["Great job!", "Very good!", "Keep going!", "Awesome!"];

/// Message shown on an incorrect answer.
pub const INCORRECT_MESSAGE: &str = "Incorrect answer";

/// Turn a policy hint into student-facing text.
pub fn render_feedback<R: Rng + ?Sized>(hint: FeedbackHint, rng: &mut R) -> String {
    match hint {
        FeedbackHint::Correct => MOTIVATIONAL_MESSAGES
            .choose(rng)
            .copied()
            .unwrap_or(MOTIVATIONAL_MESSAGES[0])
            .to_string(),
        FeedbackHint::Incorrect => INCORRECT_MESSAGE.to_string(),
        FeedbackHint::Missing(1) => "You missed 1 correct option".to_string(),
        FeedbackHint::Missing(n) => format!("You missed {n} correct options"),
    }
}

/// Scores submitted answers.
pub struct AnswerEvaluator {
    store: Arc<dyn AssessmentStore>,
    locks: Arc<TestLocks>,
    rng: Mutex<StdRng>,
}

impl AnswerEvaluator {
    pub fn new(store: Arc<dyn AssessmentStore>, locks: Arc<TestLocks>, rng: StdRng) -> Self {
        Self {
            store,
            locks,
            rng: Mutex::new(rng),
        }
    }

    /// Score `answer` against the slot's snapshot without touching storage.
    pub fn evaluate(
        &self,
        slot: &AnswerSlot,
        answer: Answer,
        now: DateTime<Utc>,
    ) -> EngineResult<AnswerSlot> {
        let question = &slot.question;
        let policy = ScoringPolicy::for_question(question)?;
        let outcome = policy.score(&question.correct_answer, &answer)?;

        let feedback = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            render_feedback(outcome.hint, &mut *rng)
        };

        Ok(AnswerSlot {
            answer: Some(answer),
            responded: true,
            is_correct: outcome.is_correct,
            score: outcome.score,
            feedback,
            answered_at: Some(now),
            ..slot.clone()
        })
    }

    /// Score a submission for a slot and persist the result.
    ///
    /// Fails with `InvalidState` once the parent test is finished. On any
    /// error the stored slot is left untouched.
    pub async fn submit(&self, slot_id: Uuid, answer: Answer) -> EngineResult<AnswerSlot> {
        let slot = self
            .store
            .slot(slot_id)
            .await?
            .ok_or_else(|| EngineError::not_found("slot", slot_id))?;

        let _guard = self.locks.submit_guard(slot.test_id).await;

        let test = self
            .store
            .test(slot.test_id)
            .await?
            .ok_or_else(|| EngineError::not_found("test", slot.test_id))?;
        if test.is_finished() {
            return Err(EngineError::InvalidState(format!(
                "test {} is finished and no longer accepts answers",
                test.id
            )));
        }

        let scored = match self.evaluate(&slot, answer, Utc::now()) {
            Ok(scored) => scored,
            Err(e @ EngineError::UnsupportedQuestionType(_)) => {
                tracing::warn!(
                    slot_id = %slot.id,
                    question_id = slot.question.question_id,
                    "cannot score slot: {e}"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.store.update_slot(&scored).await?;

        tracing::debug!(
            slot_id = %scored.id,
            test_id = %scored.test_id,
            correct = scored.is_correct,
            score = scored.score,
            "scored answer"
        );

        Ok(scored)
    }
}
