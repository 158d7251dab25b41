//! Test finalization and aggregate scoring.
//!
//! The aggregate is the SUM of slot scores, unanswered slots counting as
//! zero. It is recomputed from the slots on every call, so finishing twice
//! yields the same result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::locks::TestLocks;
use crate::model::{AnswerSlot, ModuleId, StudentId, TestState, MAX_SLOT_SCORE};
use crate::traits::AssessmentStore;

/// Counts and totals over a test's slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotTally {
    pub score: f64,
    pub max_score: f64,
    pub total_slots: usize,
    pub answered: usize,
    pub correct: usize,
}

/// Sum slot scores. Pure and order independent.
pub fn tally(slots: &[AnswerSlot]) -> SlotTally {
    SlotTally {
        score: slots.iter().map(|s| s.score).sum(),
        max_score: MAX_SLOT_SCORE * slots.len() as f64,
        total_slots: slots.len(),
        answered: slots.iter().filter(|s| s.responded).count(),
        correct: slots.iter().filter(|s| s.is_correct).count(),
    }
}

/// The result of finishing a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedTest {
    pub test_id: Uuid,
    pub student_id: StudentId,
    pub module_id: ModuleId,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tally: SlotTally,
}

/// Finalizes tests.
pub struct TestAggregator {
    store: Arc<dyn AssessmentStore>,
    locks: Arc<TestLocks>,
}

impl TestAggregator {
    pub fn new(store: Arc<dyn AssessmentStore>, locks: Arc<TestLocks>) -> Self {
        Self { store, locks }
    }

    /// Move a test to `finished` and record its aggregate score.
    ///
    /// Calling this on an already finished test recomputes and returns the
    /// same aggregate, keeping the original finalize timestamp.
    pub async fn finish(&self, test_id: Uuid) -> EngineResult<FinishedTest> {
        let _guard = self.locks.finish_guard(test_id).await;

        let Some(mut test) = self.store.test(test_id).await? else {
            return Err(EngineError::InvalidState(format!(
                "test {test_id} does not exist and cannot be finished"
            )));
        };

        let slots = self.store.test_slots(test_id).await?;
        let totals = tally(&slots);

        let finished_at = match test.finished_at {
            Some(at) if test.is_finished() => at,
            _ => Utc::now(),
        };

        if !test.is_finished() {
            test.state = TestState::Finished;
            test.finished_at = Some(finished_at);
            test.score = totals.score;
            self.store.update_test(&test).await?;

            tracing::info!(
                test_id = %test.id,
                student_id = test.student_id,
                score = totals.score,
                answered = totals.answered,
                "finished test"
            );
        }

        Ok(FinishedTest {
            test_id,
            student_id: test.student_id,
            module_id: test.module_id,
            finished_at,
            tally: totals,
        })
    }
}
