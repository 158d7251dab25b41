//! Assessment engine facade.
//!
//! Wires the selector, evaluator and aggregator to one storage handle and
//! one lock registry, and exposes the operations the transport layer calls.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{FinishedTest, TestAggregator};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::AnswerEvaluator;
use crate::locks::TestLocks;
use crate::model::{Answer, AnswerSlot, ModuleId, StudentId, Test};
use crate::selector::{SelectionConfig, TestSelector};
use crate::statistics::{leaderboard, summarize_history, StudentPoints, TestSummary, TestView};
use crate::traits::{AssessmentStore, SubscriptionPolicy};

/// Configuration for the assessment engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Question selection policy.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Seed for question selection and feedback choice. `None` seeds from
    /// the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Default leaderboard size.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Default leaderboard window: one month back through tomorrow.
pub fn default_leaderboard_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .checked_sub_months(Months::new(1))
        .unwrap_or(now - Duration::days(30));
    (start, now + Duration::days(1))
}

/// The central assessment engine.
pub struct AssessmentEngine {
    store: Arc<dyn AssessmentStore>,
    locks: Arc<TestLocks>,
    selector: TestSelector,
    evaluator: AnswerEvaluator,
    aggregator: TestAggregator,
}

impl AssessmentEngine {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        subscriptions: Arc<dyn SubscriptionPolicy>,
        config: EngineConfig,
    ) -> Self {
        let mut seeder = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let selection_rng = StdRng::seed_from_u64(seeder.gen());
        let feedback_rng = StdRng::seed_from_u64(seeder.gen());
        let locks = Arc::new(TestLocks::new());

        Self {
            selector: TestSelector::new(
                Arc::clone(&store),
                subscriptions,
                config.selection,
                selection_rng,
            ),
            evaluator: AnswerEvaluator::new(Arc::clone(&store), Arc::clone(&locks), feedback_rng),
            aggregator: TestAggregator::new(Arc::clone(&store), Arc::clone(&locks)),
            locks,
            store,
        }
    }

    /// Create a test for a student from a module's questions.
    pub async fn create_test(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> EngineResult<Test> {
        self.selector.create_test(student_id, module_id).await
    }

    /// Score and persist one answer.
    pub async fn submit_answer(&self, slot_id: Uuid, answer: Answer) -> EngineResult<AnswerSlot> {
        self.evaluator.submit(slot_id, answer).await
    }

    /// Finalize a test and return its aggregate.
    pub async fn finish_test(&self, test_id: Uuid) -> EngineResult<FinishedTest> {
        self.aggregator.finish(test_id).await
    }

    /// Number of tests with a submission or finish in flight.
    pub fn locked_tests(&self) -> usize {
        self.locks.len()
    }

    /// Read a test back with its slots in question order.
    pub async fn get_test(&self, test_id: Uuid) -> EngineResult<TestView> {
        let test = self
            .store
            .test(test_id)
            .await?
            .ok_or_else(|| EngineError::not_found("test", test_id))?;
        let mut slots = self.store.test_slots(test_id).await?;
        slots.sort_by_key(|s| s.position);
        Ok(TestView { test, slots })
    }

    /// A student's attempts on a module, newest first.
    pub async fn student_tests(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> EngineResult<Vec<TestSummary>> {
        let tests = self.store.student_tests(student_id, module_id).await?;
        Ok(summarize_history(&tests))
    }

    /// Rank students by points from tests finished in `[start, end)`.
    pub async fn leaderboard(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> EngineResult<Vec<StudentPoints>> {
        if start > end {
            return Err(EngineError::Validation(format!(
                "leaderboard start {start} is after end {end}"
            )));
        }
        let tests = self.store.finished_tests(start, end).await?;
        Ok(leaderboard(&tests, limit))
    }
}
