//! Test selection: pick questions for a student attempt and snapshot them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::model::{AnswerSlot, ModuleId, Question, StudentId, Test, TestState};
use crate::policy::ScoringPolicy;
use crate::traits::{AssessmentStore, SubscriptionPolicy};

/// How questions are drawn from a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Upper bound on questions per test. `None` takes every eligible question.
    #[serde(default)]
    pub max_questions: Option<usize>,
    /// Present questions in random order.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn default_shuffle() -> bool {
    true
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_questions: None,
            shuffle: default_shuffle(),
        }
    }
}

/// Draw the questions for one test.
///
/// With `shuffle` the result is a random permutation truncated to the limit.
/// Without it, a random subset is drawn when a limit applies and catalog
/// order is preserved.
pub fn choose_questions<R: Rng + ?Sized>(
    mut questions: Vec<Question>,
    config: &SelectionConfig,
    rng: &mut R,
) -> Vec<Question> {
    let limit = config
        .max_questions
        .filter(|&n| n > 0)
        .unwrap_or(questions.len())
        .min(questions.len());

    if config.shuffle {
        questions.shuffle(rng);
        questions.truncate(limit);
        return questions;
    }

    if limit == questions.len() {
        return questions;
    }

    let mut picked = index::sample(rng, questions.len(), limit).into_vec();
    picked.sort_unstable();
    let mut slots: Vec<Option<Question>> = questions.into_iter().map(Some).collect();
    picked.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// A question can be drawn into a module's test when it belongs to the
/// module and has a scoring policy. Unscorable slots would only inflate the
/// maximum score.
pub fn is_eligible(question: &Question, module_id: ModuleId) -> bool {
    if !question.belongs_to_module(module_id) {
        return false;
    }
    ScoringPolicy::for_type(question.question_type, question.answer_spec.select_mode).is_ok()
}

/// Build an open test and one unanswered slot per question.
pub fn instantiate(
    student_id: StudentId,
    module_id: ModuleId,
    questions: &[Question],
    now: DateTime<Utc>,
) -> (Test, Vec<AnswerSlot>) {
    let test_id = Uuid::new_v4();
    let slots: Vec<AnswerSlot> = questions
        .iter()
        .enumerate()
        .map(|(position, q)| AnswerSlot::new(test_id, position, q.snapshot()))
        .collect();

    let test = Test {
        id: test_id,
        student_id,
        module_id,
        created_at: now,
        finished_at: None,
        state: TestState::Open,
        slot_ids: slots.iter().map(|s| s.id).collect(),
        score: 0.0,
    };

    (test, slots)
}

/// Creates tests for students.
pub struct TestSelector {
    store: Arc<dyn AssessmentStore>,
    subscriptions: Arc<dyn SubscriptionPolicy>,
    config: SelectionConfig,
    rng: Mutex<StdRng>,
}

impl TestSelector {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        subscriptions: Arc<dyn SubscriptionPolicy>,
        config: SelectionConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            subscriptions,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Select questions from the module and persist a new open test.
    pub async fn create_test(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> EngineResult<Test> {
        if !self.subscriptions.is_subscribed(student_id, module_id).await? {
            return Err(EngineError::Forbidden(format!(
                "student {student_id} is not subscribed to module {module_id}"
            )));
        }

        let (eligible, skipped): (Vec<Question>, Vec<Question>) = self
            .store
            .module_questions(module_id)
            .await?
            .into_iter()
            .filter(|q| q.belongs_to_module(module_id))
            .partition(|q| is_eligible(q, module_id));

        if !skipped.is_empty() {
            tracing::warn!(
                module_id,
                skipped = skipped.len(),
                "skipping questions without a scoring policy"
            );
        }

        if eligible.is_empty() {
            return Err(EngineError::not_found("questions for module", module_id));
        }

        let chosen = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            choose_questions(eligible, &self.config, &mut *rng)
        };

        let (test, slots) = instantiate(student_id, module_id, &chosen, Utc::now());
        self.store.create_test(&test, &slots).await?;

        tracing::info!(
            test_id = %test.id,
            student_id,
            module_id,
            "created test with {} questions",
            slots.len()
        );

        Ok(test)
    }
}
