//! Failure-injecting store wrapper for testing error paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spelltest_core::model::{AnswerSlot, ModuleId, Question, QuestionId, StudentId, Test};
use spelltest_core::traits::AssessmentStore;

use crate::error::StoreError;

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Question,
    ModuleQuestions,
    CreateTest,
    Test,
    UpdateTest,
    Slot,
    TestSlots,
    UpdateSlot,
    StudentTests,
    FinishedTests,
}

impl StoreOp {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOp::Question => "question",
            StoreOp::ModuleQuestions => "module_questions",
            StoreOp::CreateTest => "create_test",
            StoreOp::Test => "test",
            StoreOp::UpdateTest => "update_test",
            StoreOp::Slot => "slot",
            StoreOp::TestSlots => "test_slots",
            StoreOp::UpdateSlot => "update_slot",
            StoreOp::StudentTests => "student_tests",
            StoreOp::FinishedTests => "finished_tests",
        }
    }
}

/// Wraps another store and fails selected operations on demand.
///
/// Calls that are not failing are forwarded to the inner store. Every call
/// is counted, failing or not.
pub struct FaultyStore {
    inner: Arc<dyn AssessmentStore>,
    failing: Mutex<HashSet<StoreOp>>,
    call_count: AtomicU32,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn AssessmentStore>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Make `op` fail until [`FaultyStore::heal`] is called.
    pub fn fail(&self, op: StoreOp) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(op);
    }

    pub fn heal(&self, op: StoreOp) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&op);
    }

    /// Total number of store calls received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&op);
        if failing {
            tracing::debug!(op = op.as_str(), "injecting store failure");
            return Err(StoreError::Injected(op.as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for FaultyStore {
    async fn question(&self, id: QuestionId) -> anyhow::Result<Option<Question>> {
        self.check(StoreOp::Question)?;
        self.inner.question(id).await
    }

    async fn module_questions(&self, module_id: ModuleId) -> anyhow::Result<Vec<Question>> {
        self.check(StoreOp::ModuleQuestions)?;
        self.inner.module_questions(module_id).await
    }

    async fn create_test(&self, test: &Test, slots: &[AnswerSlot]) -> anyhow::Result<()> {
        self.check(StoreOp::CreateTest)?;
        self.inner.create_test(test, slots).await
    }

    async fn test(&self, id: Uuid) -> anyhow::Result<Option<Test>> {
        self.check(StoreOp::Test)?;
        self.inner.test(id).await
    }

    async fn update_test(&self, test: &Test) -> anyhow::Result<()> {
        self.check(StoreOp::UpdateTest)?;
        self.inner.update_test(test).await
    }

    async fn slot(&self, id: Uuid) -> anyhow::Result<Option<AnswerSlot>> {
        self.check(StoreOp::Slot)?;
        self.inner.slot(id).await
    }

    async fn test_slots(&self, test_id: Uuid) -> anyhow::Result<Vec<AnswerSlot>> {
        self.check(StoreOp::TestSlots)?;
        self.inner.test_slots(test_id).await
    }

    async fn update_slot(&self, slot: &AnswerSlot) -> anyhow::Result<()> {
        self.check(StoreOp::UpdateSlot)?;
        self.inner.update_slot(slot).await
    }

    async fn student_tests(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> anyhow::Result<Vec<Test>> {
        self.check(StoreOp::StudentTests)?;
        self.inner.student_tests(student_id, module_id).await
    }

    async fn finished_tests(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Test>> {
        self.check(StoreOp::FinishedTests)?;
        self.inner.finished_tests(start, end).await
    }
}
