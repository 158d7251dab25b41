//! Collaborator traits the engine depends on.
//!
//! The engine is storage-backend agnostic. It talks to persistence through
//! [`AssessmentStore`] and asks [`SubscriptionPolicy`] whether a student may
//! take a module's tests. Implementations live in `spelltest-store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{AnswerSlot, ModuleId, Question, QuestionId, StudentId, Test};

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Persistence for questions (read-only), tests and answer slots.
///
/// Failures are reported as `anyhow` errors and surfaced to the engine's
/// caller unchanged; the engine never retries.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Look up a single question.
    async fn question(&self, id: QuestionId) -> anyhow::Result<Option<Question>>;

    /// All questions stored under a module, in catalog order.
    async fn module_questions(&self, module_id: ModuleId) -> anyhow::Result<Vec<Question>>;

    /// Persist a test together with its slots, all or nothing.
    async fn create_test(&self, test: &Test, slots: &[AnswerSlot]) -> anyhow::Result<()>;

    async fn test(&self, id: Uuid) -> anyhow::Result<Option<Test>>;

    async fn update_test(&self, test: &Test) -> anyhow::Result<()>;

    async fn slot(&self, id: Uuid) -> anyhow::Result<Option<AnswerSlot>>;

    /// Slots of a test ordered by position.
    async fn test_slots(&self, test_id: Uuid) -> anyhow::Result<Vec<AnswerSlot>>;

    async fn update_slot(&self, slot: &AnswerSlot) -> anyhow::Result<()>;

    /// A student's tests for one module, in any order.
    async fn student_tests(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> anyhow::Result<Vec<Test>>;

    /// Finished tests whose finalize timestamp falls in `[start, end)`.
    async fn finished_tests(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Test>>;
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Decides whether a student holds a valid subscription to a module.
#[async_trait]
pub trait SubscriptionPolicy: Send + Sync {
    async fn is_subscribed(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> anyhow::Result<bool>;
}

/// Policy that admits every student. Useful for local runs and tests.
pub struct OpenEnrollment;

#[async_trait]
impl SubscriptionPolicy for OpenEnrollment {
    async fn is_subscribed(&self, _: StudentId, _: ModuleId) -> anyhow::Result<bool> {
        Ok(true)
    }
}
