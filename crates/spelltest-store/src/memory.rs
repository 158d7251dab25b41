//! In-memory store for local runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spelltest_core::model::{
    AnswerSlot, Catalog, Module, ModuleId, Question, QuestionContainer, QuestionId, StudentId, Test,
};
use spelltest_core::traits::{AssessmentStore, SubscriptionPolicy};

use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    modules: HashMap<ModuleId, Module>,
    questions: HashMap<QuestionId, Question>,
    /// Question ids per module, in catalog order.
    module_order: HashMap<ModuleId, Vec<QuestionId>>,
    subscriptions: HashSet<(StudentId, ModuleId)>,
    tests: HashMap<Uuid, Test>,
    slots: HashMap<Uuid, AnswerSlot>,
}

/// A store that keeps everything in process memory.
///
/// A single mutex guards all tables, so `create_test` inserts a test and
/// its slots atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a module and its questions, replacing earlier definitions.
    ///
    /// Every question is validated first; on error nothing is stored.
    pub fn load_catalog(&self, catalog: Catalog) -> Result<(), StoreError> {
        for question in &catalog.questions {
            question
                .validate()
                .map_err(|e| StoreError::InvalidCatalog(e.to_string()))?;
        }

        let module_id = catalog.module.id;
        let mut inner = self.lock();
        inner.modules.insert(module_id, catalog.module);
        for question in catalog.questions {
            Self::put_question(&mut inner, question);
        }
        tracing::debug!(module_id, "loaded catalog");
        Ok(())
    }

    /// Insert or replace a single question definition.
    pub fn upsert_question(&self, question: Question) -> Result<(), StoreError> {
        question
            .validate()
            .map_err(|e| StoreError::InvalidCatalog(e.to_string()))?;
        Self::put_question(&mut self.lock(), question);
        Ok(())
    }

    fn put_question(inner: &mut Inner, question: Question) {
        if let Some(previous) = inner.questions.get(&question.id) {
            if let QuestionContainer::Module(old) = previous.container {
                if let Some(order) = inner.module_order.get_mut(&old) {
                    order.retain(|id| *id != question.id);
                }
            }
        }
        if let QuestionContainer::Module(module_id) = question.container {
            inner
                .module_order
                .entry(module_id)
                .or_default()
                .push(question.id);
        }
        inner.questions.insert(question.id, question);
    }

    /// All registered modules, ordered by id.
    pub fn modules(&self) -> Vec<Module> {
        let mut modules: Vec<Module> = self.lock().modules.values().cloned().collect();
        modules.sort_by_key(|m| m.id);
        modules
    }

    pub fn subscribe(&self, student_id: StudentId, module_id: ModuleId) {
        self.lock().subscriptions.insert((student_id, module_id));
    }

    pub fn unsubscribe(&self, student_id: StudentId, module_id: ModuleId) {
        self.lock().subscriptions.remove(&(student_id, module_id));
    }

    pub fn test_count(&self) -> usize {
        self.lock().tests.len()
    }

    pub fn slot_count(&self) -> usize {
        self.lock().slots.len()
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn question(&self, id: QuestionId) -> anyhow::Result<Option<Question>> {
        Ok(self.lock().questions.get(&id).cloned())
    }

    async fn module_questions(&self, module_id: ModuleId) -> anyhow::Result<Vec<Question>> {
        let inner = self.lock();
        let questions = inner
            .module_order
            .get(&module_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.questions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(questions)
    }

    async fn create_test(&self, test: &Test, slots: &[AnswerSlot]) -> anyhow::Result<()> {
        let mut inner = self.lock();

        if slots.is_empty() {
            return Err(StoreError::EmptyTest(test.id).into());
        }
        if inner.tests.contains_key(&test.id) {
            return Err(StoreError::DuplicateTest(test.id).into());
        }
        for slot in slots {
            if slot.test_id != test.id {
                return Err(StoreError::ForeignSlot {
                    slot: slot.id,
                    owner: slot.test_id,
                    test: test.id,
                }
                .into());
            }
            if inner.slots.contains_key(&slot.id) {
                return Err(StoreError::DuplicateSlot(slot.id).into());
            }
        }

        inner.tests.insert(test.id, test.clone());
        for slot in slots {
            inner.slots.insert(slot.id, slot.clone());
        }
        Ok(())
    }

    async fn test(&self, id: Uuid) -> anyhow::Result<Option<Test>> {
        Ok(self.lock().tests.get(&id).cloned())
    }

    async fn update_test(&self, test: &Test) -> anyhow::Result<()> {
        let mut inner = self.lock();
        let stored = inner
            .tests
            .get_mut(&test.id)
            .ok_or(StoreError::MissingTest(test.id))?;
        *stored = test.clone();
        Ok(())
    }

    async fn slot(&self, id: Uuid) -> anyhow::Result<Option<AnswerSlot>> {
        Ok(self.lock().slots.get(&id).cloned())
    }

    async fn test_slots(&self, test_id: Uuid) -> anyhow::Result<Vec<AnswerSlot>> {
        let inner = self.lock();
        let mut slots: Vec<AnswerSlot> = inner
            .tests
            .get(&test_id)
            .map(|t| {
                t.slot_ids
                    .iter()
                    .filter_map(|id| inner.slots.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        slots.sort_by_key(|s| s.position);
        Ok(slots)
    }

    async fn update_slot(&self, slot: &AnswerSlot) -> anyhow::Result<()> {
        let mut inner = self.lock();
        let stored = inner
            .slots
            .get_mut(&slot.id)
            .ok_or(StoreError::MissingSlot(slot.id))?;
        *stored = slot.clone();
        Ok(())
    }

    async fn student_tests(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> anyhow::Result<Vec<Test>> {
        Ok(self
            .lock()
            .tests
            .values()
            .filter(|t| t.student_id == student_id && t.module_id == module_id)
            .cloned()
            .collect())
    }

    async fn finished_tests(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Test>> {
        Ok(self
            .lock()
            .tests
            .values()
            .filter(|t| {
                t.is_finished()
                    && t.finished_at
                        .is_some_and(|at| start <= at && at < end)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubscriptionPolicy for MemoryStore {
    async fn is_subscribed(
        &self,
        student_id: StudentId,
        module_id: ModuleId,
    ) -> anyhow::Result<bool> {
        Ok(self.lock().subscriptions.contains(&(student_id, module_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelltest_core::model::{Answer, AnswerSpec, QuestionType, TestState};

    fn question(id: QuestionId, module_id: ModuleId) -> Question {
        Question {
            id,
            container: QuestionContainer::Module(module_id),
            text_root: format!("Question {id}"),
            difficulty: 1,
            question_type: QuestionType::TrueFalse,
            answer_spec: AnswerSpec::default(),
            correct_answer: Answer::TrueOrFalse(true),
        }
    }

    fn open_test(slots: usize) -> (Test, Vec<AnswerSlot>) {
        let q = question(1, 1);
        let questions = vec![q; slots];
        spelltest_core::selector::instantiate(5, 1, &questions, Utc::now())
    }

    #[tokio::test]
    async fn module_questions_keep_catalog_order() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            store.upsert_question(question(id, 7)).unwrap();
        }
        store.upsert_question(question(9, 8)).unwrap();

        let ids: Vec<u64> = store
            .module_questions(7)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn moving_a_question_updates_module_lists() {
        let store = MemoryStore::new();
        store.upsert_question(question(1, 7)).unwrap();
        store.upsert_question(question(1, 8)).unwrap();
        assert!(store.module_questions(7).await.unwrap().is_empty());
        assert_eq!(store.module_questions(8).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_question_is_rejected() {
        let store = MemoryStore::new();
        let mut q = question(1, 1);
        q.text_root = String::new();
        assert!(matches!(
            store.upsert_question(q),
            Err(StoreError::InvalidCatalog(_))
        ));
    }

    #[tokio::test]
    async fn create_test_is_all_or_nothing() {
        let store = MemoryStore::new();
        let (test, mut slots) = open_test(3);
        slots[2].test_id = Uuid::new_v4();

        assert!(store.create_test(&test, &slots).await.is_err());
        assert_eq!(store.test_count(), 0);
        assert_eq!(store.slot_count(), 0);
    }

    #[tokio::test]
    async fn create_test_rejects_empty_slot_set() {
        let store = MemoryStore::new();
        let (test, _) = open_test(1);
        let err = store.create_test(&test, &[]).await.unwrap_err();
        assert!(err.to_string().contains("no slots"));
    }

    #[tokio::test]
    async fn slots_come_back_in_position_order() {
        let store = MemoryStore::new();
        let (test, slots) = open_test(4);
        store.create_test(&test, &slots).await.unwrap();

        let positions: Vec<usize> = store
            .test_slots(test.id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn update_unknown_slot_fails() {
        let store = MemoryStore::new();
        let (_, slots) = open_test(1);
        assert!(store.update_slot(&slots[0]).await.is_err());
    }

    #[tokio::test]
    async fn finished_tests_window_is_half_open() {
        let store = MemoryStore::new();
        let (mut test, slots) = open_test(1);
        store.create_test(&test, &slots).await.unwrap();

        let at = Utc::now();
        test.state = TestState::Finished;
        test.finished_at = Some(at);
        store.update_test(&test).await.unwrap();

        let second = chrono::Duration::seconds(1);
        let inside = store.finished_tests(at, at + second).await.unwrap();
        assert_eq!(inside.len(), 1);
        let before = store.finished_tests(at - second, at).await.unwrap();
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn subscriptions_toggle() {
        let store = MemoryStore::new();
        assert!(!store.is_subscribed(1, 2).await.unwrap());
        store.subscribe(1, 2);
        assert!(store.is_subscribed(1, 2).await.unwrap());
        store.unsubscribe(1, 2);
        assert!(!store.is_subscribed(1, 2).await.unwrap());
    }
}
