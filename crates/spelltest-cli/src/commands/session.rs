//! Shared plumbing for commands that drive the engine: catalog loading,
//! answer sheets, and replaying a sheet as one test attempt.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use spelltest_core::aggregator::FinishedTest;
use spelltest_core::model::{Answer, Catalog, ModuleId, QuestionId, StudentId};
use spelltest_core::parser;
use spelltest_core::statistics::TestView;
use spelltest_core::traits::OpenEnrollment;
use spelltest_core::{AssessmentEngine, EngineConfig};
use spelltest_store::MemoryStore;

/// A student's answers to one module, keyed by question id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub student_id: StudentId,
    pub module_id: ModuleId,
    #[serde(default)]
    pub answers: Vec<SheetAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetAnswer {
    pub question: QuestionId,
    pub answer: Answer,
}

/// Read an answer sheet. `.json` files are parsed as JSON, anything else
/// as TOML.
pub fn load_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
    }
}

/// Load one catalog file, or every catalog under a directory.
pub fn load_catalogs(path: &Path) -> Result<Vec<Catalog>> {
    let catalogs = if path.is_dir() {
        parser::load_catalog_directory(path)?
    } else {
        vec![parser::parse_catalog(path)?]
    };
    anyhow::ensure!(
        !catalogs.is_empty(),
        "no catalogs found in {}",
        path.display()
    );
    Ok(catalogs)
}

/// The outcome of replaying one answer sheet.
#[derive(Debug, Serialize)]
pub struct Attempt {
    pub finished: FinishedTest,
    pub test: TestView,
    /// Answers that were not accepted, with the reason.
    pub rejected: Vec<String>,
}

/// An engine over an in-memory store loaded with catalogs.
pub struct Session {
    engine: AssessmentEngine,
}

impl Session {
    pub fn new(catalogs: Vec<Catalog>, config: EngineConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let mut seen = HashSet::new();
        for catalog in catalogs {
            let module_id = catalog.module.id;
            if !seen.insert(module_id) {
                tracing::warn!(module_id, "module defined twice; the later catalog wins");
            }
            store
                .load_catalog(catalog)
                .with_context(|| format!("failed to load module {module_id}"))?;
        }

        Ok(Self {
            engine: AssessmentEngine::new(store, Arc::new(OpenEnrollment), config),
        })
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    /// Create a test for the sheet's student, submit every answer
    /// concurrently, and finish it.
    ///
    /// Answers the engine rejects are collected rather than aborting the
    /// attempt. Storage failures still abort.
    pub async fn replay(&self, sheet: &AnswerSheet) -> Result<Attempt> {
        let test = self
            .engine
            .create_test(sheet.student_id, sheet.module_id)
            .await?;
        let view = self.engine.get_test(test.id).await?;
        let slot_for: HashMap<QuestionId, _> = view
            .slots
            .iter()
            .map(|s| (s.question.question_id, s.id))
            .collect();

        let mut rejected = Vec::new();
        let mut answered = HashSet::new();
        let mut submissions = Vec::new();
        for entry in &sheet.answers {
            let Some(&slot_id) = slot_for.get(&entry.question) else {
                rejected.push(format!("question {}: not part of this test", entry.question));
                continue;
            };
            if !answered.insert(entry.question) {
                rejected.push(format!("question {}: answered twice", entry.question));
                continue;
            }
            submissions.push((entry.question, slot_id, entry.answer.clone()));
        }

        let pending = submissions
            .into_iter()
            .map(|(question, slot_id, answer)| async move {
                (question, self.engine.submit_answer(slot_id, answer).await)
            });
        let results = futures::future::join_all(pending).await;

        for (question, result) in results {
            match result {
                Ok(_) => {}
                Err(e) if e.is_caller_error() => rejected.push(format!("question {question}: {e}")),
                Err(e) => return Err(e.into()),
            }
        }

        let finished = self.engine.finish_test(test.id).await?;
        let test = self.engine.get_test(test.id).await?;

        Ok(Attempt {
            finished,
            test,
            rejected,
        })
    }
}
