//! Read models over finished and in-progress tests: per-student history
//! and the points leaderboard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AnswerSlot, ModuleId, StudentId, Test, TestState, MAX_SLOT_SCORE};

/// A test with its slots in question order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestView {
    pub test: Test,
    pub slots: Vec<AnswerSlot>,
}

impl TestView {
    /// Number of slots the student has answered so far.
    pub fn answered(&self) -> usize {
        self.slots.iter().filter(|s| s.responded).count()
    }
}

/// One line of a student's history for a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub test_id: Uuid,
    pub module_id: ModuleId,
    pub state: TestState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub question_count: usize,
    /// Aggregate score; zero while the test is still open.
    pub score: f64,
    pub max_score: f64,
}

impl From<&Test> for TestSummary {
    fn from(test: &Test) -> Self {
        Self {
            test_id: test.id,
            module_id: test.module_id,
            state: test.state,
            created_at: test.created_at,
            finished_at: test.finished_at,
            question_count: test.slot_ids.len(),
            score: test.score,
            max_score: MAX_SLOT_SCORE * test.slot_ids.len() as f64,
        }
    }
}

/// Summaries ordered newest first.
pub fn summarize_history(tests: &[Test]) -> Vec<TestSummary> {
    let mut summaries: Vec<TestSummary> = tests.iter().map(TestSummary::from).collect();
    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    summaries
}

/// A student's accumulated points in a leaderboard window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPoints {
    pub student_id: StudentId,
    pub points: f64,
    pub tests_finished: usize,
}

/// Rank students by the sum of their finished-test scores.
///
/// Only finished tests count. Ties are broken by student id so the order is
/// stable.
pub fn leaderboard(tests: &[Test], limit: usize) -> Vec<StudentPoints> {
    let mut per_student: HashMap<StudentId, StudentPoints> = HashMap::new();
    for test in tests.iter().filter(|t| t.is_finished()) {
        let entry = per_student
            .entry(test.student_id)
            .or_insert_with(|| StudentPoints {
                student_id: test.student_id,
                points: 0.0,
                tests_finished: 0,
            });
        entry.points += test.score;
        entry.tests_finished += 1;
    }

    let mut ranked: Vec<StudentPoints> = per_student.into_values().collect();
    ranked.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    ranked.truncate(limit);
    ranked
}
