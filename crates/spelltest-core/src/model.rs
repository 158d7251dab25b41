//! Core data model types for spelltest.
//!
//! Questions are authored elsewhere and read-only to the engine. A [`Test`]
//! is one student's attempt and exclusively owns its [`AnswerSlot`]s, each of
//! which carries an immutable [`QuestionSnapshot`] taken at creation time.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

pub type StudentId = u64;
pub type ModuleId = u64;
pub type QuestionId = u64;

// ---------------------------------------------------------------------------
// Question catalog
// ---------------------------------------------------------------------------

/// The kind of question, which decides the scoring policy that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    TrueFalse,
    MultiChoiceText,
    MultiChoiceAbc,
    CompleteWord,
    OrderWord,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::TrueFalse => "true_false",
            QuestionType::MultiChoiceText => "multi_choice_text",
            QuestionType::MultiChoiceAbc => "multi_choice_abc",
            QuestionType::CompleteWord => "complete_word",
            QuestionType::OrderWord => "order_word",
        }
    }

    /// Whether the question offers a list of options to choose from.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionType::MultiChoiceText | QuestionType::MultiChoiceAbc
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true_false" | "true_or_false" => Ok(QuestionType::TrueFalse),
            "multi_choice_text" => Ok(QuestionType::MultiChoiceText),
            "multi_choice_abc" => Ok(QuestionType::MultiChoiceAbc),
            "complete_word" => Ok(QuestionType::CompleteWord),
            "order_word" => Ok(QuestionType::OrderWord),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// How many options a choice question accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    #[default]
    Single,
    Multiple,
}

impl FromStr for SelectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(SelectMode::Single),
            "multiple" => Ok(SelectMode::Multiple),
            other => Err(format!("select mode must be single or multiple, got: {other}")),
        }
    }
}

/// What the student is shown in order to answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpec {
    /// Single or multiple selection (choice types only).
    #[serde(default)]
    pub select_mode: SelectMode,
    /// Offered options for choice types, or the shuffled words for `order_word`.
    #[serde(default)]
    pub text_options: Vec<String>,
    /// Sentence with a gap for `complete_word`.
    #[serde(default)]
    pub text_to_complete: String,
    /// Optional hint shown to the student.
    #[serde(default)]
    pub hint: String,
}

/// An answer payload, tagged by shape.
///
/// Used both for a question's canonical correct answer and for a student's
/// submission. Serializes as `{"true_or_false": true}`,
/// `{"text_options": [..]}` or `{"text_to_complete": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    TrueOrFalse(bool),
    TextOptions(Vec<String>),
    TextToComplete(Vec<String>),
}

impl Answer {
    /// Name of the payload shape, as it appears on the wire.
    pub fn shape(&self) -> &'static str {
        match self {
            Answer::TrueOrFalse(_) => "true_or_false",
            Answer::TextOptions(_) => "text_options",
            Answer::TextToComplete(_) => "text_to_complete",
        }
    }
}

/// The container a question belongs to. A question lives in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionContainer {
    Module(ModuleId),
    Questionnaire(u64),
}

/// A question definition owned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub container: QuestionContainer,
    /// The prompt shown to the student.
    pub text_root: String,
    #[serde(default)]
    pub difficulty: u8,
    pub question_type: QuestionType,
    #[serde(default)]
    pub answer_spec: AnswerSpec,
    pub correct_answer: Answer,
}

impl Question {
    pub fn belongs_to_module(&self, module_id: ModuleId) -> bool {
        self.container == QuestionContainer::Module(module_id)
    }

    /// Check that the answer spec and correct answer agree with the type.
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |msg: String| -> EngineResult<()> {
            Err(EngineError::Validation(format!("question {}: {msg}", self.id)))
        };

        if self.text_root.trim().is_empty() {
            return fail("the text root cannot be empty".into());
        }

        let expected = expected_answer_shape(self.question_type);
        if self.correct_answer.shape() != expected {
            return fail(format!(
                "{} questions need a {expected} correct answer, got {}",
                self.question_type,
                self.correct_answer.shape()
            ));
        }

        let spec = &self.answer_spec;
        match (self.question_type, &self.correct_answer) {
            (
                QuestionType::MultiChoiceText | QuestionType::MultiChoiceAbc,
                Answer::TextOptions(correct),
            ) => {
                if spec.text_options.is_empty() {
                    return fail("the text options cannot be empty".into());
                }
                if spec.text_options.iter().any(|o| o.trim().is_empty()) {
                    return fail("the text options cannot contain blank entries".into());
                }
                if correct.is_empty() {
                    return fail("the correct answer cannot be empty".into());
                }
                let offered: HashSet<&str> = spec.text_options.iter().map(String::as_str).collect();
                let mut seen = HashSet::new();
                if let Some(repeated) = correct.iter().find(|c| !seen.insert(c.as_str())) {
                    return fail(format!("the correct answer '{repeated}' is listed twice"));
                }
                if let Some(missing) = correct.iter().find(|c| !offered.contains(c.as_str())) {
                    return fail(format!(
                        "the correct answer '{missing}' must be one of the options"
                    ));
                }
            }
            (QuestionType::CompleteWord, Answer::TextToComplete(correct)) => {
                if spec.text_to_complete.trim().is_empty() {
                    return fail("the text to complete cannot be empty".into());
                }
                if correct.is_empty() {
                    return fail("the correct answer cannot be empty".into());
                }
            }
            (QuestionType::OrderWord, Answer::TextOptions(correct)) => {
                if spec.text_options.is_empty() {
                    return fail("the words to order cannot be empty".into());
                }
                if correct.is_empty() {
                    return fail("the correct answer cannot be empty".into());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Copy the answerable fields into an immutable snapshot.
    pub fn snapshot(&self) -> QuestionSnapshot {
        QuestionSnapshot {
            question_id: self.id,
            text_root: self.text_root.clone(),
            difficulty: self.difficulty,
            question_type: self.question_type,
            answer_spec: self.answer_spec.clone(),
            correct_answer: self.correct_answer.clone(),
        }
    }
}

/// The answer shape a question type is evaluated against.
pub fn expected_answer_shape(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::TrueFalse => "true_or_false",
        QuestionType::MultiChoiceText | QuestionType::MultiChoiceAbc | QuestionType::OrderWord => {
            "text_options"
        }
        QuestionType::CompleteWord => "text_to_complete",
    }
}

/// Frozen copy of a question taken when a test is created.
///
/// Later catalog edits never reach a slot that already holds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    pub question_id: QuestionId,
    pub text_root: String,
    pub difficulty: u8,
    pub question_type: QuestionType,
    pub answer_spec: AnswerSpec,
    pub correct_answer: Answer,
}

/// Difficulty band of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl FromStr for ModuleDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(ModuleDifficulty::Easy),
            "medium" => Ok(ModuleDifficulty::Medium),
            "hard" => Ok(ModuleDifficulty::Hard),
            other => Err(format!("difficulty must be easy, medium or hard, got: {other}")),
        }
    }
}

impl fmt::Display for ModuleDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleDifficulty::Easy => write!(f, "easy"),
            ModuleDifficulty::Medium => write!(f, "medium"),
            ModuleDifficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A themed collection of questions authored by a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: ModuleDifficulty,
    /// Points a student can earn by completing the module.
    #[serde(default)]
    pub points_to_earn: u32,
}

/// A module together with its questions, as loaded from a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub module: Module,
    #[serde(default)]
    pub questions: Vec<Question>,
}

// ---------------------------------------------------------------------------
// Test aggregate
// ---------------------------------------------------------------------------

/// Lifecycle of a test. The only transition is `Open -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Open,
    Finished,
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestState::Open => write!(f, "open"),
            TestState::Finished => write!(f, "finished"),
        }
    }
}

/// One student's attempt at a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: Uuid,
    pub student_id: StudentId,
    pub module_id: ModuleId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub state: TestState,
    /// Slot ids in question order. Fixed at creation.
    pub slot_ids: Vec<Uuid>,
    /// Sum of slot scores, set when the test is finished.
    #[serde(default)]
    pub score: f64,
}

impl Test {
    pub fn is_finished(&self) -> bool {
        self.state == TestState::Finished
    }
}

/// One question instance within a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSlot {
    pub id: Uuid,
    pub test_id: Uuid,
    /// Zero-based position within the test.
    pub position: usize,
    pub question: QuestionSnapshot,
    /// The latest submission, if any.
    #[serde(default)]
    pub answer: Option<Answer>,
    pub responded: bool,
    pub is_correct: bool,
    /// Score in `[0, 10]`.
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
}

impl AnswerSlot {
    /// A fresh, unanswered slot.
    pub fn new(test_id: Uuid, position: usize, question: QuestionSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            test_id,
            position,
            question,
            answer: None,
            responded: false,
            is_correct: false,
            score: 0.0,
            feedback: String::new(),
            answered_at: None,
        }
    }
}

/// Highest score a single slot can reach.
pub const MAX_SLOT_SCORE: f64 = 10.0;
