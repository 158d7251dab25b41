//! Scoring policy table.
//!
//! One pure function per scoring rule, plus a closed [`ScoringPolicy`] enum
//! that maps a question to its rule. Adding a question type means adding a
//! policy function and a dispatch arm here; nothing else changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::{
    expected_answer_shape, Answer, QuestionSnapshot, QuestionType, SelectMode, MAX_SLOT_SCORE,
};

/// What the feedback text should convey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackHint {
    Correct,
    Incorrect,
    /// Partially right; this many correct options were not selected.
    Missing(usize),
}

/// Result of applying a policy to one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub is_correct: bool,
    /// Score in `[0, 10]`.
    pub score: f64,
    pub hint: FeedbackHint,
}

impl Outcome {
    fn all_or_nothing(is_correct: bool) -> Self {
        if is_correct {
            Self {
                is_correct: true,
                score: MAX_SLOT_SCORE,
                hint: FeedbackHint::Correct,
            }
        } else {
            Self {
                is_correct: false,
                score: 0.0,
                hint: FeedbackHint::Incorrect,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Policy functions
// ---------------------------------------------------------------------------

/// Exact boolean equality.
pub fn score_true_false(correct: bool, submitted: bool) -> Outcome {
    Outcome::all_or_nothing(correct == submitted)
}

/// Single-select choice. Exactly one option must be submitted, and it must
/// be one of the accepted options.
pub fn score_single_choice(correct: &[String], submitted: &[String]) -> Outcome {
    match submitted {
        [only] => Outcome::all_or_nothing(correct.contains(only)),
        _ => Outcome::all_or_nothing(false),
    }
}

/// Multi-select choice with partial credit.
///
/// Each distinct correct option present in the submission is worth
/// `10 / total_correct`. Extra wrong selections are not penalised.
pub fn score_multiple_choice(correct: &[String], submitted: &[String]) -> Outcome {
    let required: HashSet<&str> = correct.iter().map(String::as_str).collect();
    if required.is_empty() {
        return Outcome::all_or_nothing(false);
    }
    let selected: HashSet<&str> = submitted.iter().map(String::as_str).collect();

    let total = required.len();
    let hits = required.intersection(&selected).count();

    if hits == total {
        return Outcome::all_or_nothing(true);
    }

    let score = MAX_SLOT_SCORE * hits as f64 / total as f64;
    let hint = if hits == 0 {
        FeedbackHint::Incorrect
    } else {
        FeedbackHint::Missing(total - hits)
    };

    Outcome {
        is_correct: false,
        score,
        hint,
    }
}

/// Fill-in-the-gap. Any submitted completion matching any registered
/// variant makes the answer correct.
///
/// The score divides by the number of registered variants, so a correct
/// answer to a question with three variants scores 10/3. This is kept as
/// product behaviour until the partial-credit intent is clarified.
pub fn score_complete_word(correct: &[String], submitted: &[String]) -> Outcome {
    if correct.is_empty() {
        return Outcome::all_or_nothing(false);
    }
    let matched = correct.iter().any(|variant| submitted.contains(variant));
    let score = if matched {
        MAX_SLOT_SCORE / correct.len() as f64
    } else {
        0.0
    };

    Outcome {
        is_correct: matched,
        score,
        hint: if matched {
            FeedbackHint::Correct
        } else {
            FeedbackHint::Incorrect
        },
    }
}

/// Word ordering. The submission must equal the correct sequence position
/// by position; the first mismatch fails the whole answer.
pub fn score_order_word(correct: &[String], submitted: &[String]) -> Outcome {
    if correct.is_empty() || submitted.len() != correct.len() {
        return Outcome::all_or_nothing(false);
    }
    for (expected, given) in correct.iter().zip(submitted) {
        if expected != given {
            return Outcome::all_or_nothing(false);
        }
    }
    Outcome::all_or_nothing(true)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The closed set of scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    TrueFalse,
    SingleChoice,
    MultipleChoice,
    CompleteWord,
    OrderWord,
}

impl ScoringPolicy {
    /// Pick the rule for a question type and select mode.
    pub fn for_type(question_type: QuestionType, select_mode: SelectMode) -> EngineResult<Self> {
        match (question_type, select_mode) {
            (QuestionType::TrueFalse, _) => Ok(ScoringPolicy::TrueFalse),
            (QuestionType::MultiChoiceText, SelectMode::Single) => Ok(ScoringPolicy::SingleChoice),
            (QuestionType::MultiChoiceText, SelectMode::Multiple) => {
                Ok(ScoringPolicy::MultipleChoice)
            }
            (QuestionType::CompleteWord, _) => Ok(ScoringPolicy::CompleteWord),
            (QuestionType::OrderWord, _) => Ok(ScoringPolicy::OrderWord),
            (QuestionType::MultiChoiceAbc, _) => Err(EngineError::UnsupportedQuestionType(
                question_type.to_string(),
            )),
        }
    }

    pub fn for_question(question: &QuestionSnapshot) -> EngineResult<Self> {
        Self::for_type(question.question_type, question.answer_spec.select_mode)
    }

    /// Apply the rule. Fails with a validation error if either payload does
    /// not have the shape the rule expects.
    pub fn score(&self, correct: &Answer, submitted: &Answer) -> EngineResult<Outcome> {
        match (self, correct, submitted) {
            (ScoringPolicy::TrueFalse, Answer::TrueOrFalse(c), Answer::TrueOrFalse(s)) => {
                Ok(score_true_false(*c, *s))
            }
            (ScoringPolicy::SingleChoice, Answer::TextOptions(c), Answer::TextOptions(s)) => {
                Ok(score_single_choice(c, s))
            }
            (ScoringPolicy::MultipleChoice, Answer::TextOptions(c), Answer::TextOptions(s)) => {
                Ok(score_multiple_choice(c, s))
            }
            (ScoringPolicy::CompleteWord, Answer::TextToComplete(c), Answer::TextToComplete(s)) => {
                Ok(score_complete_word(c, s))
            }
            (ScoringPolicy::OrderWord, Answer::TextOptions(c), Answer::TextOptions(s)) => {
                Ok(score_order_word(c, s))
            }
            _ => Err(EngineError::Validation(format!(
                "{self:?} scoring expects {} answers, got correct={} submitted={}",
                self.expected_shape(),
                correct.shape(),
                submitted.shape()
            ))),
        }
    }

    fn expected_shape(&self) -> &'static str {
        match self {
            ScoringPolicy::TrueFalse => expected_answer_shape(QuestionType::TrueFalse),
            ScoringPolicy::SingleChoice | ScoringPolicy::MultipleChoice => {
                expected_answer_shape(QuestionType::MultiChoiceText)
            }
            ScoringPolicy::CompleteWord => expected_answer_shape(QuestionType::CompleteWord),
            ScoringPolicy::OrderWord => expected_answer_shape(QuestionType::OrderWord),
        }
    }
}
