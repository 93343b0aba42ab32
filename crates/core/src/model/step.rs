use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{IdError, StepId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("step prompt cannot be empty")]
    EmptyPrompt,

    #[error("multiple-choice step needs at least one option")]
    NoOptions,

    #[error("multiple-choice step is missing its correct index")]
    MissingCorrectIndex,

    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("true/false step is missing its expected answer")]
    MissingExpectedAnswer,

    #[error("{kind:?} step carries an answer encoding for the other kind")]
    MixedAnswerEncoding { kind: StepKind },
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The two supported step formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "truefalse")]
    TrueFalse,
}

/// How a step is graded. Exactly one encoding exists per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    TrueFalse {
        expected: bool,
    },
}

impl AnswerKey {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            AnswerKey::MultipleChoice { .. } => StepKind::MultipleChoice,
            AnswerKey::TrueFalse { .. } => StepKind::TrueFalse,
        }
    }

    /// The selection that grades as correct.
    #[must_use]
    pub fn correct_selection(&self) -> Selection {
        match self {
            AnswerKey::MultipleChoice { correct_index, .. } => Selection::Option(*correct_index),
            AnswerKey::TrueFalse { expected } => Selection::Boolean(*expected),
        }
    }

    /// Grades a selection. A selection of the wrong shape is never correct.
    #[must_use]
    pub fn is_correct(&self, selection: Selection) -> bool {
        match (self, selection) {
            (AnswerKey::MultipleChoice { correct_index, .. }, Selection::Option(idx)) => {
                idx == *correct_index
            }
            (AnswerKey::TrueFalse { expected }, Selection::Boolean(value)) => value == *expected,
            _ => false,
        }
    }
}

/// A learner's answer to a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Option(usize),
    Boolean(bool),
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// One quiz question within a lesson. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepDraft", into = "StepDraft")]
pub struct LessonStep {
    id: StepId,
    prompt: String,
    answer: AnswerKey,
    explanation: String,
}

impl LessonStep {
    /// Builds a multiple-choice step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the id or prompt is blank, there are no options,
    /// or `correct_index` does not point at an option.
    pub fn multiple_choice(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, StepError> {
        StepDraft {
            id: id.into(),
            kind: StepKind::MultipleChoice,
            prompt: prompt.into(),
            options: Some(options),
            correct_index: Some(correct_index),
            answer_bool: None,
            explanation: explanation.into(),
        }
        .validate()
    }

    /// Builds a true/false step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the id or prompt is blank.
    pub fn true_false(
        id: impl Into<String>,
        prompt: impl Into<String>,
        expected: bool,
        explanation: impl Into<String>,
    ) -> Result<Self, StepError> {
        StepDraft {
            id: id.into(),
            kind: StepKind::TrueFalse,
            prompt: prompt.into(),
            options: None,
            correct_index: None,
            answer_bool: Some(expected),
            explanation: explanation.into(),
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> &StepId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.answer.kind()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer
    }

    /// Options for a multiple-choice step; empty for true/false.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.answer {
            AnswerKey::MultipleChoice { options, .. } => options,
            AnswerKey::TrueFalse { .. } => &[],
        }
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, selection: Selection) -> bool {
        self.answer.is_correct(selection)
    }
}

/// Unvalidated step as it appears in content files.
///
/// Field names follow the content JSON (`type`, `correctIndex`, `answerBool`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_bool: Option<bool>,
    #[serde(default)]
    pub explanation: String,
}

impl StepDraft {
    /// Checks that the answer encoding matches `kind` and builds the step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` describing the first violated rule.
    pub fn validate(self) -> Result<LessonStep, StepError> {
        let id = StepId::new(self.id)?;
        if self.prompt.trim().is_empty() {
            return Err(StepError::EmptyPrompt);
        }

        let answer = match self.kind {
            StepKind::MultipleChoice => {
                if self.answer_bool.is_some() {
                    return Err(StepError::MixedAnswerEncoding { kind: self.kind });
                }
                let options = self.options.unwrap_or_default();
                if options.is_empty() {
                    return Err(StepError::NoOptions);
                }
                let correct_index = self.correct_index.ok_or(StepError::MissingCorrectIndex)?;
                if correct_index >= options.len() {
                    return Err(StepError::CorrectIndexOutOfRange {
                        index: correct_index,
                        len: options.len(),
                    });
                }
                AnswerKey::MultipleChoice {
                    options,
                    correct_index,
                }
            }
            StepKind::TrueFalse => {
                if self.options.is_some() || self.correct_index.is_some() {
                    return Err(StepError::MixedAnswerEncoding { kind: self.kind });
                }
                let expected = self.answer_bool.ok_or(StepError::MissingExpectedAnswer)?;
                AnswerKey::TrueFalse { expected }
            }
        };

        Ok(LessonStep {
            id,
            prompt: self.prompt,
            answer,
            explanation: self.explanation,
        })
    }
}

impl TryFrom<StepDraft> for LessonStep {
    type Error = StepError;

    fn try_from(draft: StepDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<LessonStep> for StepDraft {
    fn from(step: LessonStep) -> Self {
        let kind = step.kind();
        let (options, correct_index, answer_bool) = match step.answer {
            AnswerKey::MultipleChoice {
                options,
                correct_index,
            } => (Some(options), Some(correct_index), None),
            AnswerKey::TrueFalse { expected } => (None, None, Some(expected)),
        };
        Self {
            id: step.id.into(),
            kind,
            prompt: step.prompt,
            options,
            correct_index,
            answer_bool,
            explanation: step.explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn multiple_choice_grades_by_index() {
        let step = LessonStep::multiple_choice("1-1", "Pick b", options(), 1, "b it is").unwrap();
        assert_eq!(step.kind(), StepKind::MultipleChoice);
        assert!(step.is_correct(Selection::Option(1)));
        assert!(!step.is_correct(Selection::Option(0)));
        assert!(!step.is_correct(Selection::Boolean(true)));
        assert_eq!(step.answer_key().correct_selection(), Selection::Option(1));
    }

    #[test]
    fn true_false_grades_by_value() {
        let step = LessonStep::true_false("1-2", "Sky is blue", true, "").unwrap();
        assert!(step.is_correct(Selection::Boolean(true)));
        assert!(!step.is_correct(Selection::Boolean(false)));
        assert!(!step.is_correct(Selection::Option(0)));
        assert!(step.options().is_empty());
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let err = LessonStep::multiple_choice("1", "Q", options(), 3, "").unwrap_err();
        assert_eq!(err, StepError::CorrectIndexOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn empty_options_and_prompt_are_rejected() {
        assert_eq!(
            LessonStep::multiple_choice("1", "Q", Vec::new(), 0, "").unwrap_err(),
            StepError::NoOptions
        );
        assert_eq!(
            LessonStep::true_false("1", "  ", false, "").unwrap_err(),
            StepError::EmptyPrompt
        );
    }

    #[test]
    fn mixed_encoding_is_rejected() {
        let draft = StepDraft {
            id: "x".into(),
            kind: StepKind::TrueFalse,
            prompt: "Q".into(),
            options: Some(options()),
            correct_index: None,
            answer_bool: Some(true),
            explanation: String::new(),
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            StepError::MixedAnswerEncoding {
                kind: StepKind::TrueFalse
            }
        );
    }

    #[test]
    fn parses_content_json() {
        let raw = r#"[
            {"id": "1-1", "type": "mcq", "prompt": "Q", "options": ["x", "y"], "correctIndex": 0},
            {"id": "1-2", "type": "truefalse", "prompt": "T?", "answerBool": false, "explanation": "no"}
        ]"#;
        let steps: Vec<LessonStep> = serde_json::from_str(raw).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].explanation(), "");
        assert_eq!(steps[1].kind(), StepKind::TrueFalse);
        assert_eq!(steps[1].explanation(), "no");

        let bad = r#"{"id": "1", "type": "mcq", "prompt": "Q", "options": ["x"], "correctIndex": 4}"#;
        assert!(serde_json::from_str::<LessonStep>(bad).is_err());
    }
}
