use std::fmt;

use quest_core::model::{LessonStep, Selection};
use quest_core::scoring::{self, STARTING_LIVES};

use crate::error::SessionError;

//
// ─── ANSWER STATE ──────────────────────────────────────────────────────────────
//

/// Whether the current step has been answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Answered {
        selection: Selection,
        was_correct: bool,
    },
}

/// Result of [`LessonSession::submit_answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The step was already answered or the session is over.
    Ignored,
    Answered { was_correct: bool },
}

/// Result of [`LessonSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The current step has not been answered, or the session is over.
    Ignored,
    NextStep,
    /// The last step was passed; the session is now complete.
    Finished { xp_award: u32 },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a lesson's steps.
///
/// Pure state: no storage, no clock. The cursor only moves forward and stops
/// at `total_steps()`, at which point the session is complete. Running out of
/// lives does not end the session.
#[derive(Clone)]
pub struct LessonSession {
    steps: Vec<LessonStep>,
    cursor: usize,
    lives: u8,
    correct_count: u32,
    answer: AnswerState,
}

impl LessonSession {
    /// Start a session over `steps`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if there are no steps.
    pub fn new(steps: Vec<LessonStep>) -> Result<Self, SessionError> {
        if steps.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            steps,
            cursor: 0,
            lives: STARTING_LIVES,
            correct_count: 0,
            answer: AnswerState::Unanswered,
        })
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn lives(&self) -> u8 {
        self.lives
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn answer_state(&self) -> AnswerState {
        self.answer
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// The step under the cursor, or `None` once complete.
    #[must_use]
    pub fn current_step(&self) -> Option<&LessonStep> {
        self.steps.get(self.cursor)
    }

    /// XP the session is worth right now.
    #[must_use]
    pub fn xp_award(&self) -> u32 {
        scoring::xp_award(self.correct_count)
    }

    /// Grade `selection` against the current step.
    ///
    /// Only the first answer to a step counts; later submissions are ignored.
    pub fn submit_answer(&mut self, selection: Selection) -> SubmitOutcome {
        if !matches!(self.answer, AnswerState::Unanswered) {
            return SubmitOutcome::Ignored;
        }
        let Some(step) = self.current_step() else {
            return SubmitOutcome::Ignored;
        };

        let was_correct = step.is_correct(selection);
        if was_correct {
            self.correct_count = self.correct_count.saturating_add(1);
        } else {
            self.lives = scoring::lose_life(self.lives);
        }
        self.answer = AnswerState::Answered {
            selection,
            was_correct,
        };
        SubmitOutcome::Answered { was_correct }
    }

    /// Move past an answered step.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.is_complete() || matches!(self.answer, AnswerState::Unanswered) {
            return AdvanceOutcome::Ignored;
        }

        self.cursor += 1;
        self.answer = AnswerState::Unanswered;

        if self.is_complete() {
            AdvanceOutcome::Finished {
                xp_award: self.xp_award(),
            }
        } else {
            AdvanceOutcome::NextStep
        }
    }
}

impl fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonSession")
            .field("steps_len", &self.steps.len())
            .field("cursor", &self.cursor)
            .field("lives", &self.lives)
            .field("correct_count", &self.correct_count)
            .field("answer", &self.answer)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
