use quest_core::model::{AnswerKey, ModuleProgress, Selection, StepKind};
use quest_core::scoring::{self, STARTING_LIVES};

use super::session::{AnswerState, LessonSession};

/// How an option should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionHighlight {
    Neutral,
    /// The right answer, shown once the step is answered.
    Correct,
    /// The learner's pick, when it was wrong.
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: String,
    pub selection: Selection,
    pub highlight: OptionHighlight,
}

/// Shown after a step is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub was_correct: bool,
    pub explanation: String,
}

/// Everything needed to draw the active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    /// 1-based position of the step.
    pub step_number: usize,
    pub total_steps: usize,
    pub progress_percent: u8,
    pub lives: u8,
    pub max_lives: u8,
    pub kind: StepKind,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub feedback: Option<Feedback>,
}

impl StepView {
    /// Snapshot of the session's current step. `None` once complete.
    #[must_use]
    pub fn from_session(session: &LessonSession) -> Option<Self> {
        let step = session.current_step()?;
        let answered = match session.answer_state() {
            AnswerState::Unanswered => None,
            AnswerState::Answered {
                selection,
                was_correct,
            } => Some((selection, was_correct)),
        };

        let choices: Vec<(String, Selection)> = match step.answer_key() {
            AnswerKey::MultipleChoice { options, .. } => options
                .iter()
                .enumerate()
                .map(|(idx, label)| (label.clone(), Selection::Option(idx)))
                .collect(),
            AnswerKey::TrueFalse { .. } => vec![
                ("True".to_owned(), Selection::Boolean(true)),
                ("False".to_owned(), Selection::Boolean(false)),
            ],
        };
        let correct = step.answer_key().correct_selection();

        let options = choices
            .into_iter()
            .map(|(label, selection)| {
                let highlight = match answered {
                    None => OptionHighlight::Neutral,
                    Some(_) if selection == correct => OptionHighlight::Correct,
                    Some((picked, _)) if picked == selection => OptionHighlight::Incorrect,
                    Some(_) => OptionHighlight::Neutral,
                };
                OptionView {
                    label,
                    selection,
                    highlight,
                }
            })
            .collect();

        Some(Self {
            step_number: session.cursor() + 1,
            total_steps: session.total_steps(),
            progress_percent: scoring::progress_percent(session.cursor(), session.total_steps()),
            lives: session.lives(),
            max_lives: STARTING_LIVES,
            kind: step.kind(),
            prompt: step.prompt().to_owned(),
            options,
            feedback: answered.map(|(_, was_correct)| Feedback {
                was_correct,
                explanation: step.explanation().to_owned(),
            }),
        })
    }
}

/// Final numbers for a finished lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub xp_award: u32,
    pub correct_count: u32,
    pub total_steps: usize,
    pub lives: u8,
    /// Module progress as stored after this completion.
    pub progress: ModuleProgress,
}

/// What the host should draw for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerView {
    Loading,
    ModuleNotFound,
    UnsupportedModule { module_title: String },
    NoContent,
    Step(StepView),
    Complete(CompletionReport),
    Abandoned,
}
