use std::fmt;

use tracing::{debug, info};

use quest_core::model::{LessonId, ModuleId, Selection};

use super::session::{AdvanceOutcome, LessonSession, SubmitOutcome};
use super::view::{CompletionReport, PlayerView, StepView};
use crate::content::ContentProvider;
use crate::progress_service::ProgressService;

/// Where the host should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    LearningHub,
    ModuleOverview(ModuleId),
}

/// Returned by player transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Stay,
    Navigate(Route),
}

/// Why no session could be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    ModuleNotFound,
    UnsupportedModule { module_title: String },
    NoContent,
}

#[derive(Debug, Clone)]
pub enum PlayerState {
    /// Steps not resolved yet.
    Loading,
    Unavailable(Unavailable),
    InProgress(LessonSession),
    Complete(CompletionReport),
    /// Quit before finishing. Nothing was persisted.
    Abandoned,
}

/// Drives one lesson for one module: resolves content, runs the session and
/// commits progress once when the last step is passed.
pub struct LessonPlayer {
    module_id: ModuleId,
    lesson_id: LessonId,
    progress: ProgressService,
    state: PlayerState,
}

impl LessonPlayer {
    /// A player in the `Loading` state. Call [`LessonPlayer::load`] next.
    #[must_use]
    pub fn new(module_id: ModuleId, lesson_id: LessonId, progress: ProgressService) -> Self {
        Self {
            module_id,
            lesson_id,
            progress,
            state: PlayerState::Loading,
        }
    }

    /// Build and load in one go.
    #[must_use]
    pub fn open(
        content: &dyn ContentProvider,
        progress: ProgressService,
        module_id: ModuleId,
        lesson_id: LessonId,
    ) -> Self {
        let mut player = Self::new(module_id, lesson_id, progress);
        player.load(content);
        player
    }

    /// Resolve the lesson's steps. Only has an effect while `Loading`.
    pub fn load(&mut self, content: &dyn ContentProvider) {
        if !matches!(self.state, PlayerState::Loading) {
            return;
        }

        self.state = match content.module(&self.module_id) {
            None => PlayerState::Unavailable(Unavailable::ModuleNotFound),
            Some(module) if !content.supports_play(&self.module_id) => {
                PlayerState::Unavailable(Unavailable::UnsupportedModule {
                    module_title: module.title.clone(),
                })
            }
            Some(_) => {
                let steps = content.steps_for_lesson(&self.module_id, &self.lesson_id);
                match LessonSession::new(steps) {
                    Ok(session) => PlayerState::InProgress(session),
                    Err(_) => PlayerState::Unavailable(Unavailable::NoContent),
                }
            }
        };

        debug!(
            module = %self.module_id,
            lesson = %self.lesson_id,
            state = self.state_name(),
            "lesson loaded"
        );
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<&LessonSession> {
        match &self.state {
            PlayerState::InProgress(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, PlayerState::Complete(_))
    }

    /// Answer the current step. Ignored unless a step is waiting for an answer.
    pub fn submit_answer(&mut self, selection: Selection) -> SubmitOutcome {
        let PlayerState::InProgress(session) = &mut self.state else {
            return SubmitOutcome::Ignored;
        };
        let outcome = session.submit_answer(selection);
        if let SubmitOutcome::Answered { was_correct } = outcome {
            debug!(
                module = %self.module_id,
                lesson = %self.lesson_id,
                step = session.cursor(),
                was_correct,
                lives = session.lives(),
                "step answered"
            );
        }
        outcome
    }

    /// Move past the answered step.
    ///
    /// Passing the last step awards XP, records the completion and asks the
    /// host to return to the module overview. Ignored unless the current step
    /// has been answered.
    pub async fn advance(&mut self) -> PlayerEvent {
        let PlayerState::InProgress(session) = &mut self.state else {
            return PlayerEvent::Stay;
        };

        let xp_award = match session.advance() {
            AdvanceOutcome::Ignored | AdvanceOutcome::NextStep => return PlayerEvent::Stay,
            AdvanceOutcome::Finished { xp_award } => xp_award,
        };
        let correct_count = session.correct_count();
        let total_steps = session.total_steps();
        let lives = session.lives();

        let progress = self
            .progress
            .mark_lesson_completed(&self.module_id, &self.lesson_id, xp_award)
            .await;
        info!(
            module = %self.module_id,
            lesson = %self.lesson_id,
            xp_award,
            correct_count,
            total_steps,
            module_xp = progress.total_xp(),
            "lesson complete"
        );

        self.state = PlayerState::Complete(CompletionReport {
            xp_award,
            correct_count,
            total_steps,
            lives,
            progress,
        });
        PlayerEvent::Navigate(Route::ModuleOverview(self.module_id.clone()))
    }

    /// Leave the player. Never records progress.
    pub fn quit(&mut self) -> PlayerEvent {
        let route = match &self.state {
            PlayerState::Unavailable(Unavailable::ModuleNotFound) => Route::LearningHub,
            _ => Route::ModuleOverview(self.module_id.clone()),
        };
        if matches!(self.state, PlayerState::Loading | PlayerState::InProgress(_)) {
            debug!(module = %self.module_id, lesson = %self.lesson_id, "lesson abandoned");
            self.state = PlayerState::Abandoned;
        }
        PlayerEvent::Navigate(route)
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        match &self.state {
            PlayerState::Loading => PlayerView::Loading,
            PlayerState::Unavailable(Unavailable::ModuleNotFound) => PlayerView::ModuleNotFound,
            PlayerState::Unavailable(Unavailable::UnsupportedModule { module_title }) => {
                PlayerView::UnsupportedModule {
                    module_title: module_title.clone(),
                }
            }
            PlayerState::Unavailable(Unavailable::NoContent) => PlayerView::NoContent,
            PlayerState::InProgress(session) => {
                StepView::from_session(session).map_or(PlayerView::Loading, PlayerView::Step)
            }
            PlayerState::Complete(report) => PlayerView::Complete(report.clone()),
            PlayerState::Abandoned => PlayerView::Abandoned,
        }
    }

    fn state_name(&self) -> &'static str {
        match &self.state {
            PlayerState::Loading => "loading",
            PlayerState::Unavailable(Unavailable::ModuleNotFound) => "module_not_found",
            PlayerState::Unavailable(Unavailable::UnsupportedModule { .. }) => "unsupported",
            PlayerState::Unavailable(Unavailable::NoContent) => "no_content",
            PlayerState::InProgress(_) => "in_progress",
            PlayerState::Complete(_) => "complete",
            PlayerState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Debug for LessonPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonPlayer")
            .field("module_id", &self.module_id)
            .field("lesson_id", &self.lesson_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
