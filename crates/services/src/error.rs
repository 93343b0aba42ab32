//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::{LessonId, ModuleId, StepId};
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading a content catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("module {module_id} is listed more than once")]
    DuplicateModule { module_id: ModuleId },
    #[error("steps given for unknown module {module_id}")]
    UnknownModule { module_id: ModuleId },
    #[error("steps given for lesson {lesson_id} not listed in module {module_id}")]
    UnknownLesson {
        module_id: ModuleId,
        lesson_id: LessonId,
    },
    #[error("step {step_id} appears twice in {module_id}/{lesson_id}")]
    DuplicateStep {
        module_id: ModuleId,
        lesson_id: LessonId,
        step_id: StepId,
    },
    #[error("could not read content file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by the pure lesson session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("lesson has no steps")]
    Empty,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
