mod catalog;
mod ids;
mod progress;
mod step;

pub use catalog::{LessonSummary, ModuleSummary};
pub use ids::{IdError, LessonId, ModuleId, StepId};
pub use progress::{AllProgress, LessonProgressRecord, ModuleProgress};
pub use step::{AnswerKey, LessonStep, Selection, StepDraft, StepError, StepKind};
