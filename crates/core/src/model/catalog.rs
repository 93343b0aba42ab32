use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, ModuleId};

/// Title card for a lesson inside a module listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
}

/// Metadata for a learning module.
///
/// `gamified` marks modules whose lessons can be played as quizzes; the rest
/// are listed but the player shows an "unsupported" display for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<LessonSummary>,
    #[serde(default)]
    pub gamified: bool,
}

impl ModuleSummary {
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn lesson(&self, lesson_id: &LessonId) -> Option<&LessonSummary> {
        self.lessons.iter().find(|l| &l.id == lesson_id)
    }
}
