//! Read-only lesson content: the module catalog and per-lesson quiz steps.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use quest_core::model::{LessonId, LessonStep, ModuleId, ModuleSummary};

use crate::error::ContentError;

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// Supplies module metadata and the ordered steps of a lesson.
///
/// Lookups never fail: unknown ids yield `None` or an empty step list.
pub trait ContentProvider: Send + Sync {
    fn modules(&self) -> &[ModuleSummary];

    fn steps_for_lesson(&self, module_id: &ModuleId, lesson_id: &LessonId) -> Vec<LessonStep>;

    fn module(&self, module_id: &ModuleId) -> Option<&ModuleSummary> {
        self.modules().iter().find(|m| &m.id == module_id)
    }

    /// Whether lessons of this module can be played as quizzes.
    fn supports_play(&self, module_id: &ModuleId) -> bool {
        self.module(module_id).is_some_and(|m| m.gamified)
    }
}

type LessonSteps = BTreeMap<LessonId, Vec<LessonStep>>;

#[derive(Deserialize)]
struct CatalogFile {
    modules: Vec<ModuleSummary>,
    #[serde(default)]
    steps: BTreeMap<ModuleId, LessonSteps>,
}

/// Content held in memory, loaded once from JSON.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    modules: Vec<ModuleSummary>,
    steps: BTreeMap<ModuleId, LessonSteps>,
}

impl StaticCatalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the embedded catalog fails validation.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` for malformed JSON, invalid steps, duplicate
    /// module or step ids, or steps filed under a module or lesson that is not listed.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.modules, file.steps)
    }

    /// Load a catalog document from disk.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` if the file cannot be read, or any error
    /// from [`StaticCatalog::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Build a catalog from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` for duplicate ids, or steps filed under a module
    /// or lesson the module listing does not name.
    pub fn new(
        modules: Vec<ModuleSummary>,
        steps: BTreeMap<ModuleId, LessonSteps>,
    ) -> Result<Self, ContentError> {
        let mut seen = BTreeMap::new();
        for module in &modules {
            if seen.insert(&module.id, module).is_some() {
                return Err(ContentError::DuplicateModule {
                    module_id: module.id.clone(),
                });
            }
        }

        for (module_id, lessons) in &steps {
            let Some(module) = seen.get(module_id) else {
                return Err(ContentError::UnknownModule {
                    module_id: module_id.clone(),
                });
            };
            for (lesson_id, lesson_steps) in lessons {
                if module.lesson(lesson_id).is_none() {
                    return Err(ContentError::UnknownLesson {
                        module_id: module_id.clone(),
                        lesson_id: lesson_id.clone(),
                    });
                }
                let mut step_ids = HashSet::new();
                for step in lesson_steps {
                    if !step_ids.insert(step.id()) {
                        return Err(ContentError::DuplicateStep {
                            module_id: module_id.clone(),
                            lesson_id: lesson_id.clone(),
                            step_id: step.id().clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { modules, steps })
    }
}

impl ContentProvider for StaticCatalog {
    fn modules(&self) -> &[ModuleSummary] {
        &self.modules
    }

    fn steps_for_lesson(&self, module_id: &ModuleId, lesson_id: &LessonId) -> Vec<LessonStep> {
        self.steps
            .get(module_id)
            .and_then(|lessons| lessons.get(lesson_id))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::StepKind;

    fn module_id(raw: &str) -> ModuleId {
        ModuleId::new(raw).unwrap()
    }

    fn lesson_id(raw: &str) -> LessonId {
        LessonId::new(raw).unwrap()
    }

    #[test]
    fn builtin_catalog_loads_scam_lessons() {
        let catalog = StaticCatalog::builtin().unwrap();
        let scam = module_id("scam-awareness");

        assert!(catalog.supports_play(&scam));
        assert!(!catalog.supports_play(&module_id("budgeting-basics")));

        let steps = catalog.steps_for_lesson(&scam, &lesson_id("1"));
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].kind(), StepKind::MultipleChoice);
        assert_eq!(steps[1].kind(), StepKind::TrueFalse);
        assert_eq!(catalog.steps_for_lesson(&scam, &lesson_id("2")).len(), 2);
    }

    #[test]
    fn unknown_ids_yield_empty_steps() {
        let catalog = StaticCatalog::builtin().unwrap();
        assert!(
            catalog
                .steps_for_lesson(&module_id("scam-awareness"), &lesson_id("99"))
                .is_empty()
        );
        assert!(
            catalog
                .steps_for_lesson(&module_id("nope"), &lesson_id("1"))
                .is_empty()
        );
        assert!(catalog.module(&module_id("nope")).is_none());
        assert!(!catalog.supports_play(&module_id("nope")));
    }

    #[test]
    fn duplicate_modules_are_rejected() {
        let raw = r#"{"modules": [
            {"id": "a", "title": "A"},
            {"id": "a", "title": "A again"}
        ]}"#;
        let err = StaticCatalog::from_json(raw).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateModule { .. }));
    }

    #[test]
    fn duplicate_steps_are_rejected() {
        let raw = r#"{
            "modules": [{"id": "a", "title": "A", "gamified": true, "lessons": [{"id": "1", "title": "One"}]}],
            "steps": {"a": {"1": [
                {"id": "s", "type": "truefalse", "prompt": "P", "answerBool": true},
                {"id": "s", "type": "truefalse", "prompt": "Q", "answerBool": false}
            ]}}
        }"#;
        let err = StaticCatalog::from_json(raw).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateStep { .. }));
    }

    #[test]
    fn orphaned_steps_are_rejected() {
        let raw = r#"{
            "modules": [],
            "steps": {"ghost": {"1": []}}
        }"#;
        let err = StaticCatalog::from_json(raw).unwrap_err();
        assert!(matches!(err, ContentError::UnknownModule { .. }));
    }

    #[test]
    fn steps_for_unlisted_lesson_are_rejected() {
        let raw = r#"{
            "modules": [{"id": "a", "title": "A", "gamified": true, "lessons": [{"id": "1", "title": "One"}]}],
            "steps": {"a": {"2": [
                {"id": "s", "type": "truefalse", "prompt": "P", "answerBool": true}
            ]}}
        }"#;
        let err = StaticCatalog::from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            ContentError::UnknownLesson { ref lesson_id, .. } if lesson_id.as_str() == "2"
        ));
    }

    #[test]
    fn invalid_step_fails_parse() {
        let raw = r#"{
            "modules": [{"id": "a", "title": "A"}],
            "steps": {"a": {"1": [{"id": "s", "type": "mcq", "prompt": "P", "options": []}]}}
        }"#;
        assert!(matches!(
            StaticCatalog::from_json(raw).unwrap_err(),
            ContentError::Parse(_)
        ));
    }
}
