use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, ModuleId};
use crate::time::epoch;

/// Every module's progress, keyed by module id. Persisted as one blob.
pub type AllProgress = BTreeMap<ModuleId, ModuleProgress>;

/// Completion state for one lesson of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressRecord {
    pub completed: bool,
    pub xp_earned: u32,
    pub last_played_at: DateTime<Utc>,
}

impl Default for LessonProgressRecord {
    fn default() -> Self {
        Self {
            completed: false,
            xp_earned: 0,
            last_played_at: epoch(),
        }
    }
}

impl LessonProgressRecord {
    /// Applies a completion: marks completed, keeps the best XP, stamps the time.
    #[must_use]
    pub fn completed_with(&self, xp_award: u32, at: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            xp_earned: self.xp_earned.max(xp_award),
            last_played_at: at,
        }
    }
}

/// Per-module progress.
///
/// `total_xp` is derived from `lessons` and recomputed on every mutation and
/// on deserialization, so a stale persisted total never survives a read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ModuleProgressDraft")]
pub struct ModuleProgress {
    lessons: BTreeMap<LessonId, LessonProgressRecord>,
    total_xp: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleProgressDraft {
    #[serde(default)]
    lessons: BTreeMap<LessonId, LessonProgressRecord>,
}

impl From<ModuleProgressDraft> for ModuleProgress {
    fn from(draft: ModuleProgressDraft) -> Self {
        Self::from_lessons(draft.lessons)
    }
}

impl ModuleProgress {
    /// Empty progress: no lessons, zero XP.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_lessons(lessons: BTreeMap<LessonId, LessonProgressRecord>) -> Self {
        let mut progress = Self {
            lessons,
            total_xp: 0,
        };
        progress.recompute_total();
        progress
    }

    #[must_use]
    pub fn lessons(&self) -> &BTreeMap<LessonId, LessonProgressRecord> {
        &self.lessons
    }

    #[must_use]
    pub fn lesson(&self, lesson_id: &LessonId) -> Option<&LessonProgressRecord> {
        self.lessons.get(lesson_id)
    }

    #[must_use]
    pub fn total_xp(&self) -> u32 {
        self.total_xp
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Number of lessons whose record says `completed`.
    #[must_use]
    pub fn completed_lesson_count(&self) -> usize {
        self.lessons.values().filter(|l| l.completed).count()
    }

    /// Records a completion for `lesson_id` and refreshes `total_xp`.
    ///
    /// Replays never lower the recorded XP; they only move `last_played_at`.
    pub fn record_completion(
        &mut self,
        lesson_id: LessonId,
        xp_award: u32,
        at: DateTime<Utc>,
    ) -> &LessonProgressRecord {
        let updated = self
            .lessons
            .get(&lesson_id)
            .cloned()
            .unwrap_or_default()
            .completed_with(xp_award, at);
        self.lessons.insert(lesson_id.clone(), updated);
        self.recompute_total();
        &self.lessons[&lesson_id]
    }

    fn recompute_total(&mut self) {
        self.total_xp = self
            .lessons
            .values()
            .fold(0_u32, |sum, l| sum.saturating_add(l.xp_earned));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn lesson(id: &str) -> LessonId {
        LessonId::new(id).unwrap()
    }

    #[test]
    fn completion_keeps_best_xp_and_refreshes_timestamp() {
        let mut progress = ModuleProgress::new();
        let first = fixed_now();
        progress.record_completion(lesson("1"), 30, first);

        let later = first + Duration::hours(1);
        let record = progress.record_completion(lesson("1"), 10, later).clone();

        assert!(record.completed);
        assert_eq!(record.xp_earned, 30);
        assert_eq!(record.last_played_at, later);
        assert_eq!(progress.total_xp(), 30);
    }

    #[test]
    fn total_is_sum_of_lessons() {
        let mut progress = ModuleProgress::new();
        progress.record_completion(lesson("1"), 20, fixed_now());
        progress.record_completion(lesson("2"), 10, fixed_now());
        progress.record_completion(lesson("2"), 20, fixed_now());

        let sum: u32 = progress.lessons().values().map(|l| l.xp_earned).sum();
        assert_eq!(progress.total_xp(), sum);
        assert_eq!(progress.total_xp(), 40);
        assert_eq!(progress.completed_lesson_count(), 2);
    }

    #[test]
    fn default_record_is_unplayed_at_epoch() {
        let record = LessonProgressRecord::default();
        assert!(!record.completed);
        assert_eq!(record.xp_earned, 0);
        assert_eq!(record.last_played_at, epoch());
    }

    #[test]
    fn deserializing_recomputes_stale_total() {
        let raw = r#"{
            "lessons": {
                "1": {"completed": true, "xpEarned": 20, "lastPlayedAt": "2024-01-01T00:00:00.000Z"},
                "2": {"completed": false, "xpEarned": 5, "lastPlayedAt": "1970-01-01T00:00:00.000Z"}
            },
            "totalXp": 999
        }"#;
        let progress: ModuleProgress = serde_json::from_str(raw).unwrap();
        assert_eq!(progress.total_xp(), 25);
        assert_eq!(progress.completed_lesson_count(), 1);
    }

    #[test]
    fn serializes_persisted_layout() {
        let mut progress = ModuleProgress::new();
        progress.record_completion(lesson("1"), 20, fixed_now());
        let value = serde_json::to_value(&progress).unwrap();

        assert_eq!(value["totalXp"], 20);
        assert_eq!(value["lessons"]["1"]["completed"], true);
        assert_eq!(value["lessons"]["1"]["xpEarned"], 20);
        assert_eq!(value["lessons"]["1"]["lastPlayedAt"], "2023-11-14T22:13:20Z");
    }
}
