use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use quest_core::Clock;
use quest_core::model::{AllProgress, LessonId, ModuleId, ModuleProgress};
use storage::repository::BlobStore;

/// Key under which the whole progress mapping is stored.
pub const PROGRESS_STORAGE_KEY: &str = "playwise_progress";

/// Tracks lesson completions and XP per module.
///
/// The mapping of every module's progress is one JSON blob: each read parses
/// it whole and each mutation rewrites it whole. Nothing here returns an
/// error. Missing or unreadable data reads as empty progress, and failed
/// writes are logged and dropped.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    blobs: Arc<dyn BlobStore>,
    key: String,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            clock,
            blobs,
            key: PROGRESS_STORAGE_KEY.to_owned(),
        }
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Every module's progress. Empty if nothing is stored or the blob is corrupt;
    /// a malformed module entry is skipped on its own.
    pub async fn all_progress(&self) -> AllProgress {
        let raw = match self.blobs.get_blob(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return AllProgress::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "progress unreadable, using empty progress");
                return AllProgress::new();
            }
        };

        if raw.trim().is_empty() {
            return AllProgress::new();
        }

        let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding corrupt progress blob");
                return AllProgress::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|(raw_id, value)| match decode_module(&raw_id, value) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(key = %self.key, module = %raw_id, error = %err, "discarding corrupt module progress");
                    None
                }
            })
            .collect()
    }

    /// Progress for one module, or an empty record if there is none.
    pub async fn get_module_progress(&self, module_id: &ModuleId) -> ModuleProgress {
        self.all_progress()
            .await
            .remove(module_id)
            .unwrap_or_default()
    }

    /// Overwrite one module's progress and persist the whole mapping.
    pub async fn set_module_progress(&self, module_id: &ModuleId, progress: ModuleProgress) {
        let mut all = self.all_progress().await;
        all.insert(module_id.clone(), progress);
        self.write_all(&all).await;
    }

    /// Record a finished lesson.
    ///
    /// Marks the lesson completed, keeps the higher of the stored and awarded
    /// XP, stamps `last_played_at` with the clock, recomputes the module total
    /// and persists. Safe to repeat.
    pub async fn mark_lesson_completed(
        &self,
        module_id: &ModuleId,
        lesson_id: &LessonId,
        xp_award: u32,
    ) -> ModuleProgress {
        let mut progress = self.get_module_progress(module_id).await;
        let record = progress.record_completion(lesson_id.clone(), xp_award, self.clock.now());
        debug!(
            module = %module_id,
            lesson = %lesson_id,
            xp_award,
            xp_earned = record.xp_earned,
            "lesson completion recorded"
        );
        self.set_module_progress(module_id, progress.clone()).await;
        progress
    }

    pub async fn get_completed_lesson_count(&self, module_id: &ModuleId) -> usize {
        self.get_module_progress(module_id)
            .await
            .completed_lesson_count()
    }

    pub async fn is_lesson_completed(&self, module_id: &ModuleId, lesson_id: &LessonId) -> bool {
        self.get_module_progress(module_id)
            .await
            .lesson(lesson_id)
            .is_some_and(|l| l.completed)
    }

    /// XP across every module.
    pub async fn overall_xp(&self) -> u32 {
        self.all_progress()
            .await
            .values()
            .fold(0_u32, |sum, m| sum.saturating_add(m.total_xp()))
    }

    /// Forget all recorded progress.
    pub async fn reset(&self) {
        if let Err(err) = self.blobs.delete_blob(&self.key).await {
            warn!(key = %self.key, error = %err, "failed to clear progress");
        }
    }

    async fn write_all(&self, all: &AllProgress) {
        let raw = match serde_json::to_string(all) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to serialize progress");
                return;
            }
        };
        if let Err(err) = self.blobs.put_blob(&self.key, &raw).await {
            warn!(key = %self.key, error = %err, "failed to persist progress");
        }
    }
}

fn decode_module(
    raw_id: &str,
    value: serde_json::Value,
) -> Result<(ModuleId, ModuleProgress), Box<dyn std::error::Error>> {
    let id = ModuleId::new(raw_id)?;
    let progress = serde_json::from_value(value)?;
    Ok((id, progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quest_core::time::{epoch, fixed_clock, fixed_now};
    use storage::repository::InMemoryBlobStore;

    fn module() -> ModuleId {
        ModuleId::new("scam-awareness").unwrap()
    }

    fn lesson(raw: &str) -> LessonId {
        LessonId::new(raw).unwrap()
    }

    fn service(store: &InMemoryBlobStore) -> ProgressService {
        ProgressService::new(fixed_clock(), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn missing_progress_is_empty() {
        let store = InMemoryBlobStore::new();
        let progress = service(&store).get_module_progress(&module()).await;
        assert!(progress.is_empty());
        assert_eq!(progress.total_xp(), 0);
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_empty() {
        let store = InMemoryBlobStore::new();
        store
            .put_blob(PROGRESS_STORAGE_KEY, "{not json")
            .await
            .unwrap();
        let svc = service(&store);

        let progress = svc.get_module_progress(&module()).await;
        assert_eq!(progress, ModuleProgress::new());
        assert_eq!(svc.get_completed_lesson_count(&module()).await, 0);
    }

    #[tokio::test]
    async fn corrupt_module_entry_does_not_erase_its_neighbours() {
        let store = InMemoryBlobStore::new();
        let raw = r#"{
            "scam-awareness": {"lessons": {"1": {"completed": true, "xpEarned": 30, "lastPlayedAt": "2024-01-02T03:04:05Z"}}, "totalXp": 30},
            "budgeting-basics": {"lessons": {"1": {"completed": true, "xpEarned": "lots"}}, "totalXp": 5},
            "  ": {"lessons": {}, "totalXp": 0}
        }"#;
        store.put_blob(PROGRESS_STORAGE_KEY, raw).await.unwrap();
        let svc = service(&store);

        let all = svc.all_progress().await;
        assert_eq!(all.len(), 1);
        assert_eq!(svc.get_module_progress(&module()).await.total_xp(), 30);

        let progress = svc.mark_lesson_completed(&module(), &lesson("2"), 10).await;
        assert_eq!(progress.total_xp(), 40);
        assert!(progress.lesson(&lesson("1")).is_some_and(|l| l.completed));
        assert_eq!(svc.overall_xp().await, 40);
    }

    #[tokio::test]
    async fn completion_is_persisted_and_counted() {
        let store = InMemoryBlobStore::new();
        let svc = service(&store);

        let progress = svc.mark_lesson_completed(&module(), &lesson("1"), 20).await;
        let record = progress.lesson(&lesson("1")).unwrap();
        assert!(record.completed);
        assert_eq!(record.xp_earned, 20);
        assert_eq!(record.last_played_at, fixed_now());
        assert_eq!(progress.total_xp(), 20);

        let reloaded = service(&store).get_module_progress(&module()).await;
        assert_eq!(reloaded, progress);
        assert_eq!(svc.get_completed_lesson_count(&module()).await, 1);
        assert!(svc.is_lesson_completed(&module(), &lesson("1")).await);
        assert!(!svc.is_lesson_completed(&module(), &lesson("2")).await);
    }

    #[tokio::test]
    async fn lower_replay_keeps_xp_and_moves_timestamp() {
        let store = InMemoryBlobStore::new();
        service(&store)
            .mark_lesson_completed(&module(), &lesson("1"), 30)
            .await;

        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        let later = clock.now();
        let svc = ProgressService::new(clock, Arc::new(store.clone()));
        let progress = svc.mark_lesson_completed(&module(), &lesson("1"), 10).await;

        let record = progress.lesson(&lesson("1")).unwrap();
        assert_eq!(record.xp_earned, 30);
        assert_eq!(record.last_played_at, later);
    }

    #[tokio::test]
    async fn total_matches_sum_after_each_completion() {
        let store = InMemoryBlobStore::new();
        let svc = service(&store);
        for (id, xp) in [("1", 10), ("2", 20), ("1", 30), ("3", 0)] {
            let progress = svc.mark_lesson_completed(&module(), &lesson(id), xp).await;
            let sum: u32 = progress.lessons().values().map(|l| l.xp_earned).sum();
            assert_eq!(progress.total_xp(), sum);
        }
        assert_eq!(svc.get_module_progress(&module()).await.total_xp(), 50);
        assert_eq!(svc.get_completed_lesson_count(&module()).await, 3);
    }

    #[tokio::test]
    async fn set_module_progress_leaves_other_modules_alone() {
        let store = InMemoryBlobStore::new();
        let svc = service(&store);
        let other = ModuleId::new("budgeting-basics").unwrap();

        svc.mark_lesson_completed(&other, &lesson("1"), 10).await;
        svc.set_module_progress(&module(), ModuleProgress::new())
            .await;

        assert_eq!(svc.get_module_progress(&other).await.total_xp(), 10);
        assert_eq!(svc.all_progress().await.len(), 2);
        assert_eq!(svc.overall_xp().await, 10);
    }

    #[tokio::test]
    async fn reads_blobs_written_by_the_web_client() {
        let store = InMemoryBlobStore::new();
        let raw = r#"{"scam-awareness":{"lessons":{"1":{"completed":true,"xpEarned":30,"lastPlayedAt":"1970-01-01T00:00:00.000Z"}},"totalXp":30}}"#;
        store.put_blob(PROGRESS_STORAGE_KEY, raw).await.unwrap();

        let progress = service(&store).get_module_progress(&module()).await;
        let record = progress.lesson(&lesson("1")).unwrap();
        assert_eq!(record.xp_earned, 30);
        assert_eq!(record.last_played_at, epoch());
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let store = InMemoryBlobStore::new();
        let svc = service(&store);
        svc.mark_lesson_completed(&module(), &lesson("1"), 10).await;
        svc.reset().await;
        assert!(svc.all_progress().await.is_empty());
    }

    #[tokio::test]
    async fn custom_storage_key_is_isolated() {
        let store = InMemoryBlobStore::new();
        let svc = service(&store).with_storage_key("other_key");
        svc.mark_lesson_completed(&module(), &lesson("1"), 10).await;

        assert_eq!(svc.storage_key(), "other_key");
        assert!(store.get_blob(PROGRESS_STORAGE_KEY).await.unwrap().is_none());
        assert!(store.get_blob("other_key").await.unwrap().is_some());
    }
}
