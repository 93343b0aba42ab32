use std::path::Path;
use std::sync::Arc;

use quest_core::model::{LessonId, ModuleId};
use storage::repository::Storage;

use crate::Clock;
use crate::content::{ContentProvider, StaticCatalog};
use crate::error::AppServicesError;
use crate::player::LessonPlayer;
use crate::progress_service::ProgressService;

/// Assembles the content catalog and progress store for a host.
#[derive(Clone)]
pub struct AppServices {
    content: Arc<dyn ContentProvider>,
    progress: ProgressService,
}

impl AppServices {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage, content: Arc<dyn ContentProvider>) -> Self {
        Self {
            content,
            progress: ProgressService::new(clock, Arc::clone(&storage.blobs)),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// Uses the built-in catalog unless `content_path` points at a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        content_path: Option<&Path>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let catalog = match content_path {
            Some(path) => StaticCatalog::from_path(path)?,
            None => StaticCatalog::builtin()?,
        };
        Ok(Self::new(clock, &storage, Arc::new(catalog)))
    }

    /// In-memory storage with the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Content` if the built-in catalog is invalid.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        let catalog = StaticCatalog::builtin()?;
        Ok(Self::new(clock, &Storage::in_memory(), Arc::new(catalog)))
    }

    #[must_use]
    pub fn content(&self) -> Arc<dyn ContentProvider> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Open a player for one lesson, already loaded.
    #[must_use]
    pub fn open_lesson(&self, module_id: ModuleId, lesson_id: LessonId) -> LessonPlayer {
        LessonPlayer::open(
            self.content.as_ref(),
            self.progress.clone(),
            module_id,
            lesson_id,
        )
    }
}
