#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod error;
pub mod player;
pub mod progress_service;

pub use quest_core::Clock;

pub use app_services::AppServices;
pub use content::{ContentProvider, StaticCatalog};
pub use error::{AppServicesError, ContentError, SessionError};
pub use player::{LessonPlayer, PlayerEvent, PlayerView, Route};
pub use progress_service::{PROGRESS_STORAGE_KEY, ProgressService};
