#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, LessonRepository, NotificationRepository, ProgressRepository, SeedOutcome,
    Storage, StorageError,
};
