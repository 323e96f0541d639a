#![forbid(unsafe_code)]

pub mod app_services;
pub mod engine;
pub mod error;
pub mod learner;
pub mod notification_service;
pub mod observer;
pub mod progress_service;
pub mod sequencer_service;

pub use progression_core::Clock;

pub use app_services::AppServices;
pub use engine::{CommitSummary, ProgressionEngine};
pub use error::{AppServicesError, EngineError, NotificationServiceError};
pub use learner::{LearnerContext, LearnerSummary};
pub use notification_service::{DEFAULT_NOTIFICATION_LIMIT, NotificationService};
pub use observer::{ProgressEvent, ProgressObserver, RecordingObserver};
pub use progress_service::ProgressService;
pub use sequencer_service::SequencerService;
