pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use config::UploaderConfig;
pub use models::{
    FileCandidate, FileSummary, ProcessingResult, RotationArtifact, SessionEvent, SessionState,
    UploadProgress,
};
pub use services::observer::{LogObserver, NoOpObserver, SessionObserver};
pub use services::session::{SessionError, UploadSession};
pub use services::storage::{ObjectStorage, S3ObjectStorage, StorageError, TransferProgress};
pub use services::strategy::{
    SimulatedUploadStrategy, StorageUploadStrategy, UploadError, UploadStrategy,
};
pub use utils::validation::ValidationError;
