use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::config::UploaderConfig;
use crate::models::SelectedFile;
use crate::services::storage::{ObjectStorage, StorageError, TransferProgress};

/// Upload/processing failures surfaced by a strategy.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The storage capability is missing or misconfigured. Recovered locally
    /// by falling back to the simulated pipeline; never fatal on its own.
    #[error("object storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("upload failed: {0}")]
    Unknown(String),
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Configuration(msg) => UploadError::StorageUnavailable(msg),
            StorageError::Network(msg) => UploadError::NetworkFailure(msg),
            StorageError::Backend(msg) => UploadError::Unknown(msg),
        }
    }
}

/// Stage sink: strategies report `(message, percent)` pairs through this.
pub type StageFn<'a> = &'a (dyn Fn(&str, u8) + Send + Sync);

/// One way of moving a selected file through the pipeline.
#[async_trait]
pub trait UploadStrategy: Send + Sync {
    async fn run(
        &self,
        file: &SelectedFile,
        object_key: &str,
        emit: StageFn<'_>,
    ) -> Result<(), UploadError>;
}

pub(crate) struct SimulatedStage {
    pub message: &'static str,
    pub percent: u8,
    pub delay_ms: u64,
}

/// The fixed stage table the simulated pipeline walks, in order. Each stage
/// emits its update and then waits out its delay before the next begins.
pub(crate) const SIMULATED_STAGES: [SimulatedStage; 8] = [
    SimulatedStage { message: "Uploading to object storage...", percent: 20, delay_ms: 1000 },
    SimulatedStage { message: "Triggering image processor...", percent: 35, delay_ms: 1500 },
    SimulatedStage { message: "Resizing image to 256×256...", percent: 50, delay_ms: 2000 },
    SimulatedStage { message: "Queuing rotation tasks...", percent: 65, delay_ms: 1000 },
    SimulatedStage { message: "Processing 90° rotation...", percent: 75, delay_ms: 1500 },
    SimulatedStage { message: "Processing 180° rotation...", percent: 85, delay_ms: 1000 },
    SimulatedStage { message: "Processing 270° rotation...", percent: 95, delay_ms: 1000 },
    SimulatedStage { message: "All rotations complete", percent: 100, delay_ms: 500 },
];

/// Walks the fixed stage table with presentation pacing. Runs when no
/// storage capability is configured, or when the real path reports its
/// storage as unavailable.
pub struct SimulatedUploadStrategy {
    config: UploaderConfig,
}

impl SimulatedUploadStrategy {
    pub fn new(config: UploaderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl UploadStrategy for SimulatedUploadStrategy {
    async fn run(
        &self,
        _file: &SelectedFile,
        object_key: &str,
        emit: StageFn<'_>,
    ) -> Result<(), UploadError> {
        tracing::info!("🎭 Running simulated pipeline for {}", object_key);

        for stage in &SIMULATED_STAGES {
            emit(stage.message, stage.percent);
            tokio::time::sleep(self.config.stage_delay(stage.delay_ms)).await;
        }

        Ok(())
    }
}

/// Transfer progress band on the overall percentage scale.
const TRANSFER_BAND_START: u8 = 40;
const TRANSFER_BAND_END: u8 = 70;

/// Waits between the post-upload milestones.
const PROCESSING_TRIGGER_WAIT_MS: u64 = 2000;
const ROTATION_FANOUT_WAIT_MS: u64 = 5000;

/// Marker recorded on every uploaded object.
const SOURCE_MARKER: &str = "augment-uploader";

/// Uploads through the injected storage capability, then narrates the
/// server-side processing milestones.
pub struct StorageUploadStrategy {
    storage: Arc<dyn ObjectStorage>,
    config: UploaderConfig,
}

impl StorageUploadStrategy {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: UploaderConfig) -> Self {
        Self { storage, config }
    }

    /// Map fractional byte progress linearly onto the transfer band.
    fn transfer_percent(progress: TransferProgress) -> u8 {
        let span = (TRANSFER_BAND_END - TRANSFER_BAND_START) as f64;
        let percent = TRANSFER_BAND_START as f64 + progress.fraction() * span;
        (percent.round() as u8).clamp(TRANSFER_BAND_START, TRANSFER_BAND_END)
    }
}

#[async_trait]
impl UploadStrategy for StorageUploadStrategy {
    async fn run(
        &self,
        file: &SelectedFile,
        object_key: &str,
        emit: StageFn<'_>,
    ) -> Result<(), UploadError> {
        let metadata = HashMap::from([
            ("source".to_string(), SOURCE_MARKER.to_string()),
            ("original-filename".to_string(), file.name.clone()),
            (
                "uploaded-at".to_string(),
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ]);

        // No explicit transfer timeout; the storage client default applies.
        tracing::debug!("📡 Transferring {} ({} bytes)", object_key, file.byte_size());

        // Keep the reported percentage monotone even if part callbacks land
        // with equal fractions.
        let high_water = AtomicU8::new(TRANSFER_BAND_START);
        let on_progress = |progress: TransferProgress| {
            let percent =
                Self::transfer_percent(progress).max(high_water.load(Ordering::Relaxed));
            high_water.store(percent, Ordering::Relaxed);
            emit("Uploading image...", percent);
        };

        self.storage
            .put(
                object_key,
                file.data.clone(),
                file.mime_type.as_ref(),
                metadata,
                &on_progress,
            )
            .await?;

        emit("Upload complete, processing started", 75);
        tokio::time::sleep(self.config.stage_delay(PROCESSING_TRIGGER_WAIT_MS)).await;

        emit("Processing in progress...", 85);
        tokio::time::sleep(self.config.stage_delay(ROTATION_FANOUT_WAIT_MS)).await;

        emit("All rotations complete", 100);
        Ok(())
    }
}
