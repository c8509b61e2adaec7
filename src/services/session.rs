use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploaderConfig;
use crate::models::{
    FileCandidate, FileSummary, ProcessingResult, SelectedFile, SessionEvent, SessionState,
    UploadProgress,
};
use crate::services::observer::SessionObserver;
use crate::services::storage::ObjectStorage;
use crate::services::strategy::{
    SimulatedUploadStrategy, StorageUploadStrategy, UploadError, UploadStrategy,
};
use crate::utils::validation::{self, ValidationError};

/// Settling pause between the 100% update and the Completed transition.
const SETTLE_DELAY_MS: u64 = 1000;

/// Session-level failures. Entry-guard rejections (`NoFileSelected`,
/// `UploadInProgress`) leave the session state untouched; only `Upload`
/// errors transition the session to `Failed`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no file selected")]
    NoFileSelected,

    #[error("an upload is already in progress")]
    UploadInProgress,

    #[error(transparent)]
    Upload(#[from] UploadError),
}

struct SessionInner {
    state: SessionState,
    file: Option<SelectedFile>,
    result: Option<ProcessingResult>,
}

/// One image's journey through the upload/processing pipeline.
///
/// Holds at most one selected file and drives it Idle → FileSelected →
/// Uploading → Completed/Failed. A single in-progress flag keeps a second
/// `start_upload` from overlapping the running sequence, and a new selection
/// is rejected while one is in flight.
pub struct UploadSession {
    id: Uuid,
    config: UploaderConfig,
    storage: Option<Arc<dyn ObjectStorage>>,
    observer: Arc<dyn SessionObserver>,
    inner: Mutex<SessionInner>,
    upload_in_progress: AtomicBool,
}

impl UploadSession {
    pub fn new(
        config: UploaderConfig,
        storage: Option<Arc<dyn ObjectStorage>>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            storage,
            observer,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                file: None,
                result: None,
            }),
            upload_in_progress: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    /// Summary of the currently selected file, if any.
    pub fn summary(&self) -> Option<FileSummary> {
        self.inner().file.as_ref().map(|f| f.summary())
    }

    /// Result of the last completed run, if the session is Completed.
    pub fn result(&self) -> Option<ProcessingResult> {
        self.inner().result.clone()
    }

    /// Storage path hints for the download-all surface; present only once
    /// the session has completed.
    pub fn path_hints(&self) -> Option<Vec<String>> {
        self.inner().result.as_ref().map(|r| r.path_hints())
    }

    /// Validate and take `candidate` as the session's file, replacing any
    /// previous selection. Rejected while an upload is running.
    pub fn select_file(&self, candidate: FileCandidate) -> Result<FileSummary, SessionError> {
        if self.upload_in_progress.load(Ordering::SeqCst) {
            return Err(SessionError::UploadInProgress);
        }

        validation::validate_candidate(&candidate, self.config.max_file_size)?;
        let mime_type = candidate
            .mime_type
            .parse::<mime::Mime>()
            .map_err(|_| ValidationError::UnsupportedType(candidate.mime_type.clone()))?;

        let file = SelectedFile {
            name: candidate.name,
            mime_type,
            data: candidate.data,
        };
        let summary = file.summary();

        {
            let mut inner = self.inner();
            inner.file = Some(file);
            inner.result = None;
            inner.state = SessionState::FileSelected;
        }

        tracing::info!(
            session = %self.id,
            "📄 Accepted {} ({:.2} MiB)",
            summary.name,
            summary.size_mib
        );
        self.observer.on_event(SessionEvent::FileSelected {
            summary: summary.clone(),
        });

        Ok(summary)
    }

    /// Drive the selected file through the pipeline.
    ///
    /// Rejected when no file is selected or another sequence is already
    /// running; the running sequence is never disturbed. On success the
    /// session is Completed and the four artifacts are returned; on failure
    /// it is Failed with the error message surfaced to the observer.
    pub async fn start_upload(&self) -> Result<ProcessingResult, SessionError> {
        if self.upload_in_progress.swap(true, Ordering::SeqCst) {
            tracing::warn!(session = %self.id, "⏳ Upload already in progress, ignoring start request");
            return Err(SessionError::UploadInProgress);
        }
        let _guard = InProgressGuard {
            flag: &self.upload_in_progress,
        };

        let file = {
            let mut inner = self.inner();
            match inner.file.clone() {
                Some(file) => {
                    inner.state = SessionState::Uploading;
                    file
                }
                None => return Err(SessionError::NoFileSelected),
            }
        };

        let object_key = object_key(&file, Utc::now());
        tracing::info!(
            session = %self.id,
            "🚀 Starting upload of {} as {}",
            file.name,
            object_key
        );
        self.emit_progress("Uploading image...", 20);

        match self.run_pipeline(&file, &object_key).await {
            Ok(()) => {
                tokio::time::sleep(self.config.stage_delay(SETTLE_DELAY_MS)).await;

                let result = ProcessingResult::for_object(&object_key);
                {
                    let mut inner = self.inner();
                    inner.state = SessionState::Completed;
                    inner.result = Some(result.clone());
                }

                tracing::info!(session = %self.id, "✅ Pipeline complete for {}", object_key);
                self.observer.on_event(SessionEvent::Completed(result.clone()));
                Ok(result)
            }
            Err(err) => {
                let message = err.to_string();
                self.inner().state = SessionState::Failed;

                tracing::error!(session = %self.id, "❌ Upload failed: {}", message);
                self.observer.on_event(SessionEvent::Failed { message });
                Err(SessionError::Upload(err))
            }
        }
    }

    /// Drop the selection and any displayed results, returning to Idle.
    ///
    /// Never aborts an in-flight transfer (there is no abort wiring); a
    /// sequence already running completes and publishes its outcome.
    pub fn cancel(&self) {
        {
            let mut inner = self.inner();
            inner.file = None;
            inner.result = None;
            inner.state = SessionState::Idle;
        }

        tracing::info!(session = %self.id, "🧹 Selection cleared");
        self.observer.on_event(SessionEvent::Cleared);
    }

    /// Single decision point for which strategy executes, plus the one
    /// permitted fallback when the real path reports its storage as
    /// unavailable. Any other error propagates unchanged.
    async fn run_pipeline(&self, file: &SelectedFile, object_key: &str) -> Result<(), UploadError> {
        let emit = |message: &str, percent: u8| self.emit_progress(message, percent);

        match &self.storage {
            Some(storage) => {
                let real = StorageUploadStrategy::new(Arc::clone(storage), self.config.clone());
                match real.run(file, object_key, &emit).await {
                    Err(UploadError::StorageUnavailable(reason)) => {
                        tracing::warn!(
                            session = %self.id,
                            "⚠️ Storage unavailable ({}), falling back to simulated pipeline",
                            reason
                        );
                        SimulatedUploadStrategy::new(self.config.clone())
                            .run(file, object_key, &emit)
                            .await
                    }
                    other => other,
                }
            }
            None => {
                SimulatedUploadStrategy::new(self.config.clone())
                    .run(file, object_key, &emit)
                    .await
            }
        }
    }

    fn emit_progress(&self, message: &str, percent: u8) {
        self.observer
            .on_event(SessionEvent::Progress(UploadProgress::new(message, percent)));
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-progress flag on every exit path so a failed or rejected
/// run never wedges the session.
struct InProgressGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Object key: `upload_<RFC 3339 timestamp with ':' and '.' replaced by '-'>.<ext>`.
fn object_key(file: &SelectedFile, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("upload_{}.{}", stamp, file.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_object_key_format() {
        let file = SelectedFile {
            name: "holiday photo.PNG".to_string(),
            mime_type: mime::IMAGE_PNG,
            data: Bytes::from_static(b"x"),
        };
        let at = "2026-08-05T12:34:56.789Z".parse::<DateTime<Utc>>().unwrap();

        assert_eq!(object_key(&file, at), "upload_2026-08-05T12-34-56-789Z.png");
    }

    #[test]
    fn test_object_key_without_extension_uses_mime_subtype() {
        let file = SelectedFile {
            name: "snapshot".to_string(),
            mime_type: mime::IMAGE_JPEG,
            data: Bytes::from_static(b"x"),
        };
        let at = "2026-08-05T00:00:00.000Z".parse::<DateTime<Utc>>().unwrap();

        assert_eq!(object_key(&file, at), "upload_2026-08-05T00-00-00-000Z.jpeg");
    }
}
