use crate::models::SessionEvent;

/// Presentation-side receiver for session events. Implementations render;
/// the session only reports data across this boundary.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// Observer that drops every event.
pub struct NoOpObserver;

impl SessionObserver for NoOpObserver {
    #[inline(always)]
    fn on_event(&self, _event: SessionEvent) {}
}

/// Observer that narrates the session through `tracing`.
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::FileSelected { summary } => {
                tracing::info!(
                    "📄 Selected {} ({:.2} MiB, {}): {}",
                    summary.name,
                    summary.size_mib,
                    summary.type_label,
                    summary.processing
                );
            }
            SessionEvent::Progress(progress) => {
                tracing::info!(
                    "[{}] {} ({}%)",
                    progress.at.format("%H:%M:%S"),
                    progress.message,
                    progress.percent
                );
            }
            SessionEvent::Completed(result) => {
                tracing::info!(
                    "✅ {} processed into {} rotations",
                    result.object_key,
                    result.artifacts.len()
                );
            }
            SessionEvent::Failed { message } => {
                tracing::error!("❌ Upload failed: {}", message);
            }
            SessionEvent::Cleared => {
                tracing::info!("🧹 Selection cleared");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadProgress;

    #[test]
    fn test_noop_observer_accepts_events() {
        let observer = NoOpObserver;
        observer.on_event(SessionEvent::Cleared);
        observer.on_event(SessionEvent::Progress(UploadProgress::new("x", 20)));
    }
}
