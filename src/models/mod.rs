use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the pipeline does to every accepted image.
pub const PROCESSING_DESCRIPTION: &str = "Resize to 256×256 + 4 rotations";

/// Output size of every rotation artifact.
pub const OUTPUT_SIZE: &str = "256×256 pixels";

/// The four rotations the pipeline produces, in emission order.
const ROTATIONS: [(u16, &str); 4] = [
    (90, "Clockwise"),
    (180, "Upside Down"),
    (270, "Clockwise"),
    (360, "Original"),
];

/// A file offered for selection, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl FileCandidate {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// The single accepted file a session holds.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: mime::Mime,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Extension used for the generated object key. Falls back to the MIME
    /// subtype when the filename has none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| self.mime_type.subtype().as_str().to_string())
    }

    /// Human-readable summary surfaced to the presentation layer on selection.
    pub fn summary(&self) -> FileSummary {
        let size_mib = (self.byte_size() as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0;
        FileSummary {
            name: self.name.clone(),
            size_mib,
            type_label: self.mime_type.subtype().as_str().to_uppercase(),
            processing: PROCESSING_DESCRIPTION,
        }
    }
}

/// Selected-file metadata for display: name, size in MiB (2 decimals),
/// type label and the fixed processing description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size_mib: f64,
    pub type_label: String,
    pub processing: &'static str,
}

/// One stage update, recomputed on every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadProgress {
    pub message: String,
    pub percent: u8,
    pub at: DateTime<Utc>,
}

impl UploadProgress {
    pub fn new(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent,
            at: Utc::now(),
        }
    }
}

/// One rotated-image result descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationArtifact {
    pub angle_degrees: u16,
    pub label: &'static str,
    pub storage_path_hint: String,
    pub output_size: &'static str,
}

/// Outcome of a successful pipeline run: exactly four artifacts, in angle order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    pub object_key: String,
    pub artifacts: [RotationArtifact; 4],
}

impl ProcessingResult {
    /// The four artifacts the pipeline produces for `object_key`.
    pub fn for_object(object_key: impl Into<String>) -> Self {
        let artifacts = ROTATIONS.map(|(angle, label)| RotationArtifact {
            angle_degrees: angle,
            label,
            storage_path_hint: format!("/augmented-images/{angle}-degree/"),
            output_size: OUTPUT_SIZE,
        });
        Self {
            object_key: object_key.into(),
            artifacts,
        }
    }

    /// Storage path hints for the download-all surface.
    pub fn path_hints(&self) -> Vec<String> {
        self.artifacts
            .iter()
            .map(|a| a.storage_path_hint.clone())
            .collect()
    }
}

/// Lifecycle of a session. One instance per session, owned exclusively by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    FileSelected,
    Uploading,
    Completed,
    Failed,
}

/// Data reported across the presentation boundary. Rendering is up to the
/// observer; the session only constrains what crosses over.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    FileSelected { summary: FileSummary },
    Progress(UploadProgress),
    Completed(ProcessingResult),
    Failed { message: String },
    Cleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_file(name: &str, size: usize) -> SelectedFile {
        SelectedFile {
            name: name.to_string(),
            mime_type: mime::IMAGE_PNG,
            data: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_summary_rounds_to_two_decimals() {
        let summary = png_file("photo.png", 3 * 1024 * 1024).summary();
        assert_eq!(summary.size_mib, 3.0);
        assert_eq!(summary.type_label, "PNG");
        assert_eq!(summary.processing, PROCESSING_DESCRIPTION);

        let summary = png_file("photo.png", 1_500_000).summary();
        assert_eq!(summary.size_mib, 1.43);
    }

    #[test]
    fn test_extension_falls_back_to_mime_subtype() {
        assert_eq!(png_file("photo.PNG", 1).extension(), "png");
        assert_eq!(png_file("archive.tar.png", 1).extension(), "png");
        assert_eq!(png_file("photo", 1).extension(), "png");
    }

    #[test]
    fn test_processing_result_has_four_fixed_artifacts() {
        let result = ProcessingResult::for_object("upload_x.png");

        let angles: Vec<u16> = result.artifacts.iter().map(|a| a.angle_degrees).collect();
        assert_eq!(angles, vec![90, 180, 270, 360]);

        let labels: Vec<&str> = result.artifacts.iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["Clockwise", "Upside Down", "Clockwise", "Original"]);

        assert_eq!(
            result.path_hints(),
            vec![
                "/augmented-images/90-degree/",
                "/augmented-images/180-degree/",
                "/augmented-images/270-degree/",
                "/augmented-images/360-degree/",
            ]
        );
        assert!(result.artifacts.iter().all(|a| a.output_size == OUTPUT_SIZE));
    }

    #[test]
    fn test_session_event_serializes_tagged() {
        let event = SessionEvent::Progress(UploadProgress::new("Uploading image...", 20));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["percent"], 20);
    }
}
