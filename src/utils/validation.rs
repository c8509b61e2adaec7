use thiserror::Error;

use crate::models::FileCandidate;

/// Maximum accepted upload size: 10 MiB
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// MIME types the pipeline accepts
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// Raised synchronously at selection time; never fatal to session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported file type '{0}': only JPG, JPEG or PNG images are accepted")]
    UnsupportedType(String),

    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// Validates the claimed MIME type against the image allowlist.
pub fn validate_mime_type(content_type: &str) -> Result<(), ValidationError> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if ALLOWED_MIME_TYPES
        .iter()
        .any(|&allowed| allowed == normalized)
    {
        return Ok(());
    }

    Err(ValidationError::UnsupportedType(content_type.to_string()))
}

/// Validates file size against the configured limit.
pub fn validate_file_size(size: usize, limit: usize) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::TooLarge { size, limit });
    }
    Ok(())
}

/// Full validation pipeline for a selection candidate.
pub fn validate_candidate(
    candidate: &FileCandidate,
    max_size: usize,
) -> Result<(), ValidationError> {
    validate_mime_type(&candidate.mime_type)?;
    validate_file_size(candidate.byte_size(), max_size)?;
    Ok(())
}
