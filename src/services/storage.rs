use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors.
///
/// `Configuration` is the one recoverable class: the session treats it as
/// "capability unavailable" and falls back to the simulated pipeline.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage configuration error: {0}")]
    Configuration(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Byte-level progress of an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl TransferProgress {
    /// Fraction of the payload transferred so far, in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.bytes_transferred as f64 / self.total_bytes as f64
        }
    }
}

/// Object storage capability. Injected into the session; its absence, or a
/// `Configuration` failure, switches the pipeline to simulation.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store one object under `key`, reporting byte progress as data goes out.
    /// The future resolves once the object is fully stored.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), StorageError>;
}

/// Payloads at or below this go out as a single `PutObject`; larger ones use
/// a multipart upload so progress can be reported per part.
const PART_SIZE: usize = 5 * 1024 * 1024;

/// `ObjectStorage` backed by an S3-compatible service.
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
}

impl S3ObjectStorage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn put_single(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), StorageError> {
        let total_bytes = data.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data));
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        request.send().await.map_err(classify_sdk_error)?;

        on_progress(TransferProgress {
            bytes_transferred: total_bytes,
            total_bytes,
        });
        Ok(())
    }

    async fn put_multipart(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), StorageError> {
        let total_bytes = data.len() as u64;

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(metadata))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::Backend("missing multipart upload id".to_string()))?;

        let mut completed_parts = Vec::new();
        let mut bytes_transferred = 0u64;
        let mut part_number = 1;
        let mut offset = 0;

        while offset < data.len() {
            let end = (offset + PART_SIZE).min(data.len());
            let chunk = data.slice(offset..end);
            let chunk_len = chunk.len() as u64;

            let part = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(chunk))
                .part_number(part_number)
                .send()
                .await
                .map_err(classify_sdk_error)?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(part.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            bytes_transferred += chunk_len;
            on_progress(TransferProgress {
                bytes_transferred,
                total_bytes,
            });

            part_number += 1;
            offset = end;
        }

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        on_progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), StorageError> {
        if data.len() <= PART_SIZE {
            self.put_single(key, data, content_type, metadata, on_progress)
                .await
        } else {
            self.put_multipart(key, data, content_type, metadata, on_progress)
                .await
        }
    }
}

/// Sort an SDK failure into the crate's error classes. Only construction
/// failures count as configuration problems; everything else is fatal to
/// the upload.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ConstructionFailure(_) => StorageError::Configuration(detail),
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => StorageError::Network(detail),
        _ => StorageError::Backend(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_fraction() {
        let half = TransferProgress {
            bytes_transferred: 512,
            total_bytes: 1024,
        };
        assert_eq!(half.fraction(), 0.5);

        let empty = TransferProgress {
            bytes_transferred: 0,
            total_bytes: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
    }
}
