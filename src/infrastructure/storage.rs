use std::sync::Arc;

use aws_sdk_s3::config::Region;
use tracing::info;

use crate::config::UploaderConfig;
use crate::services::storage::{ObjectStorage, S3ObjectStorage};

/// Build the storage capability from config. `None` (no bucket configured)
/// means every upload runs the simulated pipeline.
pub async fn setup_storage(config: &UploaderConfig) -> Option<Arc<dyn ObjectStorage>> {
    let bucket = config.bucket.clone()?;

    info!("☁️  Object storage: bucket {} ({})", bucket, config.region);

    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint.clone());
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    let client = aws_sdk_s3::Client::from_conf(s3_config);
    Some(Arc::new(S3ObjectStorage::new(client, bucket)))
}
