use std::path::PathBuf;
use std::sync::Arc;

use augment_uploader::infrastructure::storage::setup_storage;
use augment_uploader::{FileCandidate, LogObserver, UploadSession, UploaderConfig};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload one image and drive it through the resize + rotation pipeline.
#[derive(Parser, Debug)]
#[command(name = "augment-uploader")]
struct Args {
    /// Image to upload (JPG, JPEG or PNG, up to 10 MiB)
    file: PathBuf,

    /// Target bucket; omit to run the simulated pipeline
    #[arg(long)]
    bucket: Option<String>,

    /// Storage region
    #[arg(long)]
    region: Option<String>,

    /// Force the simulated pipeline even when a bucket is configured
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augment_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = UploaderConfig::from_env();
    if let Some(bucket) = args.bucket {
        config.bucket = Some(bucket);
    }
    if let Some(region) = args.region {
        config.region = region;
    }
    if args.simulate {
        config.bucket = None;
    }

    let data = tokio::fs::read(&args.file).await?;
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime_type = match args
        .file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG.to_string(),
        Some("png") => mime::IMAGE_PNG.to_string(),
        other => anyhow::bail!(
            "unsupported file extension {:?}: only JPG, JPEG or PNG images are accepted",
            other
        ),
    };

    let storage = setup_storage(&config).await;
    if storage.is_none() {
        info!("🎭 No bucket configured, running the simulated pipeline");
    }

    let session = UploadSession::new(config, storage, Arc::new(LogObserver));
    session.select_file(FileCandidate::new(name, mime_type, data))?;
    let result = session.start_upload().await?;

    info!("📦 Results for {}:", result.object_key);
    for artifact in &result.artifacts {
        info!(
            "  {}° {} stored in {} ({})",
            artifact.angle_degrees, artifact.label, artifact.storage_path_hint, artifact.output_size
        );
    }

    Ok(())
}
