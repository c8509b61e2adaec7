use std::env;
use std::time::Duration;

use crate::utils::validation::MAX_UPLOAD_SIZE;

/// Configuration for the upload pipeline
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Region the target bucket lives in (default: "us-east-1")
    pub region: String,

    /// Target bucket. `None` means no storage capability is available and
    /// every upload runs the simulated pipeline.
    pub bucket: Option<String>,

    /// Custom storage endpoint (e.g. a local MinIO), `None` for the real service
    pub endpoint: Option<String>,

    /// Maximum accepted file size in bytes (default: 10 MiB)
    pub max_file_size: usize,

    /// Multiplier applied to every fixed stage delay. 1.0 keeps the
    /// presentation pacing, 0.0 runs the pipeline without waits.
    pub delay_scale: f32,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: None,
            endpoint: None,
            max_file_size: MAX_UPLOAD_SIZE,
            delay_scale: 1.0,
        }
    }
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            region: env::var("UPLOAD_REGION").unwrap_or(default.region),

            bucket: env::var("UPLOAD_BUCKET").ok().filter(|b| !b.is_empty()),

            endpoint: env::var("UPLOAD_ENDPOINT").ok().filter(|e| !e.is_empty()),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            delay_scale: env::var("STAGE_DELAY_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.delay_scale),
        }
    }

    /// Create config for development and tests (no pacing delays)
    pub fn development() -> Self {
        Self {
            delay_scale: 0.0,
            ..Self::default()
        }
    }

    /// Scale a fixed stage delay according to the configured pacing.
    pub fn stage_delay(&self, millis: u64) -> Duration {
        Duration::from_millis(millis).mul_f32(self.delay_scale.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UploaderConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert!(config.bucket.is_none());
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.stage_delay(1000), Duration::from_millis(1000));
    }

    #[test]
    fn test_development_config() {
        let config = UploaderConfig::development();
        assert_eq!(config.stage_delay(2000), Duration::ZERO);
        assert_eq!(config.stage_delay(500), Duration::ZERO);
    }

    #[test]
    fn test_stage_delay_scaling() {
        let config = UploaderConfig {
            delay_scale: 0.5,
            ..UploaderConfig::default()
        };
        assert_eq!(config.stage_delay(1000), Duration::from_millis(500));

        // Negative scales are treated as zero
        let config = UploaderConfig {
            delay_scale: -1.0,
            ..UploaderConfig::default()
        };
        assert_eq!(config.stage_delay(1000), Duration::ZERO);
    }
}
