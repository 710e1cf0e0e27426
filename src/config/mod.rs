//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "booking-pipeline.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "BOOKING_PIPELINE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "BOOKING_PIPELINE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "BOOKING_PIPELINE_LOG";
/// Environment variable selecting the log output format (`json` or `text`).
pub const LOG_FORMAT_ENV_VAR: &str = "BOOKING_PIPELINE_LOG_FORMAT";

/// Legacy environment variable for the queue URL.
pub const QUEUE_URL_ENV_VAR: &str = "SQS_URL";
/// Legacy environment variable for the queue address, used by the producer.
pub const QUEUE_ARN_ENV_VAR: &str = "SQS_ARN";
/// Legacy environment variable for the target bucket.
pub const TARGET_BUCKET_ENV_VAR: &str = "target_bucket_name";
/// Upper-case spelling of [`TARGET_BUCKET_ENV_VAR`].
pub const TARGET_BUCKET_UPPER_ENV_VAR: &str = "TARGET_BUCKET_NAME";

use serde::Deserialize;
use thiserror::Error;

use crate::consumer::{ConsumerConfig, OutputConfig};
use crate::producer::ProducerConfig;
use crate::store::StoreConfig;

/// Configuration errors. All of them are fatal before any queue call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting `{key}` (set {env})")]
    Missing { key: &'static str, env: &'static str },

    #[error("Invalid setting `{key}`: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// AWS client settings shared by the queue and the object store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// AWS region (e.g., "ca-central-1"). Uses default provider chain if not set.
    pub region: Option<String>,
    /// Custom endpoint URL (for LocalStack or testing).
    pub endpoint_url: Option<String>,
}

/// Queue configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue URL or ARN. Required; no default.
    pub url: Option<String>,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS client settings.
    pub aws: AwsConfig,
    /// Queue configuration.
    pub queue: QueueConfig,
    /// Object store configuration.
    pub store: StoreConfig,
    /// Consumer batch settings.
    pub consumer: ConsumerConfig,
    /// Producer settings.
    pub producer: ProducerConfig,
    /// Output object naming.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `booking-pipeline.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    /// 5. Legacy variables `SQS_ARN`, `SQS_URL`, `target_bucket_name`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        // Add config file from path argument if provided
        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        // Add config file from CONFIG_ENV_VAR env var if set
        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            // Environment variables with CONFIG_ENV_PREFIX prefix
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            // Legacy env vars for backwards compatibility; SQS_URL beats SQS_ARN
            .set_override_option("queue.url", env_value(QUEUE_ARN_ENV_VAR))?
            .set_override_option("queue.url", env_value(QUEUE_URL_ENV_VAR))?
            .set_override_option("store.bucket", env_value(TARGET_BUCKET_UPPER_ENV_VAR))?
            .set_override_option("store.bucket", env_value(TARGET_BUCKET_ENV_VAR))?
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }

    /// Queue URL or ARN. Fails if unset or blank.
    pub fn queue_address(&self) -> Result<&str, ConfigError> {
        required(self.queue.url.as_deref()).ok_or(ConfigError::Missing {
            key: "queue.url",
            env: "SQS_URL, SQS_ARN or BOOKING_PIPELINE__QUEUE__URL",
        })
    }

    /// Target bucket. Fails if unset or blank.
    pub fn bucket(&self) -> Result<&str, ConfigError> {
        required(self.store.bucket.as_deref()).ok_or(ConfigError::Missing {
            key: "store.bucket",
            env: "target_bucket_name or BOOKING_PIPELINE__STORE__BUCKET",
        })
    }
}

/// Non-empty value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
