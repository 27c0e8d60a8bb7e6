//! Service configuration, read from the environment.
//!
//! The upload directory and the description client are explicit values
//! handed to [`ShapeService`](crate::ShapeService) at construction;
//! nothing in this crate reads the environment after startup.

use std::path::PathBuf;
use std::time::Duration;

use shapetally_export::DEFAULT_JPEG_QUALITY;
use shapetally_pipeline::PipelineConfig;

/// API key for the description service. Unset or empty disables it.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Directory the annotated artifact is written to.
pub const ENV_OUTPUT_DIR: &str = "SHAPETALLY_OUTPUT_DIR";
/// Model name sent to the description service.
pub const ENV_DESCRIBE_MODEL: &str = "SHAPETALLY_DESCRIBE_MODEL";
/// Chat-completions endpoint of the description service.
pub const ENV_DESCRIBE_ENDPOINT: &str = "SHAPETALLY_DESCRIBE_ENDPOINT";
/// Request timeout for the description service, in whole seconds.
pub const ENV_DESCRIBE_TIMEOUT_SECS: &str = "SHAPETALLY_DESCRIBE_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Connection settings for the description service.
#[derive(Clone, PartialEq, Eq)]
pub struct DescriptionConfig {
    /// Bearer token.
    pub api_key: String,
    /// Full chat-completions URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for DescriptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DescriptionConfig {
    /// Default chat-completions endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1/chat/completions";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Settings with default endpoint, model and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Everything a [`ShapeService`](crate::ShapeService) needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Directory the annotated JPEG is written to.
    pub output_dir: PathBuf,
    /// File name of the annotated JPEG inside `output_dir`.
    pub artifact_name: String,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// Detection pipeline parameters.
    pub pipeline: PipelineConfig,
    /// Description service settings; `None` disables descriptions.
    pub description: Option<DescriptionConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
            artifact_name: Self::DEFAULT_ARTIFACT_NAME.to_owned(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            pipeline: PipelineConfig::default(),
            description: None,
        }
    }
}

impl ServiceConfig {
    /// Default artifact directory.
    pub const DEFAULT_OUTPUT_DIR: &'static str = "static/uploads";
    /// Default artifact file name.
    pub const DEFAULT_ARTIFACT_NAME: &'static str = "result.jpg";

    /// Build a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the timeout variable is
    /// not a whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(api_key) = get(ENV_API_KEY) {
            let mut description = DescriptionConfig::new(api_key);
            if let Some(model) = get(ENV_DESCRIBE_MODEL) {
                description.model = model;
            }
            if let Some(endpoint) = get(ENV_DESCRIBE_ENDPOINT) {
                description.endpoint = endpoint;
            }
            if let Some(raw) = get(ENV_DESCRIBE_TIMEOUT_SECS) {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: ENV_DESCRIBE_TIMEOUT_SECS,
                        value: raw.clone(),
                    })?;
                description.timeout = Duration::from_secs(secs);
            }
            config.description = Some(description);
        }

        Ok(config)
    }

    /// Path the artifact is written to.
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(&self.artifact_name)
    }
}
