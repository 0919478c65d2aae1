//! Error types for context operations

use thiserror::Error;

/// Errors during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample capacity {capacity}: must be at least 1 (use no capacity for unbounded)")]
    InvalidSampleCapacity { capacity: usize },

    #[error("invalid section timeout {secs}s: must be a positive, finite number of seconds")]
    InvalidSectionTimeout { secs: f64 },

    #[error("invalid {name}: interval must be at least 1 ms")]
    InvalidInterval { name: &'static str },

    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),

    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors from engine lifecycle operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("background task requires a tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("engine has been disposed")]
    Disposed,
}
