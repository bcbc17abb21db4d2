//! Error types for the rent finder bot.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while fetching or normalizing the listing dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Dataset source {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Dataset body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No record collection at {pointer}")]
    MissingCollection { pointer: String },
}

/// Notify channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Rent bucket construction errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("Bucket list is empty")]
    Empty,

    #[error("Bucket {label} has an empty or inverted range [{lower}, {upper})")]
    EmptyRange { label: String, lower: u32, upper: u32 },

    #[error("Gap between {previous} and {next}: {previous_upper} != {next_lower}")]
    Gap {
        previous: String,
        next: String,
        previous_upper: u32,
        next_lower: u32,
    },

    #[error("Bucket {next} overlaps {previous}")]
    Overlap { previous: String, next: String },

    #[error("Unbounded bucket {label} must be the last one")]
    UnboundedNotLast { label: String },

    #[error("Duplicate bucket label {0}")]
    DuplicateLabel(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
