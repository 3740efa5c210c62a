//! Error types for the NER preprocessing pipeline.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Entity labeler errors.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid multi-word phrase {phrase:?}: {reason}")]
    InvalidPhrase { phrase: String, reason: String },
}

/// Tabular storage errors (CSV rows, labeled corpus files).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column {column} in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Message acquisition errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Request to {method} failed: {reason}")]
    RequestFailed { method: String, reason: String },

    #[error("Telegram API error on {method}: {description}")]
    Api { method: String, description: String },

    #[error("Authentication failed for channel {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("Rate limited on {method}, retry after {retry_after:?}")]
    RateLimited {
        method: String,
        retry_after: Option<Duration>,
    },

    #[error("Media download failed for {file_id}: {reason}")]
    DownloadFailed { file_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// NER oracle errors.
#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("NER request to {model} failed: {reason}")]
    RequestFailed { model: String, reason: String },

    #[error("Invalid response from {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("Model {model} is still loading, estimated {estimated_time:?}")]
    ModelLoading {
        model: String,
        estimated_time: Option<Duration>,
    },
}

/// Batch orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Labeling failed: {0}")]
    Label(#[from] LabelError),

    #[error("Store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Worker task failed: {0}")]
    Join(String),
}
