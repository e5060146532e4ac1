//! Error types for the gateway, the reconciler and configuration loading.
//!
//! Read paths never surface these to their callers: loaders log the failure and
//! degrade to an empty collection. Write paths return them so the caller can
//! show the failure and let the user retry.

use std::path::PathBuf;

/// Failure talking to the remote list API.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network, DNS or connection failure.
    #[error("transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot be joined with an endpoint.
    #[error("invalid URL for {endpoint}: {reason}")]
    Url { endpoint: String, reason: String },
}

/// A required field is missing or out of range. Blocks submission client-side.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationGap {
    #[error("description is required")]
    MissingDescription,

    #[error("story points must be between 0 and 10 (got {0})")]
    StoryPointsOutOfRange(u8),

    #[error("estimated time cannot be negative (got {0})")]
    NegativeEstimate(f64),

    #[error("actual time must be a non-negative number of hours (got {0})")]
    InvalidActualTime(f64),
}

/// Why a mutation was not applied to the local store.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationGap),

    /// Marking a task done needs the hours actually spent.
    #[error("task {0} cannot be marked done without an actual time")]
    MissingActualTime(u64),

    #[error("task {0} is not in the local store")]
    NotFound(u64),

    /// The endpoint answered but the payload was unusable.
    #[error("{0} returned no usable payload")]
    EmptyResult(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Configuration file could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Convenience result type for write-path operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
