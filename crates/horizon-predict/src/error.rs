//! Error types for Horizon predictors and their external calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for predictor operations.
pub type PredictResult<T> = Result<T, PredictError>;

/// Errors a predictor can report for one model.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Missing or contradictory model parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Not enough history yet; expected while a model warms up.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("algorithm execution failed: {0}")]
    AlgorithmExecution(#[from] RunError),

    #[error("tuning fetch failed: {0}")]
    TuningFetch(#[from] FetchError),

    #[error("invalid result '{value}': {reason}")]
    InvalidResult { value: String, reason: String },

    #[error("computation error: {0}")]
    Computation(String),
}

impl PredictError {
    /// Whether this is the warm-up case rather than a real failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PredictError::InsufficientData(_))
    }
}

/// Failure of an external algorithm invocation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },

    #[error("'{path}' exited with {status}: {stderr}")]
    Exit {
        path: String,
        status: String,
        stderr: String,
    },

    #[error("i/o error talking to '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Failure of a runtime tuning fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed response: {0}")]
    MalformedBody(String),
}
