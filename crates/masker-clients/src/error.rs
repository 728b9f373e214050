//! Errors from external collaborator calls.
//!
//! `is_retryable` marks the subset that `masker-worker::retry` will retry
//! (remote unavailability/timeouts); everything else is a fatal, surfaced
//! failure.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} is unavailable: {message}")]
    RemoteUnavailable { service: String, message: String },

    #[error("{service} timed out after {elapsed_ms}ms")]
    RemoteTimeout { service: String, elapsed_ms: u64 },

    #[error("{service} returned an unexpected response: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. } | Self::RemoteTimeout { .. })
    }
}
