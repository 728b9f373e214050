//! Worker error types.

use masker_models::FrameIndex;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("core pipeline error: {0}")]
    Core(#[from] masker_core::MaskerError),

    #[error("video error: {0}")]
    Video(#[from] masker_video::VideoError),

    #[error("model error: {0}")]
    Model(#[from] masker_models::ModelError),

    #[error("client error: {0}")]
    Client(#[from] masker_clients::ClientError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("retry exhausted for {operation} after {attempts} attempts: {message}")]
    RetryExhausted { operation: String, attempts: u32, message: String },

    #[error("job cancelled at frame {0}")]
    Cancelled(FrameIndex),
}

impl WorkerError {
    /// Whether retrying the whole job (not a single collaborator call)
    /// could plausibly help.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Client(e) => e.is_retryable(),
            WorkerError::RetryExhausted { .. } => false,
            _ => false,
        }
    }
}
