//! Pipeline-stage errors for coalescing, refining, extraction, aggregation,
//! reprojection, smoothing and compositing.

use masker_models::{FrameIndex, ModelError};
use masker_video::VideoError;
use thiserror::Error;

pub type MaskerResult<T> = Result<T, MaskerError>;

#[derive(Debug, Error)]
pub enum MaskerError {
    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Client(#[from] masker_clients::ClientError),

    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pose collaborator returned {got} frames for a {expected}-frame clip")]
    PoseLengthMismatch { expected: u32, got: u32 },

    #[error("compositing cancelled at frame {0}")]
    Cancelled(FrameIndex),
}
