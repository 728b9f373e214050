//! Fatal, non-retryable video I/O errors.

use std::path::PathBuf;
use thiserror::Error;

pub type VideoResult<T> = Result<T, VideoError>;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to open video source: {0}")]
    SourceOpenFailed(PathBuf),

    #[error("seek to frame {requested} is out of range (frame count {frame_count})")]
    SeekOutOfRange { requested: u32, frame_count: u32 },

    #[error("failed to open video sink at {0}")]
    SinkOpenFailed(PathBuf),

    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}
