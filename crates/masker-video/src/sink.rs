//! Video frame sink with RAII-guaranteed flush.

use crate::error::{VideoError, VideoResult};
use opencv::core::{Mat, Size};
use opencv::prelude::{VideoWriterTrait, VideoWriterTraitConst};
use opencv::videoio::VideoWriter;
use std::path::{Path, PathBuf};

/// Wraps `opencv::videoio::VideoWriter`, always encoding `mp4v`. `Drop`
/// releases the underlying writer so the output file is flushed whether
/// the caller finishes normally, returns early on an error, or is
/// cancelled — no explicit `close`/`release` call is required anywhere
/// upstream.
pub struct VideoSink {
    writer: VideoWriter,
}

impl VideoSink {
    pub fn create(path: impl AsRef<Path>, fps: f64, width: u32, height: u32) -> VideoResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_str().unwrap_or("");
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let size = Size::new(width as i32, height as i32);

        let writer = VideoWriter::new(path_str, fourcc, fps, size, true)?;
        if !writer.is_opened()? {
            return Err(VideoError::SinkOpenFailed(PathBuf::from(path)));
        }

        Ok(Self { writer })
    }

    pub fn write_frame(&mut self, frame: &Mat) -> VideoResult<()> {
        self.writer.write(frame)?;
        Ok(())
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if let Err(err) = self.writer.release() {
            tracing::warn!(error = %err, "failed to release video writer");
        }
    }
}
