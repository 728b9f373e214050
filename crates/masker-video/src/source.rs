//! Sequential, seekable video frame source.

use crate::error::{VideoError, VideoResult};
use masker_models::FrameIndex;
use opencv::core::Mat;
use opencv::prelude::{MatTraitConst, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{
    VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
    CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_FRAMES,
};
use std::path::{Path, PathBuf};

/// Metadata read back from the opened capture, not trusted from the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: u32,
}

/// Wraps `opencv::videoio::VideoCapture` for sequential or seeked reads.
pub struct VideoSource {
    capture: VideoCapture,
    info: VideoInfo,
}

impl VideoSource {
    pub fn open(path: impl AsRef<Path>) -> VideoResult<(Self, VideoInfo)> {
        let path = path.as_ref();
        let path_str = path.to_str().unwrap_or("");

        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|_| VideoError::SourceOpenFailed(PathBuf::from(path)))?;

        if !capture.is_opened().unwrap_or(false) {
            return Err(VideoError::SourceOpenFailed(PathBuf::from(path)));
        }

        let info = VideoInfo {
            width: capture.get(CAP_PROP_FRAME_WIDTH)? as u32,
            height: capture.get(CAP_PROP_FRAME_HEIGHT)? as u32,
            fps: capture.get(CAP_PROP_FPS)?,
            frame_count: capture.get(CAP_PROP_FRAME_COUNT)? as u32,
        };

        Ok((Self { capture, info }, info))
    }

    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Read the next frame in sequence. `None` at end of stream.
    pub fn read_frame(&mut self) -> VideoResult<Option<Mat>> {
        let mut frame = Mat::default();
        let read_ok = self.capture.read(&mut frame)?;
        if !read_ok || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    /// Seek so the next `read_frame` returns the frame at `at`.
    pub fn seek(&mut self, at: FrameIndex) -> VideoResult<()> {
        if at.get() >= self.info.frame_count {
            return Err(VideoError::SeekOutOfRange {
                requested: at.get(),
                frame_count: self.info.frame_count,
            });
        }
        self.capture.set(CAP_PROP_POS_FRAMES, at.get() as f64)?;
        Ok(())
    }
}
