//! OpenCV-backed video source and sink.
//!
//! `VideoSource`/`VideoSink` are the only place in the workspace that
//! touch `opencv::videoio` directly — every other crate reads and
//! writes frames through these two types.

mod error;
mod sink;
mod source;

pub use error::{VideoError, VideoResult};
pub use sink::VideoSink;
pub use source::{VideoInfo, VideoSource};
