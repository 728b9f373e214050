//! Shared data model for the masking pipeline.
//!
//! Every other crate in the workspace depends on this one and none of
//! its types depend back — newtypes and validating constructors live
//! here so a box, frame index, or strategy string is checked once, at
//! the boundary, instead of at every call site downstream.

mod bbox;
mod error;
mod ids;
mod job;
mod keypoint;
mod strategy;

pub use bbox::{Box, BoxHistory};
pub use error::{ModelError, ModelResult};
pub use ids::{FrameIndex, FrameSize, JobId, ObjectId};
pub use job::JobRequest;
pub use keypoint::{Keypoint, Pose, PoseTrack};
pub use strategy::OverlayStrategy;
