//! External collaborator interfaces: segmentation, openpose, and local
//! landmark detectors. Every call crosses a process or network boundary;
//! this crate only defines the seam and a thin reqwest-based
//! implementation where the collaborator is remote.

mod error;
mod landmarker;
mod openpose;
mod segmentation;

pub use error::{ClientError, ClientResult};
pub use landmarker::{LandmarkDetection, LandmarkerBackend, LandmarkerBackends, NullLandmarkerBackend};
pub use openpose::{HttpOpenposeClient, OpenposeClient, OpenposeFrame, OpenposeKeypoint};
pub use segmentation::{HttpSegmentationClient, SegmentationClient, SegmentationResponse};
