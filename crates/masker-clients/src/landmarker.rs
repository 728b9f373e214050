//! Local landmark detector collaborators (pose/face/hand). These run
//! in-process in the original system (MediaPipe tasks) and are named as
//! external collaborators here too — this crate only defines the seam.

use crate::error::ClientResult;
use async_trait::async_trait;
use opencv::core::Mat;

/// One detection's keypoints, normalized `[0, 1]` within the frame.
/// `visibility` is `Some` for pose landmarks, `None` for face/hand.
#[derive(Debug, Clone, Default)]
pub struct LandmarkDetection {
    pub keypoints: Vec<Option<(f64, f64, Option<f64>)>>,
}

#[async_trait]
pub trait LandmarkerBackend: Send + Sync {
    async fn detect_for_video(&self, frame: &Mat, timestamp_ms: i64) -> ClientResult<Vec<LandmarkDetection>>;
}

/// Always returns no detections. Used for `OverlayStrategy::None` jobs
/// that never need a real backend constructed, and in tests.
#[derive(Default)]
pub struct NullLandmarkerBackend;

#[async_trait]
impl LandmarkerBackend for NullLandmarkerBackend {
    async fn detect_for_video(&self, _frame: &Mat, _timestamp_ms: i64) -> ClientResult<Vec<LandmarkDetection>> {
        Ok(Vec::new())
    }
}

/// One `LandmarkerBackend` per family, resolved once per job based on
/// which strategies were requested.
#[derive(Default)]
pub struct LandmarkerBackends {
    pub pose: Option<std::sync::Arc<dyn LandmarkerBackend>>,
    pub face: Option<std::sync::Arc<dyn LandmarkerBackend>>,
    pub hand: Option<std::sync::Arc<dyn LandmarkerBackend>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_backend_returns_no_detections() {
        let backend = NullLandmarkerBackend;
        let frame = Mat::default();
        let detections = backend.detect_for_video(&frame, 0).await.unwrap();
        assert!(detections.is_empty());
    }
}
