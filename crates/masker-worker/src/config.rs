//! Worker configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Default IoU threshold for `BBoxCoalescer`.
    pub iou_threshold: f64,
    /// Default margin fraction for `BBoxRefiner`.
    pub margin_fraction: f64,
    /// Overall job timeout.
    pub job_timeout: Duration,
    /// Per-request timeout for segmentation/openpose HTTP calls.
    pub request_timeout: Duration,
    /// Retry budget for recoverable collaborator errors.
    pub max_retries: u32,
    /// Scratch directory for sub-clips and intermediate output.
    pub work_dir: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.25,
            margin_fraction: 0.1,
            job_timeout: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(120),
            max_retries: 3,
            work_dir: "/tmp/masker".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            iou_threshold: std::env::var("MASKER_IOU_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.25),
            margin_fraction: std::env::var("MASKER_MARGIN_FRACTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
            job_timeout: Duration::from_secs(
                std::env::var("MASKER_JOB_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(3600),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("MASKER_REQUEST_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(120),
            ),
            max_retries: std::env::var("MASKER_MAX_RETRIES").ok().and_then(|s| s.parse().ok()).unwrap_or(3),
            work_dir: std::env::var("MASKER_WORK_DIR").unwrap_or_else(|_| "/tmp/masker".to_string()),
        }
    }
}
