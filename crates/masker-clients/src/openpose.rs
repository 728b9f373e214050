//! Openpose collaborator: posts a sub-clip, gets back per-frame keypoints.
//!
//! Grounded on the original `openpose_client.py`'s `requests.post` to
//! `{base_path}/estimate-pose-on-video` with a multipart `video` field.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub type OpenposeKeypoint = Option<(f64, f64, f64)>;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenposeFrame {
    pub pose_keypoints: Option<Vec<OpenposeKeypoint>>,
    pub face_keypoints: Option<Vec<OpenposeKeypoint>>,
    pub hand_left_keypoints: Option<Vec<OpenposeKeypoint>>,
    pub hand_right_keypoints: Option<Vec<OpenposeKeypoint>>,
}

#[async_trait]
pub trait OpenposeClient: Send + Sync {
    async fn estimate_pose_on_video(&self, video_bytes: Vec<u8>) -> ClientResult<Vec<OpenposeFrame>>;
}

pub struct HttpOpenposeClient {
    base_path: String,
    client: reqwest::Client,
}

impl HttpOpenposeClient {
    pub fn new(base_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_path: base_path.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl OpenposeClient for HttpOpenposeClient {
    async fn estimate_pose_on_video(&self, video_bytes: Vec<u8>) -> ClientResult<Vec<OpenposeFrame>> {
        let part = reqwest::multipart::Part::bytes(video_bytes).file_name("video.mp4");
        let form = reqwest::multipart::Form::new().part("video", part);

        let url = format!("{}/estimate-pose-on-video", self.base_path);
        let response = self.client.post(&url).multipart(form).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::RemoteTimeout { service: "openpose".to_string(), elapsed_ms: 0 }
            } else {
                ClientError::RemoteUnavailable { service: "openpose".to_string(), message: e.to_string() }
            }
        })?;

        if !response.status().is_success() {
            return Err(ClientError::RemoteUnavailable {
                service: "openpose".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response.json().await.map_err(|e| ClientError::InvalidResponse {
            service: "openpose".to_string(),
            message: e.to_string(),
        })
    }
}
