//! Segmentation service collaborator: prompts + video bytes in,
//! per-frame per-object masks out.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// `masks[frame][object]` — PNG-encoded single-channel mask bytes, or
/// `None` where the service reported no mask for that slot.
pub struct SegmentationResponse {
    pub frame_count: u32,
    pub object_count: usize,
    pub masks: Vec<Vec<Option<Vec<u8>>>>,
}

#[async_trait]
pub trait SegmentationClient: Send + Sync {
    async fn segment(
        &self,
        video_bytes: Vec<u8>,
        prompts: &[Vec<[i64; 3]>],
    ) -> ClientResult<SegmentationResponse>;
}

pub struct HttpSegmentationClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSegmentationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct SegmentationWireResponse {
    frame_count: u32,
    masks: Vec<Vec<Option<String>>>,
}

#[async_trait]
impl SegmentationClient for HttpSegmentationClient {
    async fn segment(
        &self,
        video_bytes: Vec<u8>,
        prompts: &[Vec<[i64; 3]>],
    ) -> ClientResult<SegmentationResponse> {
        let video_part = reqwest::multipart::Part::bytes(video_bytes).file_name("video.mp4");
        let prompts_json = serde_json::to_string(prompts).map_err(|e| ClientError::InvalidResponse {
            service: "segmentation".to_string(),
            message: format!("failed to encode prompts: {e}"),
        })?;
        let form = reqwest::multipart::Form::new()
            .part("video", video_part)
            .text("prompts", prompts_json);

        let url = format!("{}/segment-video", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::RemoteTimeout { service: "segmentation".to_string(), elapsed_ms: 0 }
            } else {
                ClientError::RemoteUnavailable { service: "segmentation".to_string(), message: e.to_string() }
            }
        })?;

        if !response.status().is_success() {
            return Err(ClientError::RemoteUnavailable {
                service: "segmentation".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let wire: SegmentationWireResponse = response.json().await.map_err(|e| ClientError::InvalidResponse {
            service: "segmentation".to_string(),
            message: e.to_string(),
        })?;

        let object_count = wire.masks.first().map(Vec::len).unwrap_or(0);
        let masks = wire
            .masks
            .into_iter()
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|encoded| encoded.and_then(|s| base64_decode(&s)))
                    .collect()
            })
            .collect();

        Ok(SegmentationResponse { frame_count: wire.frame_count, object_count, masks })
    }
}

fn base64_decode(s: &str) -> Option<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.decode(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn segment_decodes_base64_masks() {
        let server = MockServer::start().await;
        let encoded = base64::engine::general_purpose::STANDARD.encode([1, 2, 3]);
        let body = serde_json::json!({
            "frame_count": 2,
            "masks": [[serde_json::Value::String(encoded.clone())], [serde_json::Value::Null]],
        });

        Mock::given(method("POST"))
            .and(path("/segment-video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = HttpSegmentationClient::new(server.uri(), Duration::from_secs(5));
        let response = client.segment(vec![0u8; 4], &[vec![[1, 2, 1]]]).await.unwrap();

        assert_eq!(response.frame_count, 2);
        assert_eq!(response.masks[0][0], Some(vec![1, 2, 3]));
        assert_eq!(response.masks[1][0], None);
    }

    #[tokio::test]
    async fn segment_maps_http_error_to_remote_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/segment-video"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpSegmentationClient::new(server.uri(), Duration::from_secs(5));
        let err = client.segment(vec![0u8; 4], &[]).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
