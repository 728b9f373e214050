//! Per-object pose aggregation: run the collaborator matching the
//! object's overlay strategy over each of its sub-clips and collect the
//! result into one timeline-aligned `PoseTrack`.

use crate::error::MaskerResult;
use crate::extractor::SubClip;
use masker_clients::{LandmarkerBackends, OpenposeClient, OpenposeFrame};
use masker_models::{Keypoint, OverlayStrategy, Pose, PoseTrack};
use masker_video::VideoSource;
use opencv::imgproc::{cvt_color, COLOR_BGR2RGB};
use opencv::prelude::MatTraitConst;

pub struct PoseAggregator;

impl PoseAggregator {
    pub fn new() -> Self {
        Self
    }

    pub async fn aggregate(
        &self,
        clips: &[SubClip],
        strategy: OverlayStrategy,
        frame_count: u32,
        openpose: &dyn OpenposeClient,
        landmarkers: &LandmarkerBackends,
    ) -> MaskerResult<PoseTrack> {
        match strategy {
            OverlayStrategy::None => Ok(PoseTrack::empty(frame_count)),
            OverlayStrategy::Openpose => self.aggregate_openpose(clips, frame_count, openpose).await,
            OverlayStrategy::LandmarkPose => {
                self.aggregate_landmark(clips, frame_count, landmarkers.pose.as_deref(), |points| {
                    Pose::LandmarkPose(points.into_iter().map(|(x, y, v)| v.map(|v| (Keypoint::new(x, y), v))).collect())
                })
                .await
            }
            OverlayStrategy::LandmarkFace => {
                self.aggregate_landmark(clips, frame_count, landmarkers.face.as_deref(), |points| {
                    Pose::LandmarkFace(points.into_iter().map(|(x, y, _)| Some(Keypoint::new(x, y))).collect())
                })
                .await
            }
            OverlayStrategy::LandmarkHand => {
                self.aggregate_landmark(clips, frame_count, landmarkers.hand.as_deref(), |points| {
                    Pose::LandmarkHand(points.into_iter().map(|(x, y, _)| Some(Keypoint::new(x, y))).collect())
                })
                .await
            }
        }
    }

    async fn aggregate_openpose(
        &self,
        clips: &[SubClip],
        frame_count: u32,
        openpose: &dyn OpenposeClient,
    ) -> MaskerResult<PoseTrack> {
        let mut track = PoseTrack::empty(frame_count);

        // Segments are processed in ascending start order to keep
        // collaborator call ordering deterministic, matching the
        // sequential extraction order.
        let mut ordered: Vec<&SubClip> = clips.iter().collect();
        ordered.sort_by_key(|c| c.start.get());

        for clip in ordered {
            let bytes = tokio::fs::read(&clip.path).await?;
            let frames = openpose.estimate_pose_on_video(bytes).await?;

            let expected = clip.end.get() - clip.start.get();
            if frames.len() as u32 != expected {
                tracing::warn!(
                    object = clip.object.get(),
                    expected,
                    got = frames.len(),
                    "openpose response length mismatch, dropping clip"
                );
                continue;
            }

            for (offset, frame) in frames.into_iter().enumerate() {
                let index = clip.start.get() as usize + offset;
                track.set(index, Some(openpose_frame_to_pose(frame)));
            }
        }

        Ok(track)
    }

    async fn aggregate_landmark(
        &self,
        clips: &[SubClip],
        frame_count: u32,
        backend: Option<&dyn masker_clients::LandmarkerBackend>,
        to_pose: impl Fn(Vec<(f64, f64, Option<f64>)>) -> Pose,
    ) -> MaskerResult<PoseTrack> {
        let mut track = PoseTrack::empty(frame_count);
        let Some(backend) = backend else {
            return Ok(track);
        };

        let mut ordered: Vec<&SubClip> = clips.iter().collect();
        ordered.sort_by_key(|c| c.start.get());

        for clip in ordered {
            let (mut source, info) = VideoSource::open(&clip.path)?;
            let mut offset = 0u32;
            while let Some(frame) = source.read_frame()? {
                let mut rgb = opencv::core::Mat::default();
                cvt_color(&frame, &mut rgb, COLOR_BGR2RGB, 0)?;

                let timestamp_ms = ((offset as f64 / info.fps) * 1000.0) as i64;
                let detections = backend.detect_for_video(&rgb, timestamp_ms).await?;

                if let Some(first) = detections.into_iter().next() {
                    let points = first
                        .keypoints
                        .into_iter()
                        .map(|kp| kp.unwrap_or((0.0, 0.0, None)))
                        .collect();
                    let index = clip.start.get() as usize + offset as usize;
                    track.set(index, Some(to_pose(points)));
                }

                offset += 1;
            }
        }

        Ok(track)
    }
}

impl Default for PoseAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn openpose_frame_to_pose(frame: OpenposeFrame) -> Pose {
    Pose::Openpose {
        pose: frame.pose_keypoints.map(to_confidence_pairs),
        face: frame.face_keypoints.map(to_confidence_pairs),
        left_hand: frame.hand_left_keypoints.map(to_confidence_pairs),
        right_hand: frame.hand_right_keypoints.map(to_confidence_pairs),
    }
}

fn to_confidence_pairs(points: Vec<Option<(f64, f64, f64)>>) -> Vec<Option<(Keypoint, f64)>> {
    points
        .into_iter()
        .map(|point| point.map(|(x, y, confidence)| (Keypoint::new(x, y), confidence)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use masker_clients::ClientResult;
    use masker_models::FrameIndex;

    #[tokio::test]
    async fn none_strategy_returns_all_absent_track() {
        let aggregator = PoseAggregator::new();
        let openpose = StubOpenposeClient { frames: vec![] };
        let landmarkers = LandmarkerBackends::default();

        let track = aggregator.aggregate(&[], OverlayStrategy::None, 10, &openpose, &landmarkers).await.unwrap();

        assert_eq!(track.len(), 10);
        assert!(track.get(0).is_none());
    }

    #[tokio::test]
    async fn mismatched_length_response_is_dropped() {
        let aggregator = PoseAggregator::new();
        let openpose = StubOpenposeClient { frames: vec![OpenposeFrame::default(); 3] };
        let landmarkers = LandmarkerBackends::default();

        let clip = SubClip {
            object: masker_models::ObjectId::new(1).unwrap(),
            start: FrameIndex(0),
            end: FrameIndex(5),
            path: "unused.mp4".into(),
        };

        let track = aggregator
            .aggregate(&[clip], OverlayStrategy::Openpose, 5, &openpose, &landmarkers)
            .await
            .unwrap();

        assert!(track.get(0).is_none());
    }

    struct StubOpenposeClient {
        frames: Vec<OpenposeFrame>,
    }

    #[async_trait]
    impl masker_clients::OpenposeClient for StubOpenposeClient {
        async fn estimate_pose_on_video(&self, _video_bytes: Vec<u8>) -> ClientResult<Vec<OpenposeFrame>> {
            Ok(self.frames.clone())
        }
    }
}
