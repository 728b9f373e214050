//! Translate/scale pose keypoints from the cropped sub-clip's coordinate
//! space back into the original frame's coordinate space.
//!
//! Grounded on `vclip_media::intelligent::mapping::MappingMeta`'s
//! normalize/denormalize pair, generalized from a single letterbox
//! transform to a per-strategy gate over the refined box history.

use masker_models::{BoxHistory, FrameIndex, FrameSize, Keypoint, Pose, PoseTrack};
use masker_models::OverlayStrategy;

const CONFIDENCE_THRESHOLD: f64 = 0.05;

pub struct PoseReprojector;

impl PoseReprojector {
    pub fn new() -> Self {
        Self
    }

    pub fn reproject(
        &self,
        track: &mut PoseTrack,
        strategy: OverlayStrategy,
        refined: &BoxHistory,
        _frame_size: FrameSize,
    ) {
        let frame_count = track.len();
        for index in 0..frame_count {
            let at = FrameIndex(index as u32);
            let Some(bbox) = refined.floor(at) else {
                track.set(index, None);
                continue;
            };

            let Some(pose) = track.get(index).cloned() else {
                continue;
            };

            let reprojected = match (strategy, pose) {
                (OverlayStrategy::Openpose, Pose::Openpose { pose, face, left_hand, right_hand }) => {
                    match pose {
                        None => None,
                        Some(pose) => Some(Pose::Openpose {
                            pose: Some(reproject_openpose_vec(&pose, bbox.x_min as f64, bbox.y_min as f64)),
                            face: face.map(|v| reproject_openpose_vec(&v, bbox.x_min as f64, bbox.y_min as f64)),
                            left_hand: left_hand
                                .map(|v| reproject_openpose_vec(&v, bbox.x_min as f64, bbox.y_min as f64)),
                            right_hand: right_hand
                                .map(|v| reproject_openpose_vec(&v, bbox.x_min as f64, bbox.y_min as f64)),
                        }),
                    }
                }
                (OverlayStrategy::LandmarkPose, Pose::LandmarkPose(points)) => Some(Pose::LandmarkPose(
                    reproject_visibility_gated(&points, bbox.width() as f64, bbox.height() as f64, bbox.x_min as f64, bbox.y_min as f64),
                )),
                (OverlayStrategy::LandmarkFace, Pose::LandmarkFace(points)) => Some(Pose::LandmarkFace(
                    reproject_presence_gated(&points, bbox.width() as f64, bbox.height() as f64, bbox.x_min as f64, bbox.y_min as f64),
                )),
                (OverlayStrategy::LandmarkHand, Pose::LandmarkHand(points)) => Some(Pose::LandmarkHand(
                    reproject_presence_gated(&points, bbox.width() as f64, bbox.height() as f64, bbox.x_min as f64, bbox.y_min as f64),
                )),
                (OverlayStrategy::None, _) | (_, _) => None,
            };

            track.set(index, reprojected);
        }
    }
}

impl Default for PoseReprojector {
    fn default() -> Self {
        Self::new()
    }
}

/// Openpose keypoints: gate on `(x>0 || y>0) && confidence>0.05`, then
/// translate by the crop's top-left corner (already pixel-space, no
/// normalization).
fn reproject_openpose_vec(
    points: &[Option<(Keypoint, f64)>],
    offset_x: f64,
    offset_y: f64,
) -> Vec<Option<(Keypoint, f64)>> {
    points
        .iter()
        .map(|entry| match entry {
            Some((kp, confidence)) if (kp.x > 0.0 || kp.y > 0.0) && *confidence > CONFIDENCE_THRESHOLD => {
                Some((Keypoint::new(kp.x + offset_x, kp.y + offset_y), *confidence))
            }
            _ => None,
        })
        .collect()
}

/// Landmark pose keypoints: same gate but on visibility, and the input
/// coordinates are normalized `[0, 1]` so they are scaled by the crop's
/// width/height before translation.
fn reproject_visibility_gated(
    points: &[Option<(Keypoint, f64)>],
    width: f64,
    height: f64,
    offset_x: f64,
    offset_y: f64,
) -> Vec<Option<(Keypoint, f64)>> {
    points
        .iter()
        .map(|entry| match entry {
            Some((kp, visibility)) if (kp.x > 0.0 || kp.y > 0.0) && *visibility > CONFIDENCE_THRESHOLD => {
                Some((
                    Keypoint::new(kp.x * width + offset_x, kp.y * height + offset_y),
                    *visibility,
                ))
            }
            _ => None,
        })
        .collect()
}

/// Landmark face/hand keypoints: only the `(x>0 || y>0)` presence gate,
/// same normalized-to-pixel scaling, no confidence threshold.
fn reproject_presence_gated(
    points: &[Option<Keypoint>],
    width: f64,
    height: f64,
    offset_x: f64,
    offset_y: f64,
) -> Vec<Option<Keypoint>> {
    points
        .iter()
        .map(|entry| match entry {
            Some(kp) if kp.x > 0.0 || kp.y > 0.0 => {
                Some(Keypoint::new(kp.x * width + offset_x, kp.y * height + offset_y))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use masker_models::{Box, FrameSize, ObjectId};

    fn frame() -> FrameSize {
        FrameSize::new(640, 480)
    }

    #[test]
    fn landmark_pose_scales_and_translates_into_pixel_space() {
        let _ = ObjectId::new(1);
        let frame = frame();
        let bbox = Box::new(10, 20, 110, 120, frame).unwrap();
        let mut history = BoxHistory::new();
        history.push(FrameIndex(0), bbox).unwrap();

        let mut track = PoseTrack::empty(1);
        track.set(
            0,
            Some(Pose::LandmarkPose(vec![Some((Keypoint::new(0.5, 0.5), 0.9))])),
        );

        let reprojector = PoseReprojector::new();
        reprojector.reproject(&mut track, OverlayStrategy::LandmarkPose, &history, frame);

        match track.get(0).unwrap() {
            Pose::LandmarkPose(points) => {
                let (kp, _) = points[0].unwrap();
                assert_eq!(kp.x, 0.5 * 100.0 + 10.0);
                assert_eq!(kp.y, 0.5 * 100.0 + 20.0);
            }
            _ => panic!("expected landmark pose"),
        }
    }

    #[test]
    fn low_visibility_keypoint_is_dropped() {
        let frame = frame();
        let bbox = Box::new(0, 0, 100, 100, frame).unwrap();
        let mut history = BoxHistory::new();
        history.push(FrameIndex(0), bbox).unwrap();

        let mut track = PoseTrack::empty(1);
        track.set(
            0,
            Some(Pose::LandmarkPose(vec![Some((Keypoint::new(0.5, 0.5), 0.01))])),
        );

        let reprojector = PoseReprojector::new();
        reprojector.reproject(&mut track, OverlayStrategy::LandmarkPose, &history, frame);

        match track.get(0).unwrap() {
            Pose::LandmarkPose(points) => assert!(points[0].is_none()),
            _ => panic!("expected landmark pose"),
        }
    }

    #[test]
    fn missing_openpose_vector_collapses_frame_to_absent() {
        let frame = frame();
        let bbox = Box::new(0, 0, 100, 100, frame).unwrap();
        let mut history = BoxHistory::new();
        history.push(FrameIndex(0), bbox).unwrap();

        let mut track = PoseTrack::empty(1);
        track.set(
            0,
            Some(Pose::Openpose { pose: None, face: None, left_hand: None, right_hand: None }),
        );

        let reprojector = PoseReprojector::new();
        reprojector.reproject(&mut track, OverlayStrategy::Openpose, &history, frame);

        assert!(track.get(0).is_none());
    }
}
