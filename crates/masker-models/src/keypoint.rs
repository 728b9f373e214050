//! Pose keypoints and per-frame pose tracks.

use serde::{Deserialize, Serialize};

/// A single 2D point. Confidence/visibility is carried alongside at the
/// point of use (openpose keypoints have confidence, landmark keypoints
/// have visibility or neither) rather than folded into this type, so
/// `Keypoint` stays uniform across every overlay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One frame's pose data for one object, shaped per overlay strategy.
/// There is no "absent" variant here: absence is represented one level up
/// by `PoseTrack`'s `Option<Pose>` slot being `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pose {
    /// `pose` missing collapses the whole frame to absent (see
    /// `PoseTrack`); `face`/`left_hand`/`right_hand` are independent and
    /// may be absent without affecting the others.
    Openpose {
        pose: Option<Vec<Option<(Keypoint, f64)>>>,
        face: Option<Vec<Option<(Keypoint, f64)>>>,
        left_hand: Option<Vec<Option<(Keypoint, f64)>>>,
        right_hand: Option<Vec<Option<(Keypoint, f64)>>>,
    },
    LandmarkPose(Vec<Option<(Keypoint, f64)>>),
    LandmarkFace(Vec<Option<Keypoint>>),
    LandmarkHand(Vec<Option<Keypoint>>),
}

/// Per-frame pose data for one object across the whole clip. `len()` is
/// always the job's frame count, enforced by the constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTrack(Vec<Option<Pose>>);

impl PoseTrack {
    /// An all-absent track of the given length.
    pub fn empty(frame_count: u32) -> Self {
        Self(vec![None; frame_count as usize])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<&Pose> {
        self.0.get(frame).and_then(|slot| slot.as_ref())
    }

    pub fn set(&mut self, frame: usize, pose: Option<Pose>) {
        self.0[frame] = pose;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Option<Pose>> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Option<Pose>> {
        self.0.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_track_has_every_frame_absent() {
        let track = PoseTrack::empty(5);
        assert_eq!(track.len(), 5);
        assert!((0..5).all(|i| track.get(i).is_none()));
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut track = PoseTrack::empty(3);
        let pose = Pose::LandmarkFace(vec![Some(Keypoint::new(0.1, 0.2))]);
        track.set(1, Some(pose.clone()));
        assert_eq!(track.get(1), Some(&pose));
        assert_eq!(track.get(0), None);
    }
}
