//! Forward-backward low-pass filtering of pose keypoint tracks.
//!
//! Generalized from `enhanced_smoother`'s always-present camera-keyframe
//! sequences to pose keypoint sequences, which are frequently absent —
//! so filtering runs over each maximal contiguous present run rather
//! than through the whole track.

use masker_models::{Keypoint, OverlayStrategy, Pose, PoseTrack};

/// Dispatch table over `OverlayStrategy`: only `LandmarkPose` is
/// filtered (openpose smoothing is confirmed disabled upstream), every
/// other strategy passes its track through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingPolicy {
    LandmarkPose,
    Disabled,
}

impl SmoothingPolicy {
    pub fn for_strategy(strategy: OverlayStrategy) -> Self {
        match strategy {
            OverlayStrategy::LandmarkPose => Self::LandmarkPose,
            OverlayStrategy::Openpose
            | OverlayStrategy::LandmarkFace
            | OverlayStrategy::LandmarkHand
            | OverlayStrategy::None => Self::Disabled,
        }
    }
}

pub struct Smoother;

impl Smoother {
    pub fn new() -> Self {
        Self
    }

    pub fn smooth(&self, track: &PoseTrack, strategy: OverlayStrategy, fps: f64) -> PoseTrack {
        match SmoothingPolicy::for_strategy(strategy) {
            SmoothingPolicy::Disabled => clone_track(track),
            SmoothingPolicy::LandmarkPose => smooth_landmark_pose(track, fps),
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new()
    }
}

fn clone_track(track: &PoseTrack) -> PoseTrack {
    let mut out = PoseTrack::empty(track.len() as u32);
    for (i, slot) in track.iter().enumerate() {
        out.set(i, slot.clone());
    }
    out
}

fn smooth_landmark_pose(track: &PoseTrack, fps: f64) -> PoseTrack {
    let len = track.len();
    let mut out = PoseTrack::empty(len as u32);

    let keypoint_count = (0..len)
        .filter_map(|i| track.get(i))
        .find_map(|pose| match pose {
            Pose::LandmarkPose(points) => Some(points.len()),
            _ => None,
        })
        .unwrap_or(0);

    // Per keypoint index: gather (frame, x, y, visibility) samples, run
    // the filter over contiguous present runs, scatter results back.
    let mut per_keypoint: Vec<Vec<Option<(Keypoint, f64)>>> = vec![Vec::with_capacity(len); keypoint_count];
    let mut present: Vec<bool> = vec![false; len];

    for frame in 0..len {
        match track.get(frame) {
            Some(Pose::LandmarkPose(points)) => {
                present[frame] = true;
                for (k, slot) in per_keypoint.iter_mut().enumerate() {
                    slot.push(points.get(k).copied().flatten());
                }
            }
            _ => {
                for slot in per_keypoint.iter_mut() {
                    slot.push(None);
                }
            }
        }
    }

    let cutoff_hz = (fps / 15.0).max(0.01);
    let mut smoothed_keypoints: Vec<Vec<Option<(Keypoint, f64)>>> = Vec::with_capacity(keypoint_count);
    for series in &per_keypoint {
        smoothed_keypoints.push(smooth_series(series, fps, cutoff_hz));
    }

    for frame in 0..len {
        if !present[frame] {
            out.set(frame, None);
            continue;
        }
        let points: Vec<Option<(Keypoint, f64)>> = smoothed_keypoints
            .iter()
            .map(|series| series[frame])
            .collect();
        out.set(frame, Some(Pose::LandmarkPose(points)));
    }

    out
}

/// Filter one keypoint's time series, preserving absence and leaving
/// runs of length 1-2 unchanged (too short to filter meaningfully).
fn smooth_series(series: &[Option<(Keypoint, f64)>], fps: f64, cutoff_hz: f64) -> Vec<Option<(Keypoint, f64)>> {
    let mut out = series.to_vec();
    let mut run_start = None;

    for i in 0..=series.len() {
        let present = i < series.len() && series[i].is_some();
        match (present, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                filter_run(&mut out, start, i, fps, cutoff_hz);
                run_start = None;
            }
            _ => {}
        }
    }

    out
}

fn filter_run(out: &mut [Option<(Keypoint, f64)>], start: usize, end: usize, fps: f64, cutoff_hz: f64) {
    let len = end - start;
    if len < 3 {
        return;
    }

    let xs: Vec<f64> = (start..end).map(|i| out[i].unwrap().0.x).collect();
    let ys: Vec<f64> = (start..end).map(|i| out[i].unwrap().0.y).collect();

    let filtered_x = filtfilt_butterworth(&xs, fps, cutoff_hz);
    let filtered_y = filtfilt_butterworth(&ys, fps, cutoff_hz);

    for (offset, i) in (start..end).enumerate() {
        let (_, confidence) = out[i].unwrap();
        out[i] = Some((Keypoint::new(filtered_x[offset], filtered_y[offset]), confidence));
    }
}

/// Zero-phase second-order Butterworth low-pass: filter forward, reverse,
/// filter again, reverse again. Cancels the phase lag a single forward
/// pass would introduce.
fn filtfilt_butterworth(data: &[f64], fps: f64, cutoff_hz: f64) -> Vec<f64> {
    let (b, a) = butterworth_lowpass_coefficients(fps, cutoff_hz);
    let forward = biquad_filter(data, &b, &a);
    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    reversed = biquad_filter(&reversed, &b, &a);
    reversed.into_iter().rev().collect()
}

/// Standard bilinear-transform 2nd-order Butterworth low-pass design.
fn butterworth_lowpass_coefficients(fps: f64, cutoff_hz: f64) -> ([f64; 3], [f64; 2]) {
    let nyquist = fps / 2.0;
    let normalized = (cutoff_hz / nyquist).clamp(1e-4, 0.999);
    let c = 1.0 / (std::f64::consts::PI * normalized / 2.0).tan();
    let c2 = c * c;
    let sqrt2_c = std::f64::consts::SQRT_2 * c;

    let a0 = 1.0 + sqrt2_c + c2;
    let b0 = 1.0 / a0;
    let b = [b0, 2.0 * b0, b0];
    let a1 = 2.0 * (1.0 - c2) * b0;
    let a2 = (1.0 - sqrt2_c + c2) * b0;

    (b, [a1, a2])
}

/// Direct-form II biquad, zero initial state (each run is filtered
/// independently so there is no cross-run state to carry).
fn biquad_filter(data: &[f64], b: &[f64; 3], a: &[f64; 2]) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);

    for &x0 in data {
        let y0 = b[0] * x0 + b[1] * x1 + b[2] * x2 - a[0] * y1 - a[1] * y2;
        out.push(y0);
        x2 = x1;
        x1 = x0;
        y2 = y1;
        y1 = y0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_strategies_pass_through_unchanged() {
        let mut track = PoseTrack::empty(3);
        track.set(0, Some(Pose::LandmarkFace(vec![Some(Keypoint::new(0.1, 0.2))])));

        let smoother = Smoother::new();
        let smoothed = smoother.smooth(&track, OverlayStrategy::LandmarkFace, 30.0);

        assert_eq!(smoothed.get(0), track.get(0));
        assert_eq!(smoothed.get(1), None);
    }

    #[test]
    fn short_runs_are_left_unchanged() {
        let mut track = PoseTrack::empty(2);
        track.set(0, Some(Pose::LandmarkPose(vec![Some((Keypoint::new(1.0, 1.0), 0.9))])));
        track.set(1, Some(Pose::LandmarkPose(vec![Some((Keypoint::new(2.0, 2.0), 0.9))])));

        let smoother = Smoother::new();
        let smoothed = smoother.smooth(&track, OverlayStrategy::LandmarkPose, 30.0);

        match smoothed.get(0).unwrap() {
            Pose::LandmarkPose(points) => assert_eq!(points[0].unwrap().0.x, 1.0),
            _ => panic!("expected landmark pose"),
        }
    }

    #[test]
    fn absent_frames_stay_absent_after_smoothing() {
        let mut track = PoseTrack::empty(5);
        for i in [0, 1, 3, 4] {
            track.set(i, Some(Pose::LandmarkPose(vec![Some((Keypoint::new(i as f64, i as f64), 0.9))])));
        }

        let smoother = Smoother::new();
        let smoothed = smoother.smooth(&track, OverlayStrategy::LandmarkPose, 30.0);

        assert!(smoothed.get(2).is_none());
        assert!(smoothed.get(0).is_some());
    }
}
