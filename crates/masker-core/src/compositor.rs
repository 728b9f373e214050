//! Final per-frame composite: mask overlay, optional debug boxes, pose
//! overlay, written out through a `VideoSink`.

use crate::error::{MaskerError, MaskerResult};
use crate::mask_store::MaskStore;
use masker_models::{Box, BoxHistory, FrameIndex, Keypoint, ObjectId, Pose, PoseTrack};
use masker_video::{VideoSink, VideoSource};
use opencv::core::{Mat, Point, Scalar, Vector};
use opencv::imgproc::{
    circle, draw_contours, line, rectangle, CHAIN_APPROX_SIMPLE, COLOR_BGR2RGB, COLOR_RGB2BGR, FILLED, LINE_8,
    RETR_EXTERNAL,
};
use opencv::prelude::MatTraitConst;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// BGR-order palette, indexed by `ObjectId.get() % palette.len()` so a
/// given object keeps the same color across a run.
const PALETTE: [(u8, u8, u8); 6] = [
    (66, 135, 245),
    (245, 66, 173),
    (66, 245, 126),
    (245, 188, 66),
    (173, 66, 245),
    (66, 245, 233),
];

/// Debug overlay colors recovered from the original implementation: the
/// full coalesced box in white, the refined box in green.
const FULL_BOX_COLOR: (u8, u8, u8) = (255, 255, 255);
const REFINED_BOX_COLOR: (u8, u8, u8) = (0, 255, 0);

pub struct CompositorConfig {
    /// 1-5, higher is more opaque. Default 3 per the original's
    /// `transparent_fill` style.
    pub mask_level: u8,
    pub object_borders: bool,
    pub debug_boxes: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self { mask_level: 3, object_borders: true, debug_boxes: false }
    }
}

pub struct Compositor;

impl Compositor {
    pub fn new() -> Self {
        Self
    }

    pub async fn compose(
        &self,
        source: &mut VideoSource,
        sink: &mut VideoSink,
        mask_store: &MaskStore,
        poses: &HashMap<ObjectId, PoseTrack>,
        boxes: &HashMap<ObjectId, (BoxHistory, BoxHistory)>,
        config: &CompositorConfig,
        cancel: &CancellationToken,
    ) -> MaskerResult<()> {
        let info = source.info();
        let mut frame_index = 0u32;

        while let Some(frame) = source.read_frame()? {
            if cancel.is_cancelled() {
                return Err(MaskerError::Cancelled(FrameIndex(frame_index)));
            }

            let at = FrameIndex(frame_index);
            let mut rgb = Mat::default();
            opencv::imgproc::cvt_color(&frame, &mut rgb, COLOR_BGR2RGB, 0)?;

            for (&object, (full_history, refined_history)) in boxes {
                let color = deterministic_color(object);

                if let Some(mask) = mask_store.get(at, object) {
                    if !mask.is_empty() {
                        self.blend_mask(&mut rgb, mask.mat(), color, config)?;
                    }
                }

                if config.debug_boxes {
                    if let Some(bbox) = full_history.floor(at) {
                        draw_box(&mut rgb, bbox, FULL_BOX_COLOR)?;
                    }
                    if let Some(bbox) = refined_history.floor(at) {
                        draw_box(&mut rgb, bbox, REFINED_BOX_COLOR)?;
                    }
                }

                if let Some(track) = poses.get(&object) {
                    if let Some(pose) = track.get(frame_index as usize) {
                        render_pose(&mut rgb, pose, color)?;
                    }
                }
            }

            let mut bgr = Mat::default();
            opencv::imgproc::cvt_color(&rgb, &mut bgr, COLOR_RGB2BGR, 0)?;
            sink.write_frame(&bgr)?;

            frame_index += 1;
            if frame_index >= info.frame_count {
                break;
            }
        }

        Ok(())
    }

    fn blend_mask(&self, frame: &mut Mat, mask: &Mat, color: (u8, u8, u8), config: &CompositorConfig) -> MaskerResult<()> {
        let alpha = (config.mask_level.clamp(1, 5) as f64) / 5.0;
        let overlay_color = Scalar::new(color.0 as f64, color.1 as f64, color.2 as f64, 0.0);

        let mut colored = Mat::zeros(frame.rows(), frame.cols(), frame.typ())?.to_mat()?;
        colored.set_to(&overlay_color, mask)?;

        let mut blended = Mat::default();
        opencv::core::add_weighted(frame, 1.0 - alpha, &colored, alpha, 0.0, &mut blended, -1)?;
        blended.copy_to_masked(frame, mask)?;

        if config.object_borders {
            let mut contours: Vector<Vector<Point>> = Vector::new();
            opencv::imgproc::find_contours(
                mask,
                &mut contours,
                RETR_EXTERNAL,
                CHAIN_APPROX_SIMPLE,
                Point::new(0, 0),
            )?;
            draw_contours(
                frame,
                &contours,
                -1,
                overlay_color,
                2,
                LINE_8,
                &opencv::core::no_array(),
                i32::MAX,
                Point::new(0, 0),
            )?;
        }

        Ok(())
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

fn deterministic_color(object: ObjectId) -> (u8, u8, u8) {
    PALETTE[(object.get() as usize) % PALETTE.len()]
}

fn draw_box(frame: &mut Mat, bbox: &Box, color: (u8, u8, u8)) -> MaskerResult<()> {
    let rect = opencv::core::Rect::new(
        bbox.x_min as i32,
        bbox.y_min as i32,
        bbox.width() as i32,
        bbox.height() as i32,
    );
    rectangle(
        frame,
        rect,
        Scalar::new(color.0 as f64, color.1 as f64, color.2 as f64, 0.0),
        2,
        LINE_8,
        0,
    )?;
    Ok(())
}

/// Body edges for a BODY_25-style skeleton; points outside this range
/// fall back to point-only rendering.
const BODY_EDGES: [(usize, usize); 13] = [
    (1, 2), (2, 3), (3, 4), (1, 5), (5, 6), (6, 7), (1, 8), (8, 9), (9, 10), (8, 12), (12, 13), (1, 0), (0, 1),
];

fn render_pose(frame: &mut Mat, pose: &Pose, color: (u8, u8, u8)) -> MaskerResult<()> {
    let scalar = Scalar::new(color.0 as f64, color.1 as f64, color.2 as f64, 0.0);

    match pose {
        Pose::Openpose { pose, face, left_hand, right_hand } => {
            if let Some(points) = pose {
                draw_skeleton(frame, points, scalar, true)?;
            }
            for part in [face, left_hand, right_hand].into_iter().flatten() {
                draw_skeleton(frame, part, scalar, false)?;
            }
        }
        Pose::LandmarkPose(points) => draw_skeleton(frame, points, scalar, true)?,
        Pose::LandmarkFace(points) => draw_points(frame, points, scalar)?,
        Pose::LandmarkHand(points) => draw_points(frame, points, scalar)?,
    }

    Ok(())
}

fn draw_skeleton(
    frame: &mut Mat,
    points: &[Option<(Keypoint, f64)>],
    color: Scalar,
    with_edges: bool,
) -> MaskerResult<()> {
    for entry in points.iter().flatten() {
        let (kp, _) = entry;
        circle(frame, Point::new(kp.x as i32, kp.y as i32), 3, color, FILLED, LINE_8, 0)?;
    }

    if with_edges {
        for &(a, b) in &BODY_EDGES {
            if a >= points.len() || b >= points.len() {
                continue;
            }
            if let (Some((pa, _)), Some((pb, _))) = (&points[a], &points[b]) {
                line(
                    frame,
                    Point::new(pa.x as i32, pa.y as i32),
                    Point::new(pb.x as i32, pb.y as i32),
                    color,
                    2,
                    LINE_8,
                    0,
                )?;
            }
        }
    }

    Ok(())
}

fn draw_points(frame: &mut Mat, points: &[Option<Keypoint>], color: Scalar) -> MaskerResult<()> {
    for kp in points.iter().flatten() {
        circle(frame, Point::new(kp.x as i32, kp.y as i32), 2, color, FILLED, LINE_8, 0)?;
    }
    Ok(())
}
