//! Margin, square-up and clamp refinement of a coalesced box.
//!
//! Padding and squaring are grounded on `BoundingBox::pad`, adapted from
//! float box edges to integer ones. Clamping follows
//! `sam2_pose_masker.py`'s `_fine_tune_bounding_box`: each edge is clipped
//! to the frame independently, so a box that overruns one edge loses area
//! on that edge only rather than being recentered.

use masker_models::{Box, FrameSize};

pub struct BBoxRefiner {
    margin_fraction: f64,
}

impl Default for BBoxRefiner {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl BBoxRefiner {
    pub fn new(margin_fraction: f64) -> Self {
        Self { margin_fraction }
    }

    pub fn refine(&self, raw: &Box, frame: FrameSize) -> Box {
        let padded = self.pad(raw);
        let clamped = Self::clamp(&padded, frame);
        let squared = Self::square_up(&clamped);
        Self::clamp(&squared, frame)
    }

    fn pad(&self, bbox: &Box) -> Box {
        let pad_x = (bbox.width() as f64 * self.margin_fraction).round() as i64;
        let pad_y = (bbox.height() as f64 * self.margin_fraction).round() as i64;
        Box::new_unchecked(
            bbox.x_min - pad_x,
            bbox.y_min - pad_y,
            bbox.x_max + pad_x,
            bbox.y_max + pad_y,
        )
    }

    /// Grow the shorter axis so the box becomes square, splitting the
    /// added length floor/ceil around the center.
    fn square_up(bbox: &Box) -> Box {
        let width = bbox.width();
        let height = bbox.height();

        if width == height {
            return *bbox;
        }

        if width < height {
            let deficit = height - width;
            let before = deficit / 2;
            let after = deficit - before;
            Box::new_unchecked(bbox.x_min - before, bbox.y_min, bbox.x_max + after, bbox.y_max)
        } else {
            let deficit = width - height;
            let before = deficit / 2;
            let after = deficit - before;
            Box::new_unchecked(bbox.x_min, bbox.y_min - before, bbox.x_max, bbox.y_max + after)
        }
    }

    /// Clip each edge independently to `[0, width] x [0, height]`.
    fn clamp(bbox: &Box, frame: FrameSize) -> Box {
        let frame_width = frame.width as i64;
        let frame_height = frame.height as i64;

        let x_min = bbox.x_min.max(0).min(frame_width);
        let y_min = bbox.y_min.max(0).min(frame_height);
        let x_max = bbox.x_max.max(0).min(frame_width);
        let y_max = bbox.y_max.max(0).min(frame_height);

        Box::new_unchecked(x_min, y_min, x_max, y_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_produces_square_box_within_frame() {
        let frame = FrameSize::new(640, 480);
        let raw = Box::new(100, 100, 140, 180, frame).unwrap();
        let refiner = BBoxRefiner::new(0.1);

        let refined = refiner.refine(&raw, frame);

        assert_eq!(refined.width(), refined.height());
        assert!(refined.x_min >= 0 && refined.x_max <= frame.width as i64);
        assert!(refined.y_min >= 0 && refined.y_max <= frame.height as i64);
    }

    #[test]
    fn refine_clamps_box_that_overflows_edge() {
        let frame = FrameSize::new(200, 200);
        let raw = Box::new(0, 0, 190, 190, frame).unwrap();
        let refiner = BBoxRefiner::new(0.1);

        let refined = refiner.refine(&raw, frame);

        assert!(refined.x_max <= frame.width as i64);
        assert!(refined.y_max <= frame.height as i64);
    }

    #[test]
    fn clamp_clips_each_edge_independently_without_recentering() {
        // A box already flush against x=0 must not shift away from 0 just
        // because its other edge overruns the frame.
        let frame = FrameSize::new(200, 100);
        let overrun = Box::new_unchecked(-5, 38, 23, 62);

        let clamped = BBoxRefiner::clamp(&overrun, frame);

        assert_eq!(clamped.x_min, 0);
        assert_eq!(clamped.y_min, 38);
        assert_eq!(clamped.x_max, 23);
        assert_eq!(clamped.y_max, 62);
    }
}
