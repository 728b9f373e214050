//! Integer bounding boxes and sparse per-object box histories.

use crate::error::{ModelError, ModelResult};
use crate::ids::{FrameIndex, FrameSize};
use serde::{Deserialize, Serialize};

/// Axis-aligned integer box. Invariant: `0 <= x_min < x_max <= frame_width`
/// and the analogous constraint on y, checked at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Box {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl Box {
    /// Construct a box, validating it against the frame it was computed in.
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64, frame: FrameSize) -> ModelResult<Self> {
        if x_min < 0
            || y_min < 0
            || x_min >= x_max
            || y_min >= y_max
            || x_max > frame.width as i64
            || y_max > frame.height as i64
        {
            return Err(ModelError::InvalidBox {
                x_min,
                y_min,
                x_max,
                y_max,
                width: frame.width,
                height: frame.height,
            });
        }
        Ok(Self { x_min, y_min, x_max, y_max })
    }

    /// Construct without validating against a frame. Used internally by
    /// components (refiner, clamping) that guarantee the invariant by
    /// construction rather than by runtime check.
    pub fn new_unchecked(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// Intersection over union with another box. Empty intersection -> 0.0.
    pub fn iou(&self, other: &Box) -> f64 {
        let x1 = self.x_min.max(other.x_min);
        let y1 = self.y_min.max(other.y_min);
        let x2 = self.x_max.min(other.x_max);
        let y2 = self.y_max.min(other.y_max);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = ((x2 - x1) * (y2 - y1)) as f64;
        let union = (self.area() + other.area()) as f64 - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Component-wise (min-min, max-max) union of two boxes, used to grow
    /// the in-memory active box during coalescing. Does not validate
    /// against a frame because the inputs are already frame-valid.
    pub fn union(&self, other: &Box) -> Box {
        Box {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// Sparse, per-object mapping from segment-start `FrameIndex` to the `Box`
/// held constant for that segment. Keys are kept strictly increasing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxHistory {
    entries: Vec<(FrameIndex, Box)>,
}

impl BoxHistory {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record a new segment start. `at` must be strictly greater than the
    /// previously recorded key, if any.
    pub fn push(&mut self, at: FrameIndex, value: Box) -> ModelResult<()> {
        if let Some((last, _)) = self.entries.last() {
            if at <= *last {
                return Err(ModelError::NonMonotonicBoxHistory {
                    previous: last.get(),
                    next: at.get(),
                });
            }
        }
        self.entries.push((at, value));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The recorded `(FrameIndex, Box)` pairs in ascending key order.
    pub fn entries(&self) -> &[(FrameIndex, Box)] {
        &self.entries
    }

    /// Floor lookup: the box held at frame `at`, i.e. the value recorded
    /// at the largest key `<= at`. `None` if `at` precedes the first key.
    pub fn floor(&self, at: FrameIndex) -> Option<&Box> {
        let idx = self.entries.partition_point(|(key, _)| *key <= at);
        if idx == 0 {
            None
        } else {
            Some(&self.entries[idx - 1].1)
        }
    }

    /// Iterate the half-open segments `[start, end)` that partition
    /// `[0, frame_count)`, each paired with the box held during it.
    pub fn segments(&self, frame_count: u32) -> impl Iterator<Item = (FrameIndex, FrameIndex, &Box)> {
        self.entries.iter().enumerate().map(move |(i, (start, bbox))| {
            let end = self
                .entries
                .get(i + 1)
                .map(|(next, _)| *next)
                .unwrap_or(FrameIndex(frame_count));
            (*start, end, bbox)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameSize {
        FrameSize::new(100, 100)
    }

    #[test]
    fn box_validates_ordering() {
        assert!(Box::new(10, 10, 20, 20, frame()).is_ok());
        assert!(Box::new(20, 10, 10, 20, frame()).is_err());
        assert!(Box::new(10, 10, 200, 20, frame()).is_err());
    }

    #[test]
    fn iou_no_overlap_is_zero() {
        let a = Box::new(0, 0, 10, 10, frame()).unwrap();
        let b = Box::new(50, 50, 60, 60, frame()).unwrap();
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_identical_boxes_is_one() {
        let a = Box::new(0, 0, 10, 10, frame()).unwrap();
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn history_rejects_non_increasing_keys() {
        let mut history = BoxHistory::new();
        let b = Box::new(0, 0, 10, 10, frame()).unwrap();
        history.push(FrameIndex(5), b).unwrap();
        assert!(history.push(FrameIndex(5), b).is_err());
        assert!(history.push(FrameIndex(3), b).is_err());
    }

    #[test]
    fn floor_lookup_finds_active_segment() {
        let mut history = BoxHistory::new();
        let b0 = Box::new(0, 0, 10, 10, frame()).unwrap();
        let b5 = Box::new(20, 20, 30, 30, frame()).unwrap();
        history.push(FrameIndex(0), b0).unwrap();
        history.push(FrameIndex(5), b5).unwrap();

        assert_eq!(history.floor(FrameIndex(0)), Some(&b0));
        assert_eq!(history.floor(FrameIndex(4)), Some(&b0));
        assert_eq!(history.floor(FrameIndex(5)), Some(&b5));
        assert_eq!(history.floor(FrameIndex(100)), Some(&b5));
    }

    #[test]
    fn segments_partition_frame_count() {
        let mut history = BoxHistory::new();
        let b0 = Box::new(0, 0, 10, 10, frame()).unwrap();
        let b5 = Box::new(20, 20, 30, 30, frame()).unwrap();
        history.push(FrameIndex(0), b0).unwrap();
        history.push(FrameIndex(5), b5).unwrap();

        let segs: Vec<_> = history.segments(10).collect();
        assert_eq!(segs.len(), 2);
        assert_eq!((segs[0].0, segs[0].1), (FrameIndex(0), FrameIndex(5)));
        assert_eq!((segs[1].0, segs[1].1), (FrameIndex(5), FrameIndex(10)));
    }
}
