//! Per-object box history from a per-frame mask sequence.
//!
//! Adapted from `IoUTracker::update`'s greedy IoU matching: that tracker
//! matches many detections to many tracks every frame. Here there is no
//! matching step (each mask slot already names its `ObjectId`), so the
//! per-object state collapses to a single "active box" that either
//! extends via union or opens a new history segment.

use crate::mask_store::MaskStore;
use masker_models::{Box, BoxHistory, FrameIndex, FrameSize, ObjectId};
use std::collections::HashMap;

pub struct BBoxCoalescer {
    iou_threshold: f64,
}

impl Default for BBoxCoalescer {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl BBoxCoalescer {
    pub fn new(iou_threshold: f64) -> Self {
        Self { iou_threshold }
    }

    pub fn coalesce(
        &self,
        mask_store: &MaskStore,
        frame_count: u32,
        frame: FrameSize,
        objects: &[ObjectId],
    ) -> HashMap<ObjectId, BoxHistory> {
        let mut histories = HashMap::new();

        for &object in objects {
            let mut history = BoxHistory::new();
            let mut active: Option<Box> = None;

            for raw_frame in 0..frame_count {
                let at = FrameIndex(raw_frame);
                let mask = match mask_store.get(at, object) {
                    Some(mask) => mask,
                    None => continue,
                };
                let tight = match mask.tight_box(frame) {
                    Ok(Some(tight)) => tight,
                    _ => continue,
                };

                active = Some(match active {
                    None => {
                        history.push(at, tight).expect("frames are visited in ascending order");
                        tight
                    }
                    Some(current) if current.iou(&tight) >= self.iou_threshold => {
                        current.union(&tight)
                    }
                    Some(_) => {
                        history.push(at, tight).expect("frames are visited in ascending order");
                        tight
                    }
                });
            }

            histories.insert(object, history);
        }

        histories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask_store::Mask;
    use opencv::core::{Mat, Rect, Scalar, CV_8UC1};
    use opencv::imgproc::{rectangle, FILLED, LINE_8};

    fn mask_with_square(frame: FrameSize, x: i32, y: i32, size: i32) -> Mask {
        let mut mat = Mat::zeros(frame.height as i32, frame.width as i32, CV_8UC1)
            .unwrap()
            .to_mat()
            .unwrap();
        rectangle(
            &mut mat,
            Rect::new(x, y, size, size),
            Scalar::all(255.0),
            FILLED,
            LINE_8,
            0,
        )
        .unwrap();
        Mask::new(mat)
    }

    #[test]
    fn overlapping_masks_extend_a_single_segment() {
        let frame = FrameSize::new(200, 200);
        let mut store = MaskStore::new();
        let object = ObjectId::new(1).unwrap();

        store.insert(FrameIndex(0), object, mask_with_square(frame, 10, 10, 40));
        store.insert(FrameIndex(1), object, mask_with_square(frame, 15, 15, 40));

        let coalescer = BBoxCoalescer::new(0.25);
        let histories = coalescer.coalesce(&store, 2, frame, &[object]);
        let history = &histories[&object];
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn disjoint_masks_open_new_segments() {
        let frame = FrameSize::new(200, 200);
        let mut store = MaskStore::new();
        let object = ObjectId::new(1).unwrap();

        store.insert(FrameIndex(0), object, mask_with_square(frame, 0, 0, 10));
        store.insert(FrameIndex(1), object, mask_with_square(frame, 150, 150, 10));

        let coalescer = BBoxCoalescer::new(0.25);
        let histories = coalescer.coalesce(&store, 2, frame, &[object]);
        let history = &histories[&object];
        assert_eq!(history.len(), 2);
    }
}
