//! Random access to per-frame, per-object binary masks.
//!
//! The Mask Store only stores and serves masks; it never talks to the
//! segmentation service itself (that call lives in `masker-clients`).

use crate::error::MaskerResult;
use masker_models::{Box, FrameIndex, FrameSize, ObjectId};
use opencv::core::Mat;
use opencv::prelude::MatTraitConst;
use std::collections::HashMap;

/// A single object's binary mask for a single frame (`CV_8UC1`, nonzero
/// pixels belong to the object).
pub struct Mask {
    mat: Mat,
}

impl Mask {
    pub fn new(mat: Mat) -> Self {
        Self { mat }
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn is_empty(&self) -> bool {
        opencv::core::count_non_zero(&self.mat).unwrap_or(0) == 0
    }

    /// Inclusive min/max of the mask's non-zero pixel coordinates, or
    /// `None` if the mask has no non-zero pixels.
    pub fn tight_box(&self, frame: FrameSize) -> MaskerResult<Option<Box>> {
        if self.is_empty() {
            return Ok(None);
        }
        let rect = opencv::imgproc::bounding_rect(&self.mat)?;
        let bbox = Box::new(
            rect.x as i64,
            rect.y as i64,
            (rect.x + rect.width) as i64,
            (rect.y + rect.height) as i64,
            frame,
        )?;
        Ok(Some(bbox))
    }
}

/// Per-job store of every `(frame, object)` mask handed back by the
/// segmentation collaborator, held until compositing finishes.
#[derive(Default)]
pub struct MaskStore {
    masks: HashMap<(FrameIndex, ObjectId), Mask>,
}

impl MaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: FrameIndex, object: ObjectId, mask: Mask) {
        self.masks.insert((frame, object), mask);
    }

    pub fn get(&self, frame: FrameIndex, object: ObjectId) -> Option<&Mask> {
        self.masks.get(&(frame, object))
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectId> {
        let mut seen: Vec<ObjectId> = self.masks.keys().map(|(_, o)| *o).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.into_iter()
    }
}
