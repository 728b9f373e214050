//! Per-segment sub-clip extraction: crop to the refined box, black out
//! everything outside an eroded copy of the object's mask, write frames.

use crate::error::MaskerResult;
use crate::mask_store::MaskStore;
use masker_models::{BoxHistory, FrameIndex, ObjectId};
use masker_video::{VideoSink, VideoSource};
use opencv::core::{Mat, Point, Rect, Scalar, Vector};
use opencv::imgproc::{draw_contours, find_contours, CHAIN_APPROX_SIMPLE, LINE_8, RETR_EXTERNAL};
use opencv::prelude::MatTraitConst;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SubClip {
    pub object: ObjectId,
    pub start: FrameIndex,
    pub end: FrameIndex,
    pub path: PathBuf,
}

pub struct SubVideoExtractorConfig {
    /// `out = crop_alpha * black + (1 - crop_alpha) * original` applied to
    /// pixels outside the eroded mask. Kept at `1.0` (hard cut to black)
    /// but named so a future soft-overlay mode can dial it down.
    pub crop_alpha: f64,
}

impl Default for SubVideoExtractorConfig {
    fn default() -> Self {
        Self { crop_alpha: 1.0 }
    }
}

pub struct SubVideoExtractor {
    config: SubVideoExtractorConfig,
}

impl SubVideoExtractor {
    pub fn new(config: SubVideoExtractorConfig) -> Self {
        Self { config }
    }

    pub fn extract(
        &self,
        source: &mut VideoSource,
        mask_store: &MaskStore,
        object: ObjectId,
        refined: &BoxHistory,
        frame_count: u32,
        out_dir: &Path,
    ) -> MaskerResult<Vec<SubClip>> {
        let fps = source.info().fps;
        let mut clips = Vec::new();

        for (start, end, bbox) in refined.segments(frame_count) {
            let rect = Rect::new(
                bbox.x_min as i32,
                bbox.y_min as i32,
                bbox.width() as i32,
                bbox.height() as i32,
            );

            let path = out_dir.join(format!("object_{}_frame_{}.mp4", object.get(), start.get()));
            let mut sink = VideoSink::create(&path, fps, rect.width as u32, rect.height as u32)?;

            source.seek(start)?;
            for raw_frame in start.get()..end.get() {
                let at = FrameIndex(raw_frame);
                let frame = match source.read_frame()? {
                    Some(frame) => frame,
                    None => break,
                };

                let cropped = Mat::roi(&frame, rect)?.try_clone()?;
                let prepared = self.prepare_frame(&cropped, mask_store, at, object, rect)?;
                sink.write_frame(&prepared)?;
            }

            clips.push(SubClip { object, start, end, path });
        }

        Ok(clips)
    }

    fn prepare_frame(
        &self,
        cropped: &Mat,
        mask_store: &MaskStore,
        at: FrameIndex,
        object: ObjectId,
        crop_rect: Rect,
    ) -> MaskerResult<Mat> {
        let mask = mask_store.get(at, object);
        let mask = match mask {
            Some(mask) if !mask.is_empty() => mask,
            _ => return Ok(Mat::zeros(cropped.rows(), cropped.cols(), cropped.typ())?.to_mat()?),
        };

        let mask_crop = Mat::roi(mask.mat(), crop_rect)?.try_clone()?;

        let erosion_px = round_half_away_from_zero(crop_rect.width as f64 / 100.0) as i32;

        let mut eroded_mask = mask_crop.clone();
        let mut contours: Vector<Vector<Point>> = Vector::new();
        find_contours(
            &mask_crop,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;
        draw_contours(
            &mut eroded_mask,
            &contours,
            -1,
            Scalar::all(0.0),
            erosion_px,
            LINE_8,
            &opencv::core::no_array(),
            i32::MAX,
            Point::new(0, 0),
        )?;

        let mut inverse_mask = Mat::default();
        opencv::core::bitwise_not(&eroded_mask, &mut inverse_mask, &opencv::core::no_array())?;

        let black = Mat::zeros(cropped.rows(), cropped.cols(), cropped.typ())?.to_mat()?;
        let mut blended = Mat::default();
        opencv::core::add_weighted(
            cropped,
            1.0 - self.config.crop_alpha,
            &black,
            self.config.crop_alpha,
            0.0,
            &mut blended,
            -1,
        )?;

        let mut output = cropped.clone();
        blended.copy_to_masked(&mut output, &inverse_mask)?;
        Ok(output)
    }
}

fn round_half_away_from_zero(value: f64) -> i64 {
    if value >= 0.0 {
        (value + 0.5).floor() as i64
    } else {
        (value - 0.5).ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::round_half_away_from_zero;

    #[test]
    fn erosion_rounding_matches_pythons_round() {
        assert_eq!(round_half_away_from_zero(2.5), 3);
        assert_eq!(round_half_away_from_zero(1.49), 1);
        assert_eq!(round_half_away_from_zero(100.0 / 100.0), 1);
    }

    #[test]
    fn erosion_rounding_has_no_floor_for_narrow_crops() {
        assert_eq!(round_half_away_from_zero(40.0 / 100.0), 0);
    }
}
