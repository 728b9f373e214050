//! Job coordinator: owns every pipeline structure for one job's lifetime
//! and drives segmentation -> coalesce -> refine -> extract -> aggregate
//! -> reproject -> smooth -> composite, in that order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use masker_clients::{LandmarkerBackends, OpenposeClient, SegmentationClient};
use masker_core::{
    BBoxCoalescer, BBoxRefiner, Compositor, CompositorConfig, Mask, MaskStore, MaskerError, PoseAggregator,
    PoseReprojector, Smoother, SubVideoExtractor, SubVideoExtractorConfig,
};
use masker_models::{Box, BoxHistory, FrameIndex, FrameSize, JobId, JobRequest, ObjectId, OverlayStrategy, PoseTrack};
use masker_video::{VideoSink, VideoSource};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::retry::{retry_async, RetryConfig, RetryResult};

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed,
    /// The segmentation service returned no masks for any object/frame.
    /// Output is a byte-for-byte copy of the input, no overlays drawn.
    CompletedWithWarning(String),
}

pub struct JobCoordinator {
    config: WorkerConfig,
    segmentation: Arc<dyn SegmentationClient>,
    openpose: Arc<dyn OpenposeClient>,
    landmarkers: LandmarkerBackends,
}

impl JobCoordinator {
    pub fn new(
        config: WorkerConfig,
        segmentation: Arc<dyn SegmentationClient>,
        openpose: Arc<dyn OpenposeClient>,
        landmarkers: LandmarkerBackends,
    ) -> Self {
        Self { config, segmentation, openpose, landmarkers }
    }

    pub async fn run(
        &self,
        job_id: JobId,
        request: JobRequest,
        input: PathBuf,
        output: PathBuf,
        cancel: CancellationToken,
    ) -> WorkerResult<JobOutcome> {
        request.validate()?;

        let work_dir = PathBuf::from(&self.config.work_dir).join(job_id.as_str());
        tokio::fs::create_dir_all(&work_dir).await?;

        let result = self.run_inner(&job_id, &request, &input, &output, &work_dir, &cancel).await;

        match result {
            Ok(outcome) => {
                tokio::fs::remove_dir_all(&work_dir).await.ok();
                Ok(outcome)
            }
            Err(WorkerError::Core(MaskerError::Cancelled(at))) => {
                JobLogger::new(&job_id, "coordinator")
                    .with_frame(at)
                    .log_warning("cancelled, cleaning up partial output");
                tokio::fs::remove_file(&output).await.ok();
                tokio::fs::remove_dir_all(&work_dir).await.ok();
                Err(WorkerError::Cancelled(at))
            }
            Err(e) => {
                tokio::fs::remove_file(&output).await.ok();
                tokio::fs::remove_dir_all(&work_dir).await.ok();
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        input: &Path,
        output: &Path,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> WorkerResult<JobOutcome> {
        let logger = JobLogger::new(job_id, "segment");
        logger.log_start("opening source video");

        let (mut source, info) = VideoSource::open(input)?;
        let frame = FrameSize::new(info.width, info.height);
        let objects: Vec<ObjectId> = (1..=request.object_count() as u32).filter_map(ObjectId::new).collect();

        let mask_store = self.segment(&logger, input, request).await?;

        if cancel.is_cancelled() {
            return Err(WorkerError::Core(MaskerError::Cancelled(FrameIndex::ZERO)));
        }

        let coalescer = BBoxCoalescer::new(self.config.iou_threshold);
        let coalesced = coalescer.coalesce(&mask_store, info.frame_count, frame, &objects);

        if coalesced.values().all(BoxHistory::is_empty) {
            tokio::fs::copy(input, output).await?;
            return Ok(JobOutcome::CompletedWithWarning(
                "segmentation produced no masks; output equals input".to_string(),
            ));
        }

        let refiner = BBoxRefiner::new(self.config.margin_fraction);
        let mut refined: HashMap<ObjectId, BoxHistory> = HashMap::new();
        for (&object, history) in &coalesced {
            refined.insert(object, refine_history(&refiner, history, frame));
        }

        if cancel.is_cancelled() {
            return Err(WorkerError::Core(MaskerError::Cancelled(FrameIndex::ZERO)));
        }

        let poses =
            self.build_poses(job_id, request, &mut source, &mask_store, &objects, &refined, frame, cancel).await?;

        let boxes: HashMap<ObjectId, (BoxHistory, BoxHistory)> = coalesced
            .into_iter()
            .map(|(object, full)| {
                let refined_history = refined.remove(&object).unwrap_or_else(BoxHistory::new);
                (object, (full, refined_history))
            })
            .collect();

        let logger = JobLogger::new(job_id, "composite");
        logger.log_progress("compositing final output");
        source.seek(FrameIndex::ZERO)?;
        let mut sink = VideoSink::create(output, info.fps, frame.width, frame.height)?;
        let compositor = Compositor::new();
        compositor
            .compose(&mut source, &mut sink, &mask_store, &poses, &boxes, &CompositorConfig::default(), cancel)
            .await?;
        logger.log_completion("done");

        Ok(JobOutcome::Completed)
    }

    #[allow(clippy::too_many_arguments)]
    async fn build_poses(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        source: &mut VideoSource,
        mask_store: &MaskStore,
        objects: &[ObjectId],
        refined: &HashMap<ObjectId, BoxHistory>,
        frame: FrameSize,
        cancel: &CancellationToken,
    ) -> WorkerResult<HashMap<ObjectId, PoseTrack>> {
        let extractor = SubVideoExtractor::new(SubVideoExtractorConfig::default());
        let reprojector = PoseReprojector::new();
        let smoother = Smoother::new();
        let frame_count = source.info().frame_count;
        let fps = source.info().fps;

        let mut out_dir = PathBuf::from(&self.config.work_dir).join(job_id.as_str());
        out_dir.push("clips");
        tokio::fs::create_dir_all(&out_dir).await?;

        let mut poses: HashMap<ObjectId, PoseTrack> = HashMap::new();

        for &object in objects {
            let logger = JobLogger::new(job_id, "pose").with_object(object);
            let Some(refined_history) = refined.get(&object) else { continue };

            logger.log_progress("extracting sub-clips");
            let clips = extractor.extract(source, mask_store, object, refined_history, frame_count, &out_dir)?;

            let strategy = request.overlay_strategies[object.index()];
            let logger = logger.with_strategy(strategy);
            logger.log_progress("aggregating pose");
            let mut track = self.aggregate_with_retry(&logger, &clips, strategy, frame_count).await?;

            if cancel.is_cancelled() {
                return Err(WorkerError::Core(MaskerError::Cancelled(FrameIndex::ZERO)));
            }

            reprojector.reproject(&mut track, strategy, refined_history, frame);
            let smoothed = smoother.smooth(&track, strategy, fps);

            poses.insert(object, smoothed);
            logger.log_completion("pose ready");
        }

        Ok(poses)
    }

    async fn segment(&self, logger: &JobLogger, input: &Path, request: &JobRequest) -> WorkerResult<MaskStore> {
        let video_bytes = tokio::fs::read(input).await?;
        let retry_config = RetryConfig::new("segmentation").with_max_retries(self.config.max_retries);

        let response = retry_async(
            &retry_config,
            |e: &masker_clients::ClientError| e.is_retryable(),
            || self.segmentation.segment(video_bytes.clone(), &request.pose_prompts),
        )
        .await;

        let response = match response {
            RetryResult::Success(r) => r,
            RetryResult::Failed { error, attempts } => {
                return Err(WorkerError::RetryExhausted {
                    operation: "segmentation".to_string(),
                    attempts,
                    message: error.to_string(),
                })
            }
        };

        logger.log_progress(&format!("decoding {} frames of masks", response.frame_count));
        let mut store = MaskStore::new();
        for (frame_idx, frame_masks) in response.masks.into_iter().enumerate() {
            for (object_idx, encoded) in frame_masks.into_iter().enumerate() {
                let Some(bytes) = encoded else { continue };
                let Some(object) = ObjectId::new((object_idx + 1) as u32) else { continue };
                let vector = opencv::core::Vector::from_slice(&bytes);
                let mat = opencv::imgcodecs::imdecode(&vector, opencv::imgcodecs::IMREAD_GRAYSCALE)
                    .map_err(MaskerError::from)?;
                store.insert(FrameIndex(frame_idx as u32), object, Mask::new(mat));
            }
        }

        Ok(store)
    }

    async fn aggregate_with_retry(
        &self,
        logger: &JobLogger,
        clips: &[masker_core::SubClip],
        strategy: OverlayStrategy,
        frame_count: u32,
    ) -> WorkerResult<PoseTrack> {
        let retry_config = RetryConfig::new("pose-aggregation").with_max_retries(self.config.max_retries);
        let aggregator = PoseAggregator::new();

        let result = retry_async(
            &retry_config,
            |e: &MaskerError| matches!(e, MaskerError::Client(c) if c.is_retryable()),
            || aggregator.aggregate(clips, strategy, frame_count, self.openpose.as_ref(), &self.landmarkers),
        )
        .await;

        match result {
            RetryResult::Success(track) => Ok(track),
            RetryResult::Failed { error, attempts } => {
                logger.log_warning(&format!("pose aggregation retries exhausted after {attempts} attempts"));
                Err(WorkerError::RetryExhausted {
                    operation: "pose-aggregation".to_string(),
                    attempts,
                    message: error.to_string(),
                })
            }
        }
    }
}

fn refine_history(refiner: &BBoxRefiner, history: &BoxHistory, frame: FrameSize) -> BoxHistory {
    let mut refined = BoxHistory::new();
    for (at, bbox) in history.entries() {
        let bbox: Box = refiner.refine(bbox, frame);
        refined.push(*at, bbox).expect("source history keys are already strictly increasing");
    }
    refined
}
