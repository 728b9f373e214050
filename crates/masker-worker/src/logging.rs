//! Structured job logging: tracing spans and consistent start/progress/
//! warning/error/completion events tagged with a job id, plus whatever
//! pipeline context (object, frame, strategy) is known at the call site.

use masker_models::{FrameIndex, JobId, ObjectId, OverlayStrategy};
use tracing::{error, info, warn, Span};

/// The pipeline coordinates for a log event, attached when the caller has
/// them. Carried as one `Debug`-formatted field rather than a field per
/// component so log methods don't multiply into one variant per
/// combination of known/unknown context.
#[derive(Debug, Clone, Default)]
struct LogContext {
    object: Option<u32>,
    frame: Option<u32>,
    strategy: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: String,
    context: LogContext,
}

impl JobLogger {
    pub fn new(job_id: &JobId, stage: &str) -> Self {
        Self { job_id: job_id.to_string(), stage: stage.to_string(), context: LogContext::default() }
    }

    /// Attach the object this event concerns, e.g. per-object pose
    /// aggregation or box refinement.
    pub fn with_object(&self, object: ObjectId) -> Self {
        Self { context: LogContext { object: Some(object.get()), ..self.context.clone() }, ..self.clone() }
    }

    /// Attach the frame a cancellation or a per-frame compositing error
    /// occurred at.
    pub fn with_frame(&self, frame: FrameIndex) -> Self {
        Self { context: LogContext { frame: Some(frame.get()), ..self.context.clone() }, ..self.clone() }
    }

    /// Attach the overlay strategy driving the current stage.
    pub fn with_strategy(&self, strategy: OverlayStrategy) -> Self {
        let name: &'static str = match strategy {
            OverlayStrategy::Openpose => "openpose",
            OverlayStrategy::LandmarkPose => "landmark_pose",
            OverlayStrategy::LandmarkFace => "landmark_face",
            OverlayStrategy::LandmarkHand => "landmark_hand",
            OverlayStrategy::None => "none",
        };
        Self { context: LogContext { strategy: Some(name), ..self.context.clone() }, ..self.clone() }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, stage = %self.stage, context = ?self.context, "job started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, stage = %self.stage, context = ?self.context, "job progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, stage = %self.stage, context = ?self.context, "job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, stage = %self.stage, context = ?self.context, "job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, stage = %self.stage, context = ?self.context, "job completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn with_stage(&self, stage: &str) -> Self {
        Self { job_id: self.job_id.clone(), stage: stage.to_string(), context: self.context.clone() }
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, stage = %self.stage, context = ?self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_reports_job_id() {
        let job_id = JobId::from_string("job-123");
        let logger = JobLogger::new(&job_id, "coalesce");
        assert_eq!(logger.job_id(), "job-123");
    }

    #[test]
    fn with_stage_keeps_job_id() {
        let job_id = JobId::from_string("job-123");
        let logger = JobLogger::new(&job_id, "coalesce").with_stage("refine");
        assert_eq!(logger.job_id(), "job-123");
    }

    #[test]
    fn with_object_and_strategy_set_context_without_touching_stage() {
        let job_id = JobId::from_string("job-123");
        let object = ObjectId::new(2).unwrap();
        let logger = JobLogger::new(&job_id, "pose").with_object(object).with_strategy(OverlayStrategy::Openpose);

        assert_eq!(logger.stage, "pose");
        assert_eq!(logger.context.object, Some(2));
        assert_eq!(logger.context.strategy, Some("openpose"));
        assert_eq!(logger.context.frame, None);
    }

    #[test]
    fn with_frame_preserves_previously_set_object() {
        let job_id = JobId::from_string("job-123");
        let object = ObjectId::new(1).unwrap();
        let logger = JobLogger::new(&job_id, "composite").with_object(object).with_frame(FrameIndex(42));

        assert_eq!(logger.context.object, Some(1));
        assert_eq!(logger.context.frame, Some(42));
    }
}
