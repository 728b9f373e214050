//! Job input schema (§6 of the pipeline contract).

use crate::error::{ModelError, ModelResult};
use crate::strategy::OverlayStrategy;
use serde::{Deserialize, Serialize};

/// One job's input: a group of prompt points per object (interpreted by
/// the segmentation service, opaque here) and the overlay strategy each
/// object was requested with. Objects are dense, 1-based, in prompt
/// order — `pose_prompts[i]` and `overlay_strategies[i]` both describe
/// `ObjectId::new((i + 1) as u32)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub pose_prompts: Vec<Vec<[i64; 3]>>,
    pub overlay_strategies: Vec<OverlayStrategy>,
}

impl JobRequest {
    pub fn validate(&self) -> ModelResult<()> {
        if self.overlay_strategies.len() != self.pose_prompts.len() {
            return Err(ModelError::StrategyCountMismatch {
                strategies: self.overlay_strategies.len(),
                objects: self.pose_prompts.len(),
            });
        }
        Ok(())
    }

    pub fn object_count(&self) -> usize {
        self.pose_prompts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_matching_lengths() {
        let request = JobRequest {
            pose_prompts: vec![vec![[1, 2, 1]], vec![[3, 4, 1]]],
            overlay_strategies: vec![OverlayStrategy::Openpose, OverlayStrategy::None],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let request = JobRequest {
            pose_prompts: vec![vec![[1, 2, 1]]],
            overlay_strategies: vec![OverlayStrategy::Openpose, OverlayStrategy::None],
        };
        assert!(matches!(
            request.validate(),
            Err(ModelError::StrategyCountMismatch { strategies: 2, objects: 1 })
        ));
    }

    #[test]
    fn deserializes_the_documented_wire_schema() {
        let json = r#"{
            "posePrompts": [[[320, 240, 1]], [[100, 150, 1], [110, 160, 0]]],
            "overlayStrategies": ["openpose", "landmark_pose"]
        }"#;

        let request: JobRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.object_count(), 2);
        assert_eq!(request.pose_prompts[0], vec![[320, 240, 1]]);
        assert_eq!(request.overlay_strategies, vec![OverlayStrategy::Openpose, OverlayStrategy::LandmarkPose]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn deserializing_unknown_strategy_in_wire_schema_fails() {
        let json = r#"{
            "posePrompts": [[[1, 2, 1]]],
            "overlayStrategies": ["banana"]
        }"#;

        let err = serde_json::from_str::<JobRequest>(json).unwrap_err();
        assert!(err.to_string().contains("unknown overlay strategy: banana"));
    }
}
