//! Overlay strategy selection.
//!
//! `FromStr` is the only place a strategy is ever compared as a string —
//! it runs once per object at job start. Every other consumer matches on
//! the enum, so adding a strategy is a compile-time-checked exercise.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wire format is the lowercase-with-underscore string (`"openpose"`,
/// `"landmark_pose"`, ...) documented in the job input schema, routed
/// through `FromStr`/`Display` so there is exactly one place that maps
/// strategy names to strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OverlayStrategy {
    Openpose,
    LandmarkPose,
    LandmarkFace,
    LandmarkHand,
    None,
}

impl TryFrom<String> for OverlayStrategy {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OverlayStrategy> for String {
    fn from(value: OverlayStrategy) -> Self {
        value.to_string()
    }
}

impl FromStr for OverlayStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openpose" => Ok(Self::Openpose),
            "landmark_pose" => Ok(Self::LandmarkPose),
            "landmark_face" => Ok(Self::LandmarkFace),
            "landmark_hand" => Ok(Self::LandmarkHand),
            "none" => Ok(Self::None),
            other => Err(ModelError::UnknownStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for OverlayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Openpose => "openpose",
            Self::LandmarkPose => "landmark_pose",
            Self::LandmarkFace => "landmark_face",
            Self::LandmarkHand => "landmark_hand",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_strategy() {
        assert_eq!("openpose".parse(), Ok(OverlayStrategy::Openpose));
        assert_eq!("landmark_pose".parse(), Ok(OverlayStrategy::LandmarkPose));
        assert_eq!("landmark_face".parse(), Ok(OverlayStrategy::LandmarkFace));
        assert_eq!("landmark_hand".parse(), Ok(OverlayStrategy::LandmarkHand));
        assert_eq!("none".parse(), Ok(OverlayStrategy::None));
    }

    #[test]
    fn rejects_unknown_strategy() {
        let result: Result<OverlayStrategy, _> = "mp_pose".parse();
        assert_eq!(result, Err(ModelError::UnknownStrategy("mp_pose".to_string())));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for strategy in [
            OverlayStrategy::Openpose,
            OverlayStrategy::LandmarkPose,
            OverlayStrategy::LandmarkFace,
            OverlayStrategy::LandmarkHand,
            OverlayStrategy::None,
        ] {
            let parsed: OverlayStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }

    #[test]
    fn deserializes_from_wire_format_strings() {
        let strategy: OverlayStrategy = serde_json::from_str("\"landmark_hand\"").unwrap();
        assert_eq!(strategy, OverlayStrategy::LandmarkHand);
    }

    #[test]
    fn deserializing_unknown_wire_string_reports_unknown_strategy() {
        let err = serde_json::from_str::<OverlayStrategy>("\"banana\"").unwrap_err();
        assert!(err.to_string().contains("unknown overlay strategy: banana"));
    }

    #[test]
    fn serializes_to_wire_format_string() {
        let encoded = serde_json::to_string(&OverlayStrategy::LandmarkPose).unwrap();
        assert_eq!(encoded, "\"landmark_pose\"");
    }
}
