//! Validation errors for the shared data model.

use thiserror::Error;

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while constructing or mutating model types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid box ({x_min},{y_min},{x_max},{y_max}) for frame {width}x{height}")]
    InvalidBox {
        x_min: i64,
        y_min: i64,
        x_max: i64,
        y_max: i64,
        width: u32,
        height: u32,
    },

    #[error("box history keys must be strictly increasing, got {previous} then {next}")]
    NonMonotonicBoxHistory { previous: u32, next: u32 },

    #[error("unknown overlay strategy: {0}")]
    UnknownStrategy(String),

    #[error("overlayStrategies has {strategies} entries but posePrompts has {objects} objects")]
    StrategyCountMismatch { strategies: usize, objects: usize },
}
