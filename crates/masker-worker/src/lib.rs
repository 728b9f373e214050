//! Job coordinator for the masking pipeline.
//!
//! Owns every `masker-core`/`masker-clients`/`masker-video` structure for
//! the lifetime of one job: drives the pipeline stage by stage, retries
//! recoverable collaborator errors, honors cancellation, and cleans up
//! scoped resources on failure.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod retry;

pub use config::WorkerConfig;
pub use coordinator::{JobCoordinator, JobOutcome};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
