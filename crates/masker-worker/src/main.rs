//! Masking pipeline worker binary.
//!
//! Job intake (queueing, scheduling, HTTP surface) is out of scope here —
//! this binary takes one job's input directly from the command line:
//! `masker-worker <request.json> <input.mp4> <output.mp4>`.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use masker_clients::{HttpOpenposeClient, HttpSegmentationClient, LandmarkerBackends};
use masker_models::{JobId, JobRequest};
use masker_worker::{JobCoordinator, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("masker=info".parse().unwrap()))
        .init();

    info!("starting masker-worker");

    let config = WorkerConfig::from_env();
    info!(?config, "worker config loaded");

    let mut args = std::env::args().skip(1);
    let request_path = args.next().ok_or_else(|| anyhow::anyhow!("missing <request.json> argument"))?;
    let input = PathBuf::from(args.next().ok_or_else(|| anyhow::anyhow!("missing <input.mp4> argument"))?);
    let output = PathBuf::from(args.next().ok_or_else(|| anyhow::anyhow!("missing <output.mp4> argument"))?);

    let request_bytes = tokio::fs::read(&request_path).await?;
    let request: JobRequest = serde_json::from_slice(&request_bytes)?;

    let segmentation_url = std::env::var("MASKER_SEGMENTATION_URL").unwrap_or_else(|_| "http://localhost:8001".to_string());
    let openpose_url = std::env::var("MASKER_OPENPOSE_URL").unwrap_or_else(|_| "http://localhost:8002".to_string());

    let segmentation = Arc::new(HttpSegmentationClient::new(segmentation_url, config.request_timeout));
    let openpose = Arc::new(HttpOpenposeClient::new(openpose_url, config.request_timeout));
    let landmarkers = LandmarkerBackends::default();

    let coordinator = JobCoordinator::new(config, segmentation, openpose, landmarkers);
    let job_id = JobId::new();
    let cancel = CancellationToken::new();

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, cancelling job");
        shutdown_cancel.cancel();
    });

    match coordinator.run(job_id, request, input, output, cancel).await {
        Ok(outcome) => {
            info!(?outcome, "job finished");
            Ok(())
        }
        Err(e) => {
            error!("job failed: {e}");
            Err(e.into())
        }
    }
}
