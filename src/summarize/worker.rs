use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::pipeline::SummaryPipeline;

/// One unit of detached summarization work.
#[derive(Debug, Clone)]
pub struct SummaryJob {
    pub document_id: Uuid,
}

/// Spawns the single-consumer background worker and returns the job sender.
///
/// Jobs are fire-and-forget: a failed attempt is logged and dropped, never
/// retried. The next explicit summary request re-runs the pipeline.
pub fn spawn_summary_worker(pipeline: Arc<SummaryPipeline>) -> mpsc::Sender<SummaryJob> {
    let (tx, mut rx) = mpsc::channel::<SummaryJob>(64);

    tokio::spawn(async move {
        info!("Summary worker started");
        while let Some(job) = rx.recv().await {
            match pipeline.run(job.document_id).await {
                Ok(_) => info!("Background summary ready for {}", job.document_id),
                Err(e) => warn!(
                    "Background summarization failed for {}: {}",
                    job.document_id, e
                ),
            }
        }
        info!("Summary worker stopped");
    });

    tx
}
