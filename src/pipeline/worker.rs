//! Background inbox processor: runs the pipeline over the store on a timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::processor::TriagePipeline;
use crate::store::MailStore;

/// Spawn a task that calls [`TriagePipeline::process_inbox`] every
/// `interval`, starting immediately.
///
/// Returns the task handle and a shutdown flag checked before each pass.
pub fn spawn_inbox_processor(
    store: Arc<MailStore>,
    pipeline: Arc<TriagePipeline>,
    interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Inbox processor started");
        let mut tick = tokio::time::interval(interval);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Inbox processor shutting down");
                return;
            }

            let report = pipeline.process_inbox(&store).await;
            debug!(
                emails = report.emails_processed,
                threads = report.threads_compressed,
                "Scheduled inbox pass finished"
            );
        }
    });

    (handle, shutdown_flag)
}
