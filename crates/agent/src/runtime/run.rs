//! Run — descriptor poll loop, record drain, and shutdown handling.
//!
//! One logical worker: each poll queries descriptors created since the
//! last successful batch, processes them sequentially through the
//! pipeline, then waits out the poll interval. The wait is interruptible;
//! Ctrl-C cancels the token the pipeline checks between rows, so shutdown
//! can abort a batch mid-file without leaking spool buffers.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::api::LogDownload;
use crate::conf::AgentConfig;
use crate::elf::error::IngestError;
use crate::elf::pipeline::Pipeline;
use crate::elf::record::Record;

/// Poll the API until shutdown, emitting records as NDJSON on stdout.
pub async fn run(
    config: AgentConfig,
    client: impl LogDownload,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_cancel.cancel();
        }
    });

    let (tx, rx) = mpsc::channel(config.queue_capacity);
    let drain = tokio::spawn(drain_records(rx));

    let pipeline = Pipeline::new(
        config.spool_dir.clone().into(),
        config.continue_on_file_error,
        cancel.clone(),
    );

    let mut since = Utc::now() - ChronoDuration::hours(config.lookback_hours);
    while !cancel.is_cancelled() {
        let poll_started = Utc::now();
        match client.query_descriptors(since).await {
            Ok(descriptors) => match pipeline.process(&descriptors, &client, &tx).await {
                Ok(summary) => {
                    info!(
                        files = summary.files_succeeded,
                        failed = summary.files_failed,
                        records = summary.records_emitted,
                        "poll complete"
                    );
                    since = poll_started;
                }
                Err(IngestError::Cancelled) => break,
                Err(IngestError::QueueClosed) => {
                    error!("Output queue closed, stopping");
                    break;
                }
                // Descriptors stay unacknowledged: the next poll retries them.
                Err(err) => error!("Batch failed, will retry next poll: {}", err),
            },
            Err(err) => warn!("Descriptor query failed: {}", err),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)) => {}
        }
    }

    drop(tx);
    drain.await??;
    info!("elftail agent stopped");
    Ok(())
}

/// Drain the record queue as NDJSON, one object per line.
async fn drain_records(mut rx: mpsc::Receiver<Record>) -> std::io::Result<()> {
    let mut out = tokio::io::stdout();
    while let Some(record) = rx.recv().await {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        out.write_all(&line).await?;
    }
    out.flush().await
}
