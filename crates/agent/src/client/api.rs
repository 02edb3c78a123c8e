//! LogDownload trait — abstract interface for the CRM bulk log API.
//!
//! The pipeline only ever talks to the platform through this trait.
//! `live.rs` provides the real reqwest-backed implementation.
//! `fake.rs` provides a test double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWrite;

use crate::client::error::DownloadError;
use crate::elf::descriptor::LogDescriptor;

/// Async interface over the CRM's bulk log API.
///
/// Implementations must be `Send + Sync` so a single client can serve the
/// poll loop and the pipeline.
#[async_trait]
pub trait LogDownload: Send + Sync {
    /// List Event Log File descriptors created at or after `since`.
    async fn query_descriptors(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<LogDescriptor>, DownloadError>;

    /// Fully drain the remote content behind `reference` into `sink`.
    ///
    /// Must not return before the body is completely written. Returns the
    /// number of bytes streamed.
    async fn stream_download(
        &self,
        reference: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError>;
}
