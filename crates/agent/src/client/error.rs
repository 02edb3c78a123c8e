//! Error — failures of the CRM bulk log API client.
//!
//! A download error is always scoped to a single descriptor; the batch
//! decides whether to continue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP transport failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status} for {reference}")]
    Status { status: u16, reference: String },

    #[error("I/O failed while draining download: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown log file reference: {0}")]
    UnknownReference(String),
}
