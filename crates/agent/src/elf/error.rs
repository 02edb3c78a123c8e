//! Error — ingest error taxonomy for one Event Log File batch.

use thiserror::Error;

use crate::client::error::DownloadError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Malformed CSV: {0}")]
    CsvSyntax(String),

    #[error("Width mismatch: expected {expected} fields, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Cannot decode {value:?} as {tag} (column {column})")]
    TypeParse {
        tag: &'static str,
        column: usize,
        value: String,
    },

    /// A file-level error carrying the failing descriptor's identity.
    #[error("Event log file {id} failed: {source}")]
    File {
        id: String,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Spool buffer I/O failed: {0}")]
    Spool(#[from] std::io::Error),

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Output queue closed")]
    QueueClosed,
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::CsvSyntax(err.to_string())
    }
}
