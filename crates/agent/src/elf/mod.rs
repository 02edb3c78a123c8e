//! Elf module — Event Log File retrieval, schema-aware decode, record
//! construction, and the per-file processing pipeline.

pub mod decode;
pub mod descriptor;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod retrieve;

pub use decode::{FieldValue, Row};
pub use descriptor::{LogDescriptor, TypeTag};
pub use error::IngestError;
pub use pipeline::{BatchSummary, Pipeline};
pub use record::Record;
pub use retrieve::DownloadedLog;
