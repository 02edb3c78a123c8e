//! Client module — the CRM bulk log API seam.

pub mod api;
pub mod error;
pub mod fake;
pub mod live;

pub use api::LogDownload;
pub use error::DownloadError;
pub use fake::FakeCrm;
pub use live::CrmClient;
