//! Retrieve — stream one remote export into a disposable on-disk buffer.
//!
//! A [`DownloadedLog`] owns its spool file for the lifetime of one file's
//! processing. Release is scoped: dropping the value closes and deletes the
//! buffer exactly once, on success and on every error path alike.

use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::client::api::LogDownload;
use crate::elf::descriptor::{LogDescriptor, TypeTag};
use crate::elf::error::IngestError;

/// One fetched Event Log File: its column-type manifest, event type, and
/// the spooled CSV content.
#[derive(Debug)]
pub struct DownloadedLog {
    pub field_types: Vec<TypeTag>,
    pub event_type: String,
    spool: NamedTempFile,
}

impl DownloadedLog {
    /// Fresh read handle positioned at the start of the buffer.
    pub fn open_reader(&self) -> std::io::Result<File> {
        self.spool.reopen()
    }

    /// On-disk location of the spool buffer. Gone once `self` drops.
    pub fn path(&self) -> &Path {
        self.spool.path()
    }
}

/// Fetch one descriptor's export into a spool buffer under `spool_dir`.
///
/// A download failure propagates for this descriptor alone; the partially
/// written buffer is dropped with the error, never leaked.
pub async fn retrieve(
    client: &dyn LogDownload,
    descriptor: &LogDescriptor,
    spool_dir: &Path,
) -> Result<DownloadedLog, IngestError> {
    info!(
        id = %descriptor.id,
        event_type = %descriptor.event_type,
        log_file = %descriptor.log_file,
        log_date = %descriptor.log_date,
        log_file_length = descriptor.log_file_length,
        log_file_field_types = %descriptor.log_file_field_types,
        "retrieving event log file"
    );

    let spool = tempfile::Builder::new()
        .prefix("elf-")
        .suffix(".csv")
        .tempfile_in(spool_dir)?;

    // Independent write handle; the spool keeps its own for reopening.
    let mut sink = tokio::fs::File::from_std(spool.as_file().try_clone()?);
    let bytes = client
        .stream_download(&descriptor.log_file, &mut sink)
        .await?;
    debug!(id = %descriptor.id, bytes, "export spooled");

    Ok(DownloadedLog {
        field_types: descriptor.field_types(),
        event_type: descriptor.event_type.clone(),
        spool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeCrm;
    use std::io::Read;

    fn descriptor(types: &str) -> LogDescriptor {
        LogDescriptor {
            id: "0AT000000000001".to_string(),
            event_type: "Login".to_string(),
            log_file: "/logs/0AT000000000001".to_string(),
            log_date: "2021-05-01T00:00:00.000Z".to_string(),
            log_file_length: 64,
            log_file_field_types: types.to_string(),
        }
    }

    #[tokio::test]
    async fn test_retrieve_spools_content_at_start() {
        let crm = FakeCrm::new();
        let desc = descriptor("String,Number");
        crm.add_log(desc.clone(), "A,B\nx,1\n").await;
        let spool_dir = tempfile::tempdir().unwrap();

        let log = retrieve(&crm, &desc, spool_dir.path()).await.unwrap();
        assert_eq!(log.field_types, vec![TypeTag::String, TypeTag::Number]);
        assert_eq!(log.event_type, "Login");
        assert!(log.path().exists());

        let mut content = String::new();
        log.open_reader()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "A,B\nx,1\n");
    }

    #[tokio::test]
    async fn test_buffer_released_on_drop() {
        let crm = FakeCrm::new();
        let desc = descriptor("String");
        crm.add_log(desc.clone(), "A\nx\n").await;
        let spool_dir = tempfile::tempdir().unwrap();

        let log = retrieve(&crm, &desc, spool_dir.path()).await.unwrap();
        let path = log.path().to_path_buf();
        assert!(path.exists());
        drop(log);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaks_no_buffer() {
        let crm = FakeCrm::new();
        let desc = descriptor("String");
        crm.add_log(desc.clone(), "A\nx\n").await;
        crm.fail_download(&desc.log_file).await;
        let spool_dir = tempfile::tempdir().unwrap();

        let err = retrieve(&crm, &desc, spool_dir.path()).await.unwrap_err();
        assert!(matches!(err, IngestError::Download(_)));

        let leftover = std::fs::read_dir(spool_dir.path()).unwrap().count();
        assert_eq!(leftover, 0);
    }
}
