//! Fake — test double for the CRM bulk log API.
//!
//! Provides a deterministic [`FakeCrm`] that implements [`LogDownload`]
//! from in-memory state. Useful for unit-testing the pipeline without a
//! reachable CRM instance.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::client::api::LogDownload;
use crate::client::error::DownloadError;
use crate::elf::descriptor::LogDescriptor;

/// Mutable inner state protected by a mutex.
#[derive(Default)]
struct Inner {
    descriptors: Vec<LogDescriptor>,
    bodies: HashMap<String, Bytes>,
    failing: HashSet<String>,
    downloads: u64,
}

/// A fake CRM client serving canned exports.
///
/// Seed descriptors and CSV bodies before running test code; mark
/// references as failing to exercise error paths.
pub struct FakeCrm {
    inner: Mutex<Inner>,
}

impl FakeCrm {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed one export: its descriptor plus the CSV body behind its
    /// download reference.
    pub async fn add_log(&self, descriptor: LogDescriptor, body: &str) {
        let mut state = self.inner.lock().await;
        state
            .bodies
            .insert(descriptor.log_file.clone(), Bytes::copy_from_slice(body.as_bytes()));
        state.descriptors.push(descriptor);
    }

    /// Make downloads of `reference` fail with a 503.
    pub async fn fail_download(&self, reference: &str) {
        self.inner.lock().await.failing.insert(reference.to_string());
    }

    /// Number of download attempts so far.
    pub async fn download_count(&self) -> u64 {
        self.inner.lock().await.downloads
    }
}

impl Default for FakeCrm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogDownload for FakeCrm {
    async fn query_descriptors(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<LogDescriptor>, DownloadError> {
        Ok(self.inner.lock().await.descriptors.clone())
    }

    async fn stream_download(
        &self,
        reference: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        let body = {
            let mut state = self.inner.lock().await;
            state.downloads += 1;
            if state.failing.contains(reference) {
                return Err(DownloadError::Status {
                    status: 503,
                    reference: reference.to_string(),
                });
            }
            state
                .bodies
                .get(reference)
                .cloned()
                .ok_or_else(|| DownloadError::UnknownReference(reference.to_string()))?
        };

        // Write in two chunks to keep the streaming path honest.
        let split = body.len() / 2;
        sink.write_all(&body[..split]).await?;
        sink.write_all(&body[split..]).await?;
        sink.flush().await?;
        Ok(body.len() as u64)
    }
}
