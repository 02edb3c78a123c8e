//! Live — reqwest-backed client for the CRM bulk log API.
//!
//! Authenticates with a bearer token and streams log file bodies chunk by
//! chunk into the caller's sink, so a multi-hundred-megabyte export never
//! lives in memory.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::client::api::LogDownload;
use crate::client::error::DownloadError;
use crate::elf::descriptor::LogDescriptor;

const DESCRIPTOR_QUERY: &str = "SELECT Id, EventType, LogFile, LogDate, \
     LogFileLength, LogFileFieldTypes FROM EventLogFile WHERE CreatedDate >= ";

/// Shape of the API's query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    records: Vec<LogDescriptor>,
}

pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    token: String,
}

impl CrmClient {
    pub fn new(base_url: &str, api_version: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            token: token.to_string(),
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/services/data/v{}/query",
            self.base_url, self.api_version
        )
    }

    /// Log file references are host-relative paths.
    fn download_url(&self, reference: &str) -> String {
        format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
    }
}

#[async_trait]
impl LogDownload for CrmClient {
    async fn query_descriptors(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<LogDescriptor>, DownloadError> {
        let soql = format!(
            "{}{}",
            DESCRIPTOR_QUERY,
            since.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let response = self
            .http
            .get(self.query_url())
            .bearer_auth(&self.token)
            .query(&[("q", soql.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                reference: "query".to_string(),
            });
        }

        let body: QueryResponse = response.json().await?;
        debug!(descriptors = body.records.len(), "descriptor query complete");
        Ok(body.records)
    }

    async fn stream_download(
        &self,
        reference: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        let response = self
            .http
            .get(self.download_url(reference))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                reference: reference.to_string(),
            });
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        debug!(reference, bytes = written, "download drained");
        Ok(written)
    }
}
