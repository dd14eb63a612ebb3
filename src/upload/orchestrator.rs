//! Drives the multipart upload and feeds progress back into the session.

use crate::common::config::{AppConfig, TransferSettings};
use crate::common::progress::percent;
use crate::upload::intake::PendingFile;
use crate::upload::state::CheckSession;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::Stream;
use reqwest::{multipart, Body, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Transfer failure kinds. Both collapse to the same user-facing message;
/// the distinction exists for logs only.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service returned {0}")]
    Status(StatusCode),
}

/// Result of a `submit` call as observed by the caller.
///
/// `Ignored` covers the no-op cases: no pending file, an upload already in
/// flight, or a completion that went stale after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Succeeded,
    Failed,
}

/// Upload orchestrator bound to one configured endpoint.
pub struct Uploader {
    client: Client,
    endpoint: String,
    transfer: TransferSettings,
}

impl Uploader {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            transfer: config.transfer,
        })
    }

    /// Submits the session's pending file to the endpoint.
    ///
    /// No-op when the session refuses a new attempt. The response body is
    /// treated as opaque bytes. Transport errors, timeouts, and non-2xx
    /// statuses all record the same failure; nothing retries automatically.
    /// The outcome is also recorded in the session, so this never errors.
    pub async fn submit(&self, session: &CheckSession) -> SubmitOutcome {
        let Some((attempt, file)) = session.begin_attempt() else {
            return SubmitOutcome::Ignored;
        };

        tracing::debug!(attempt, file = %file.name, size = file.len(), "starting upload");

        match self.transfer(&file, attempt, session).await {
            Ok(payload) => {
                let applied = match session.complete(attempt, payload) {
                    Ok(applied) => applied,
                    Err(err) => {
                        tracing::warn!(attempt, error = %err, "failed to materialize result");
                        session.fail(attempt);
                        return SubmitOutcome::Failed;
                    }
                };

                if applied {
                    SubmitOutcome::Succeeded
                } else {
                    SubmitOutcome::Ignored
                }
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "upload failed");
                if session.fail(attempt) {
                    SubmitOutcome::Failed
                } else {
                    SubmitOutcome::Ignored
                }
            }
        }
    }

    async fn transfer(
        &self,
        file: &PendingFile,
        attempt: u64,
        session: &CheckSession,
    ) -> std::result::Result<Bytes, UploadError> {
        let publish_session = session.clone();
        let stream = progress_stream(
            file.bytes.clone(),
            self.transfer.chunk_size as usize,
            move |value| publish_session.publish_progress(attempt, value),
        );

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), file.len())
            .file_name(file.name.clone())
            .mime_str(XLSX_MIME)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }

        Ok(response.bytes().await?)
    }
}

/// Splits the payload into chunks and publishes rounded percent values as
/// each chunk is handed to the transport. Empty payloads publish nothing.
fn progress_stream(
    bytes: Bytes,
    chunk_size: usize,
    publish: impl FnMut(u8) + Send + 'static,
) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static {
    let total = bytes.len() as u64;
    let chunk_size = chunk_size.max(1);

    futures::stream::unfold(
        (bytes, 0usize, publish),
        move |(bytes, offset, mut publish)| async move {
            if offset >= bytes.len() {
                return None;
            }

            let end = (offset + chunk_size).min(bytes.len());
            let chunk = bytes.slice(offset..end);
            publish(percent(end as u64, total));

            Some((Ok(chunk), (bytes, end, publish)))
        },
    )
}
