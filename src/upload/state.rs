//! Session state machine for one upload at a time.
//!
//! All mutation funnels through `CheckSession`; completion callbacks carry the
//! attempt id handed out by `begin_attempt` and are discarded when it no
//! longer matches (the single-flight guard). A reset does not cancel the
//! underlying request, it only makes its callbacks stale.

use crate::artifact::{ArtifactRef, ResultArtifact};
use crate::common::progress::{SessionSnapshot, UploadStatus};
use crate::upload::intake::PendingFile;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Fixed user-facing message for any upload failure.
pub const UPLOAD_ERROR_MESSAGE: &str = "An error occurred while verifying IPs. Please try again.";

#[derive(Default)]
struct Inner {
    pending: Option<PendingFile>,
    status: UploadStatus,
    progress: u8,
    error: Option<String>,
    artifact: Option<ResultArtifact>,
    file_uploaded: bool,
    attempt: u64,
}

/// Shared session state for the upload lifecycle.
///
/// Cloning is shallow; all clones observe the same session.
#[derive(Clone, Default)]
pub struct CheckSession {
    inner: Arc<RwLock<Inner>>,
}

impl CheckSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a file that passed the intake filter. Replaces any pending
    /// file, clears prior result and error, and sets the uploaded indicator.
    pub fn select_file(&self, file: PendingFile) {
        let mut inner = self.write();

        if let Some(previous) = inner.artifact.take() {
            previous.invalidate();
        }

        tracing::debug!(name = %file.name, size = file.len(), "file selected");
        inner.pending = Some(file);
        inner.error = None;
        inner.progress = 0;
        inner.file_uploaded = true;
        if inner.status != UploadStatus::Uploading {
            inner.status = UploadStatus::Idle;
        }
    }

    /// Starts a new attempt, returning its id and the file to send.
    ///
    /// Returns `None` (no-op) when no file is pending or a transfer is
    /// already in flight. Any previous result handle is invalidated before
    /// the attempt begins.
    pub fn begin_attempt(&self) -> Option<(u64, PendingFile)> {
        let mut inner = self.write();

        if inner.status == UploadStatus::Uploading {
            tracing::warn!("submit ignored: an upload is already in flight");
            return None;
        }
        let Some(file) = inner.pending.clone() else {
            tracing::debug!("submit ignored: no file selected");
            return None;
        };

        if let Some(previous) = inner.artifact.take() {
            previous.invalidate();
        }

        inner.attempt += 1;
        inner.status = UploadStatus::Uploading;
        inner.progress = 0;
        inner.error = None;

        Some((inner.attempt, file))
    }

    /// Publishes a progress value for an attempt. Stale attempts are
    /// discarded; within an attempt the value is clamped and monotonic.
    pub fn publish_progress(&self, attempt: u64, value: u8) {
        let mut inner = self.write();

        if inner.attempt != attempt {
            tracing::debug!(attempt, "discarding stale progress update");
            return;
        }
        if inner.status != UploadStatus::Uploading {
            return;
        }

        let value = value.min(100);
        if value > inner.progress {
            inner.progress = value;
        }
    }

    /// Records a successful transfer, materializing the result artifact.
    ///
    /// Returns `Ok(false)` when the attempt went stale and nothing changed.
    pub fn complete(&self, attempt: u64, payload: Bytes) -> Result<bool> {
        if self.read().attempt != attempt {
            tracing::debug!(attempt, "discarding stale completion");
            return Ok(false);
        }

        // Materialize outside the lock; temp-file creation can block.
        let artifact = ResultArtifact::materialize(payload)?;

        let mut inner = self.write();
        if inner.attempt != attempt {
            tracing::debug!(attempt, "discarding stale completion");
            artifact.invalidate();
            return Ok(false);
        }

        if let Some(previous) = inner.artifact.take() {
            previous.invalidate();
        }

        tracing::info!(attempt, "upload succeeded");
        inner.artifact = Some(artifact);
        inner.status = UploadStatus::Succeeded;
        Ok(true)
    }

    /// Records a failed transfer with the fixed user-facing message.
    /// No partial artifact is produced. Returns false for stale attempts.
    pub fn fail(&self, attempt: u64) -> bool {
        let mut inner = self.write();

        if inner.attempt != attempt {
            tracing::debug!(attempt, "discarding stale failure");
            return false;
        }

        inner.status = UploadStatus::Failed;
        inner.error = Some(UPLOAD_ERROR_MESSAGE.to_string());
        true
    }

    /// Unconditionally returns to the initial state: no file, `Idle`,
    /// progress 0, no error, no result, indicator cleared. The attempt
    /// counter is bumped so in-flight callbacks become stale.
    pub fn reset(&self) {
        let mut inner = self.write();

        if let Some(previous) = inner.artifact.take() {
            previous.invalidate();
        }

        let attempt = inner.attempt + 1;
        *inner = Inner {
            attempt,
            ..Inner::default()
        };
        tracing::debug!(attempt, "session reset");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        SessionSnapshot {
            status: inner.status,
            progress: inner.progress,
            error: inner.error.clone(),
            file_name: inner.pending.as_ref().map(|f| f.name.clone()),
            file_uploaded: inner.file_uploaded,
            has_result: inner.artifact.is_some(),
        }
    }

    /// Handle of the current result, if one exists.
    pub fn result_handle(&self) -> Option<ArtifactRef> {
        self.read().artifact.as_ref().map(ResultArtifact::handle)
    }

    /// Saves the current result under the fixed filename in `dir`.
    pub fn save_result(&self, dir: &Path) -> Result<PathBuf> {
        let inner = self.read();
        let artifact = inner
            .artifact
            .as_ref()
            .context("no result available to save")?;
        artifact.save_to(dir)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("session lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("session lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }
}
