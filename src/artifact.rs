//! Result payload wrapping and one-shot local saves.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Fixed filename used when the result is saved locally.
pub const RESULT_FILENAME: &str = "resultados_ordenados.xlsx";

/// Locally resolvable reference to a materialized result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactRef {
    pub id: Uuid,
    pub path: PathBuf,
}

/// Binary result of a successful upload, addressable until invalidated.
///
/// Pass-through byte container: the payload is never parsed or validated.
pub struct ResultArtifact {
    id: Uuid,
    payload: Bytes,
    backing: NamedTempFile,
}

impl ResultArtifact {
    /// Wraps a response payload and writes it to a temp-file backing store.
    pub fn materialize(payload: Bytes) -> Result<Self> {
        let mut backing = tempfile::Builder::new()
            .prefix("ipcheck-result-")
            .suffix(".xlsx")
            .tempfile()
            .context("Failed to create backing file for result")?;

        backing
            .write_all(&payload)
            .context("Failed to write result payload to backing file")?;
        backing
            .flush()
            .context("Failed to flush result backing file")?;

        let id = Uuid::new_v4();
        tracing::debug!(%id, bytes = payload.len(), "result materialized");

        Ok(Self {
            id,
            payload,
            backing,
        })
    }

    pub fn handle(&self) -> ArtifactRef {
        ArtifactRef {
            id: self.id,
            path: self.backing.path().to_path_buf(),
        }
    }

    pub fn len(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Copies the payload to `dir/resultados_ordenados.xlsx` and returns the
    /// written path. This is the client-local download action.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let destination = dir.join(RESULT_FILENAME);
        std::fs::write(&destination, &self.payload).context(format!(
            "Failed to save results to {}",
            destination.display()
        ))?;
        Ok(destination)
    }

    /// Releases the backing file. Must run before a replacement artifact is
    /// created; dropping the artifact also removes the file.
    pub fn invalidate(self) {
        let path = self.backing.path().to_path_buf();
        if let Err(err) = self.backing.close() {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to remove result backing file"
            );
        }
    }
}
