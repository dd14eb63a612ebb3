//! Single-file intake with an extension accept filter.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::ffi::OsStr;
use std::path::Path;

/// Only spreadsheets with this extension pass the accept filter.
pub const ACCEPTED_EXTENSION: &str = "xlsx";

/// Case-insensitive accept filter matching the drop-zone contract.
/// Callers silently ignore non-matching names; no error surfaces.
pub fn is_accepted(name: &str) -> bool {
    let accepted = Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));

    if !accepted {
        tracing::debug!(name, "file rejected by accept filter");
    }

    accepted
}

/// The currently selected, not-yet-uploaded file.
#[derive(Clone, Debug)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Bytes,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Loads a file from disk for CLI submission.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(OsStr::to_str)
            .context(format!("Invalid file name: {}", path.display()))?
            .to_string();

        let contents = tokio::fs::read(path)
            .await
            .context(format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            name,
            bytes: Bytes::from(contents),
        })
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
