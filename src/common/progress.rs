//! Upload status and presentation snapshot types.

/// Lifecycle of one upload attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadStatus {
    /// True while a transfer is in flight; the UI disables its trigger then.
    pub fn is_uploading(self) -> bool {
        matches!(self, UploadStatus::Uploading)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed)
    }
}

/// Immutable view of the session for presentation consumers.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub file_name: Option<String>,
    pub file_uploaded: bool,
    pub has_result: bool,
}

impl SessionSnapshot {
    pub fn has_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// Percent complete, rounded to the nearest integer.
/// Zero totals report 0; values never exceed 100.
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((sent as f64 * 100.0) / total as f64).round().min(100.0) as u8
}
