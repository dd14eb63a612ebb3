pub mod config;
pub mod progress;

pub use config::{apply_overrides, load_config, AppConfig, ConfigOverrides, TransferSettings};
pub use progress::{percent, SessionSnapshot, UploadStatus};
