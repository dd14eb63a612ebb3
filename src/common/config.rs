//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MAX_CHUNK_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_TIMEOUT_SECS: u64 = 3600;

const DEFAULT_TRANSFER: TransferSettings = TransferSettings {
    chunk_size: 64 * 1024,
};

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "ipcheck")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("ipcheck.toml"))
}

/// Transfer tuning for the upload request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Granularity of upload progress events, in bytes.
    pub chunk_size: u64,
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Verification service URL. Not validated at load time; an empty or
    /// unreachable endpoint surfaces as a network error at submit time.
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Directory where the result spreadsheet is saved.
    pub output_dir: PathBuf,
    pub transfer: TransferSettings,
}

impl AppConfig {
    /// Validates transfer and timeout bounds and rejects unsafe values.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.transfer.chunk_size > 0,
            "Invalid config: transfer.chunk_size must be > 0"
        );
        ensure!(
            self.transfer.chunk_size <= MAX_CHUNK_SIZE_BYTES,
            "Invalid config: transfer.chunk_size must be <= {MAX_CHUNK_SIZE_BYTES}"
        );
        ensure!(
            self.timeout_secs >= 1,
            "Invalid config: timeout_secs must be >= 1"
        );
        ensure!(
            self.timeout_secs <= MAX_TIMEOUT_SECS,
            "Invalid config: timeout_secs must be <= {MAX_TIMEOUT_SECS}"
        );
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 300,
            output_dir: PathBuf::from("."),
            transfer: DEFAULT_TRANSFER,
        }
    }
}

/// Runtime overrides collected from CLI arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("IPCHECK_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> AppConfig {
    if let Some(endpoint) = &overrides.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(output_dir) = &overrides.output_dir {
        config.output_dir = output_dir.clone();
    }
    config
}
