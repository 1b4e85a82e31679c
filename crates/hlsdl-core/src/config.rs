use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Global configuration loaded from `~/.config/hlsdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsdlConfig {
    /// Maximum number of segment downloads in flight at once.
    pub threads: usize,
    /// Number of retry rounds after the initial pass.
    pub max_retry: u32,
    /// Per-request timeout in seconds (playlist and segment GETs).
    pub timeout_secs: u64,
    /// Run the transport-stream sync check on every downloaded segment.
    pub validate: bool,
    /// Directory for per-segment staging files.
    pub staging_dir: PathBuf,
    /// Default output file when none is given on the command line.
    pub output: PathBuf,
    /// Backoff unit in seconds; retry round `n` sleeps `n * unit` first.
    #[serde(default = "default_backoff_unit_secs")]
    pub backoff_unit_secs: f64,
}

fn default_backoff_unit_secs() -> f64 {
    1.0
}

impl Default for HlsdlConfig {
    fn default() -> Self {
        Self {
            threads: 10,
            max_retry: 5,
            timeout_secs: 30,
            validate: true,
            staging_dir: PathBuf::from("downloads"),
            output: PathBuf::from("output.ts"),
            backoff_unit_secs: default_backoff_unit_secs(),
        }
    }
}

/// Read-only settings for one pipeline run. Built by the CLI from
/// `HlsdlConfig` plus command-line overrides.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub threads: usize,
    pub max_retry: u32,
    pub timeout: Duration,
    pub validate: bool,
    pub staging_dir: PathBuf,
    pub output: PathBuf,
    pub backoff_unit: Duration,
}

impl RunConfig {
    pub fn from_config(cfg: &HlsdlConfig) -> Self {
        Self {
            threads: cfg.threads.max(1),
            max_retry: cfg.max_retry,
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            validate: cfg.validate,
            staging_dir: cfg.staging_dir.clone(),
            output: cfg.output.clone(),
            backoff_unit: Duration::try_from_secs_f64(cfg.backoff_unit_secs)
                .unwrap_or(Duration::from_secs(1)),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_rounds: self.max_retry,
            backoff_unit: self.backoff_unit,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_config(&HlsdlConfig::default())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HlsdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HlsdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HlsdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
