//! Runtime configuration from environment variables
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! | Variable                                   | Default                        |
//! |--------------------------------------------|--------------------------------|
//! | `CAREER_COMPASS_DATA_DIR`                  | platform data dir              |
//! | `CAREER_COMPASS_STORAGE`                   | `file` (`file`/`sqlite`/`memory`) |
//! | `CAREER_COMPASS_RETENTION_DAYS`            | 30                             |
//! | `CAREER_COMPASS_CLOCK_SKEW_SECS`           | 300                            |
//! | `CAREER_COMPASS_ENRICHMENT_URL`            | unset (enrichment disabled)    |
//! | `CAREER_COMPASS_ENRICHMENT_API_KEY`        | unset                          |
//! | `CAREER_COMPASS_ENRICHMENT_TIMEOUT_SECS`   | 30                             |

use crate::storage::StorageConfig;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "CAREER_COMPASS_DATA_DIR";
pub const ENV_STORAGE: &str = "CAREER_COMPASS_STORAGE";
pub const ENV_RETENTION_DAYS: &str = "CAREER_COMPASS_RETENTION_DAYS";
pub const ENV_CLOCK_SKEW_SECS: &str = "CAREER_COMPASS_CLOCK_SKEW_SECS";
pub const ENV_ENRICHMENT_URL: &str = "CAREER_COMPASS_ENRICHMENT_URL";
pub const ENV_ENRICHMENT_API_KEY: &str = "CAREER_COMPASS_ENRICHMENT_API_KEY";
pub const ENV_ENRICHMENT_TIMEOUT_SECS: &str = "CAREER_COMPASS_ENRICHMENT_TIMEOUT_SECS";

const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_CLOCK_SKEW_SECS: i64 = 300;
const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 30;

/// Which key-value backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown storage backend '{}' (expected file, sqlite or memory)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    /// Endpoint URL; enrichment is disabled when unset
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_ENRICHMENT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub retention_days: i64,
    pub clock_skew_secs: i64,
    pub enrichment: EnrichmentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: crate::utils::default_data_dir(),
            storage: StorageBackend::default(),
            retention_days: DEFAULT_RETENTION_DAYS,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(storage) = get(ENV_STORAGE) {
            config.storage = storage.parse()?;
        }
        if let Some(days) = get(ENV_RETENTION_DAYS) {
            let days = parse_positive(ENV_RETENTION_DAYS, &days)?;
            retention(days)
                .with_context(|| format!("{} is out of range: {}", ENV_RETENTION_DAYS, days))?;
            config.retention_days = days;
        }
        if let Some(secs) = get(ENV_CLOCK_SKEW_SECS) {
            let secs = secs
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|s| *s >= 0)
                .with_context(|| format!("{} must be a non-negative integer", ENV_CLOCK_SKEW_SECS))?;
            clock_skew(secs)
                .with_context(|| format!("{} is out of range: {}", ENV_CLOCK_SKEW_SECS, secs))?;
            config.clock_skew_secs = secs;
        }

        config.enrichment.url = get(ENV_ENRICHMENT_URL);
        config.enrichment.api_key = get(ENV_ENRICHMENT_API_KEY);
        if let Some(secs) = get(ENV_ENRICHMENT_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_ENRICHMENT_TIMEOUT_SECS, &secs)?;
            config.enrichment.timeout = Duration::from_secs(secs as u64);
        }

        Ok(config)
    }

    /// Storage policy; values beyond what a timestamp can represent saturate
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            retention: retention(self.retention_days).unwrap_or(chrono::Duration::MAX),
            clock_skew: clock_skew(self.clock_skew_secs).unwrap_or(chrono::Duration::MAX),
            ..StorageConfig::default()
        }
    }
}

/// Retention window, or `None` when it reaches past the earliest representable date
fn retention(days: i64) -> Option<chrono::Duration> {
    chrono::Duration::try_days(days).filter(|d| Utc::now().checked_sub_signed(*d).is_some())
}

/// Clock skew tolerance, or `None` when it reaches past the latest representable date
fn clock_skew(secs: i64) -> Option<chrono::Duration> {
    chrono::Duration::try_seconds(secs).filter(|d| Utc::now().checked_add_signed(*d).is_some())
}

fn parse_positive(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .with_context(|| format!("{} must be a positive integer, got '{}'", name, value))
}
