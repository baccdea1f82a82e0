//! Configuration Management
//!
//! Settings are read once at startup. Precedence for the output bucket:
//! CLI flag > `OUTPUT_BUCKET` environment variable > config file.

use crate::gcp::client::Endpoints;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the destination bucket
pub const OUTPUT_BUCKET_ENV: &str = "OUTPUT_BUCKET";

/// File configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Bucket that receives rendered declarations
    #[serde(default)]
    pub output_bucket: Option<String>,
    /// Service endpoint overrides
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` only for dry runs
    pub output_bucket: Option<String>,
    pub endpoints: Endpoints,
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tfrec").join("config.json"))
    }

    /// Load configuration from an explicit path, or from the default path
    /// when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides and validate
    pub fn resolve(
        self,
        env_bucket: Option<String>,
        cli_bucket: Option<String>,
        dry_run: bool,
    ) -> Result<Settings> {
        let output_bucket = cli_bucket
            .or(env_bucket)
            .or(self.output_bucket)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        if output_bucket.is_none() && !dry_run {
            return Err(anyhow::anyhow!(
                "No output bucket configured. Set {} or use --output-bucket",
                OUTPUT_BUCKET_ENV
            ));
        }

        Ok(Settings {
            output_bucket,
            endpoints: self.endpoints.validated()?,
        })
    }

    /// Resolve against the process environment
    pub fn resolve_from_env(self, cli_bucket: Option<String>, dry_run: bool) -> Result<Settings> {
        let env_bucket = std::env::var(OUTPUT_BUCKET_ENV).ok();
        self.resolve(env_bucket, cli_bucket, dry_run)
    }
}
