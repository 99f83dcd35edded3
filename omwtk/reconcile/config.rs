use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// Settings for a reconciliation run, usually read from `reconcile.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconcileConfig {
    /// Synsets classified concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Upper bound for a single repository call, in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Stop scheduling ids after the first per-synset failure.
    #[serde(default)]
    pub fail_fast: bool,
    /// Language of the edit side-table rows used for attribution.
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Optional file restricting the run to listed synset ids.
    #[serde(default)]
    pub ids_path: Option<PathBuf>,
    /// Optional JSON-lines log destination.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            fail_fast: false,
            lang: default_lang(),
            ids_path: None,
            log_path: None,
        }
    }
}

impl ReconcileConfig {
    /// Loads configuration from a TOML file. Relative paths inside it are
    /// resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading reconcile config {}", path.display()))?;
        let mut config = Self::from_toml(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        let base = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        for candidate in [&mut config.ids_path, &mut config.log_path]
            .into_iter()
            .flatten()
        {
            if candidate.is_relative() {
                *candidate = base.join(&*candidate);
            }
        }
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.concurrency > 0, "concurrency must be at least 1");
        ensure!(self.fetch_timeout_ms > 0, "fetch_timeout_ms must be positive");
        ensure!(!self.lang.trim().is_empty(), "lang cannot be empty");
        Ok(())
    }

    /// Repository call timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

const fn default_concurrency() -> usize {
    8
}

const fn default_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_lang() -> String {
    "eng".into()
}
