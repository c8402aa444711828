//! Configuration file support for versioner.
//!
//! Settings are read from the file passed with `--config`, or from
//! `versioner.toml` in the working directory when it exists. Command-line
//! flags take precedence over anything loaded here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "versioner.toml";

/// Default number of concurrent compile workers.
pub const DEFAULT_JOBS: usize = 8;

/// Versioner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the clang binary used as the front end
    pub clang: Option<PathBuf>,

    /// Number of concurrent compile workers
    pub jobs: usize,

    /// Additional front-end flags, appended after the standard set
    pub cflags: Vec<String>,

    /// Header force-included into every compile
    pub inject_header: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clang: None,
            jobs: DEFAULT_JOBS,
            cflags: Vec::new(),
            inject_header: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load; the implicit `versioner.toml` in `cwd` is
    /// best-effort.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default(&cwd.join(CONFIG_FILE_NAME))),
        }
    }

    /// Worker count, never zero.
    pub fn jobs(&self) -> usize {
        self.jobs.max(1)
    }
}
