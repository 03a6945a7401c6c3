//! Runtime configuration
//!
//! Supplied from outside (CLI flags / environment) and passed explicitly into
//! the service. Nothing here is read from ambient global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::ServiceError;

/// Default wall-clock budget for one search
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(1);

/// Default cap on match events per search
pub const DEFAULT_MAX_RESULTS: usize = 2000;

/// Default search executable, resolved through PATH
pub const DEFAULT_RG_PROGRAM: &str = "rg";

/// Largest file the view operation will read (16 MB)
pub const DEFAULT_MAX_VIEW_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory searched and viewed; required for every operation
    pub root: Option<PathBuf>,
    pub time_limit: Duration,
    pub max_results: usize,
    pub rg_program: PathBuf,
    pub max_view_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            time_limit: DEFAULT_TIME_LIMIT,
            max_results: DEFAULT_MAX_RESULTS,
            rg_program: PathBuf::from(DEFAULT_RG_PROGRAM),
            max_view_bytes: DEFAULT_MAX_VIEW_BYTES,
        }
    }
}

impl Config {
    /// Default configuration rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// The configured root, or the configuration error a host reports as 500
    pub fn require_root(&self) -> Result<&Path, ServiceError> {
        let root = self
            .root
            .as_deref()
            .ok_or_else(|| ServiceError::Config("the root path configuration is required".into()))?;

        if !root.is_absolute() {
            return Err(ServiceError::Config(format!(
                "the root path must be absolute: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(ServiceError::Config(format!(
                "the root path is not a directory: {}",
                root.display()
            )));
        }

        Ok(root)
    }
}
