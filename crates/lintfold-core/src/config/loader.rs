//! Configuration file discovery and loading

use super::lintfold_config::LintfoldConfig;
use crate::error::LintfoldError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// Config file names in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".lintfoldrc.json",
    ".lintfoldrc.toml",
    "lintfold.yaml",
    "lintfold.yml",
    "lintfold.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Tries each name in [`CONFIG_FILE_NAMES`] in every directory, starting
    /// from the given one and moving up until a config is found or the
    /// filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| LintfoldError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<LintfoldConfig> {
        LintfoldConfig::load(path).map_err(|e| {
            LintfoldError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from path or auto-discover
    ///
    /// An explicit path must exist. Without one, discovery starts at
    /// `start_dir` (or the current directory); finding nothing yields the
    /// default configuration.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<LintfoldConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(LintfoldError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(LintfoldConfig::default())
            }
        }
    }
}
