//! Fragment document loading
//!
//! Reads rule-set fragment documents from disk into [`RuleSetFragment`]
//! values. Shape is checked here by serde; structural checks that need the
//! whole fragment (plugin namespaces, pattern syntax) belong to the validator.

use crate::error::LintfoldError;
use crate::fragment::RuleSetFragment;
use crate::result::Result;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

/// Document formats accepted for fragments and engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    /// JSON with comments and trailing commas (`.jsonc`, `.json5`)
    Json5,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DocumentFormat::Json),
            Some("jsonc") | Some("json5") => Ok(DocumentFormat::Json5),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("toml") => Ok(DocumentFormat::Toml),
            _ => Err(LintfoldError::fragment_parse(
                path,
                "unsupported file extension (expected .json, .jsonc, .json5, .yaml, .yml or .toml)",
            )),
        }
    }

    /// Deserialize `content`; `path` is only used for error reporting
    pub fn parse<T: DeserializeOwned>(&self, path: &Path, content: &str) -> Result<T> {
        let parsed = match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Json5 => json5::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| LintfoldError::fragment_parse(path, message))
    }
}

/// Loads fragment documents from the filesystem
pub struct FragmentLoader;

impl FragmentLoader {
    /// Load one fragment; its id defaults to the file stem
    pub fn load_file(path: &Path) -> Result<RuleSetFragment> {
        let format = DocumentFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| LintfoldError::io_error(path, e))?;
        let default_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        Self::load_str(format, path, default_id, &content)
    }

    /// Parse fragment text in the given format
    pub fn load_str(
        format: DocumentFormat,
        path: &Path,
        default_id: &str,
        content: &str,
    ) -> Result<RuleSetFragment> {
        let mut fragment: RuleSetFragment = format.parse(path, content)?;
        if fragment.id.is_empty() {
            fragment.id = default_id.to_string();
        }

        for key in fragment.ignored.keys() {
            warn!(
                fragment = %fragment.id,
                key = %key,
                "Ignoring key not interpreted by the composition engine"
            );
        }
        debug!(
            fragment = %fragment.id,
            rules = fragment.rules.len(),
            overrides = fragment.overrides.len(),
            "Loaded fragment"
        );

        Ok(fragment)
    }

    /// Load fragments in the given order
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RuleSetFragment>> {
        paths.iter().map(|p| Self::load_file(p.as_ref())).collect()
    }
}
