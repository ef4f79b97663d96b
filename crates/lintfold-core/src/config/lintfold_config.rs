//! Engine configuration types
//!
//! These control how the engine composes fragments, not what the fragments
//! say: the array merge policy for settings and parser options, and plugins
//! the loader vouches for on behalf of every fragment.

use crate::loader::DocumentFormat;
use crate::result::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level lintfold configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LintfoldConfig {
    /// JSON schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "JSON schema reference")]
    pub schema: Option<String>,

    /// How settings and parser options are merged
    #[serde(default)]
    #[schemars(description = "Merge policy for settings and parserOptions")]
    pub merge: MergePolicy,

    /// Fragment validation options
    #[serde(default)]
    #[schemars(description = "Fragment validation options")]
    pub validation: ValidationOptions,
}

/// What happens when two layers both set an array value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArrayMerge {
    /// The later array replaces the earlier one wholesale
    #[default]
    Replace,
    /// Items of the later array not already present are appended
    Concat,
}

/// Which map a setting lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Settings,
    ParserOptions,
}

impl SettingsSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsSection::Settings => "settings",
            SettingsSection::ParserOptions => "parserOptions",
        }
    }
}

/// Array merge policy, with per-namespace exceptions
///
/// Namespaces are the top-level keys of `settings` / `parserOptions`
/// (e.g. `import/extensions`); the strategy applies to every array found
/// anywhere beneath that key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergePolicy {
    /// Default strategy for arrays
    #[serde(default)]
    #[schemars(description = "Default strategy for array values: 'replace' or 'concat'")]
    pub arrays: ArrayMerge,

    /// Per-namespace strategy for `settings`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(description = "Array strategy per top-level settings namespace")]
    pub settings: BTreeMap<String, ArrayMerge>,

    /// Per-namespace strategy for `parserOptions`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(description = "Array strategy per top-level parserOptions key")]
    pub parser_options: BTreeMap<String, ArrayMerge>,
}

impl MergePolicy {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Strategy for arrays under `namespace` in `section`
    pub fn array_strategy(&self, section: SettingsSection, namespace: &str) -> ArrayMerge {
        let exceptions = match section {
            SettingsSection::Settings => &self.settings,
            SettingsSection::ParserOptions => &self.parser_options,
        };
        exceptions.get(namespace).copied().unwrap_or(self.arrays)
    }
}

/// Fragment validation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Plugins treated as declared by every fragment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(description = "Plugins provided by the loader, treated as declared by every fragment")]
    pub ambient_plugins: Vec<String>,
}

impl LintfoldConfig {
    /// Load configuration from a file
    ///
    /// Supports JSON, JSONC/JSON5, YAML and TOML, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::LintfoldError::io_error(path, e))?;
        format.parse(path, &content)
    }

    /// Render the JSON schema for this configuration
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(LintfoldConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_to_replace() {
        let policy = MergePolicy::default();
        assert_eq!(
            policy.array_strategy(SettingsSection::Settings, "import/extensions"),
            ArrayMerge::Replace
        );
    }

    #[test]
    fn test_policy_namespace_exceptions() {
        let config: LintfoldConfig = serde_json::from_str(
            r#"{
                "merge": {
                    "arrays": "replace",
                    "settings": { "import/extensions": "concat" },
                    "parserOptions": { "extraFileExtensions": "concat" }
                },
                "validation": { "ambientPlugins": ["import"] }
            }"#,
        )
        .unwrap();

        let policy = &config.merge;
        assert_eq!(
            policy.array_strategy(SettingsSection::Settings, "import/extensions"),
            ArrayMerge::Concat
        );
        assert_eq!(
            policy.array_strategy(SettingsSection::Settings, "import/parsers"),
            ArrayMerge::Replace
        );
        assert_eq!(
            policy.array_strategy(SettingsSection::ParserOptions, "extraFileExtensions"),
            ArrayMerge::Concat
        );
        assert_eq!(config.validation.ambient_plugins, vec!["import"]);
    }

    #[test]
    fn test_array_merge_serialization() {
        let json = serde_json::to_string(&ArrayMerge::Concat).unwrap();
        assert_eq!(json, r#""concat""#);
    }

    #[test]
    fn test_json_schema_mentions_sections() {
        let schema = LintfoldConfig::json_schema().unwrap();
        assert!(schema.contains("merge"));
        assert!(schema.contains("ambientPlugins"));
    }
}
