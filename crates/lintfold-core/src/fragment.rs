//! Rule-set fragment data model
//!
//! A fragment is one independently authored rule-set document: the plugins
//! it relies on, its rule settings, shared settings, parser options and any
//! file-scoped override blocks. Fragments are the unit of composition input
//! and are never mutated by the engine.
//!
//! The serde representation accepts the shapes found in ESLint-style
//! documents:
//!
//! ```jsonc
//! {
//!   "plugins": ["jest"],
//!   "rules": {
//!     "jest/expect-expect": "warn",
//!     "jest/valid-title": ["error", { "ignoreTypeOfDescribeName": true }],
//!     "no-console": 2
//!   },
//!   "settings": { "import/resolver": { "node": { "extensions": [".js"] } } },
//!   "overrides": [
//!     { "files": ["*.test.js"], "rules": { "no-console": "off" } }
//!   ]
//! }
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Mapping from rule key to its setting, in declaration order
pub type RuleMap = IndexMap<RuleKey, RuleSetting>;

/// Mapping from setting namespace to an arbitrary value, in declaration order
pub type SettingsMap = serde_json::Map<String, Value>;

/// Rule severity levels
///
/// The ordering `Off < Warn < Error` is used when describing conflicts. It
/// plays no part in precedence, which is decided by input order alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disable the rule
    Off,
    /// Report without failing
    Warn,
    /// Report and fail
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Parse a severity from any of its accepted spellings
    ///
    /// Accepts `"off" | "warn" | "error"` (case-insensitive), `0 | 1 | 2`,
    /// `null` as a synonym for `off`, and the Stylelint booleans: `true`
    /// enables the rule at `error`, `false` turns it off.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null | Value::Bool(false) => Ok(Severity::Off),
            Value::Bool(true) => Ok(Severity::Error),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "off" => Ok(Severity::Off),
                "warn" => Ok(Severity::Warn),
                "error" => Ok(Severity::Error),
                other => Err(format!(
                    "unknown severity '{other}', expected off, warn or error"
                )),
            },
            Value::Number(n) => {
                let level = n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && (0.0..=2.0).contains(f))
                        .map(|f| f as i64)
                });
                match level {
                    Some(0) => Ok(Severity::Off),
                    Some(1) => Ok(Severity::Warn),
                    Some(2) => Ok(Severity::Error),
                    _ => Err(format!("unknown severity {n}, expected 0, 1 or 2")),
                }
            }
            other => Err(format!("invalid severity {other}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Severity::from_value(&value).map_err(de::Error::custom)
    }
}

/// A rule identifier, either bare (`no-console`) or namespaced by a plugin
/// (`jest/valid-title`, `@typescript-eslint/no-unused-vars`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleKey(String);

impl RuleKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The plugin namespace, i.e. everything before the last `/`
    ///
    /// `@scope/rule` belongs to `@scope`, `@scope/plugin/rule` to
    /// `@scope/plugin`. Core rules have no namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.0
            .rfind('/')
            .map(|idx| &self.0[..idx])
            .filter(|ns| !ns.is_empty())
    }

    /// The rule name without its namespace
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RuleKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Severity plus the rule's options
///
/// Options are opaque: they are compared for equality and carried through,
/// never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleSetting {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    pub fn off() -> Self {
        Self::new(Severity::Off)
    }

    pub fn warn() -> Self {
        Self::new(Severity::Warn)
    }

    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    pub fn with_option(mut self, option: Value) -> Self {
        self.options.push(option);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.severity != Severity::Off
    }

    /// Parse a rule setting from one of its document shapes
    ///
    /// - bare severity: `"warn"`, `1`
    /// - array form: `["error", option, ...]`
    /// - explicit form: `{ "severity": "warn", "options": [...] }`
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => {
                let (first, rest) = items
                    .split_first()
                    .ok_or_else(|| "rule setting array is empty".to_string())?;
                Ok(Self {
                    severity: Severity::from_value(first)?,
                    options: rest.to_vec(),
                })
            }
            Value::Object(map) => {
                if let Some(unknown) = map.keys().find(|k| *k != "severity" && *k != "options") {
                    return Err(format!("unknown field '{unknown}' in rule setting"));
                }
                let severity = map
                    .get("severity")
                    .ok_or_else(|| "rule setting is missing 'severity'".to_string())
                    .and_then(Severity::from_value)?;
                let options = match map.get("options") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(other) => return Err(format!("rule options must be an array, got {other}")),
                };
                Ok(Self { severity, options })
            }
            other => Severity::from_value(other).map(Self::new),
        }
    }
}

impl Serialize for RuleSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.is_empty() {
            return self.severity.serialize(serializer);
        }
        let mut seq = serializer.serialize_seq(Some(self.options.len() + 1))?;
        seq.serialize_element(&self.severity)?;
        for option in &self.options {
            seq.serialize_element(option)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RuleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RuleSetting::from_value(&value).map_err(de::Error::custom)
    }
}

/// A file-scoped block of rule and setting changes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideBlock {
    /// Glob patterns; a `!` prefix marks an exclusion
    #[serde(alias = "files", deserialize_with = "one_or_many")]
    pub file_patterns: Vec<String>,

    /// Additional exclusions, written without the `!` prefix
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub excluded_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rules: RuleMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub settings: SettingsMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parser_options: SettingsMap,
}

impl OverrideBlock {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_patterns: patterns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, key: impl Into<RuleKey>, setting: RuleSetting) -> Self {
        self.rules.insert(key.into(), setting);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn with_parser_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parser_options.insert(key.into(), value);
        self
    }

    pub fn with_excluded(mut self, pattern: impl Into<String>) -> Self {
        self.excluded_files.push(pattern.into());
        self
    }

    /// Every pattern of the block in declaration order, `excludedFiles`
    /// entries rendered with their `!` prefix
    pub fn all_patterns(&self) -> impl Iterator<Item = String> + '_ {
        self.file_patterns
            .iter()
            .cloned()
            .chain(self.excluded_files.iter().map(|p| format!("!{p}")))
    }

    /// Whether the block has at least one pattern that can select a file
    pub fn has_positive_pattern(&self) -> bool {
        self.file_patterns.iter().any(|p| !p.starts_with('!'))
    }
}

/// One independently authored rule-set document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetFragment {
    /// Identifier used in diagnostics; loaders default it to the file stem
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub plugins: IndexSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rules: RuleMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub settings: SettingsMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parser_options: SettingsMap,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideBlock>,

    /// Top-level keys the engine does not interpret (`extends`, `env`, ...)
    #[serde(flatten, skip_serializing)]
    pub ignored: BTreeMap<String, Value>,
}

impl RuleSetFragment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugins.insert(plugin.into());
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn with_rule(mut self, key: impl Into<RuleKey>, setting: RuleSetting) -> Self {
        self.rules.insert(key.into(), setting);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn with_parser_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parser_options.insert(key.into(), value);
        self
    }

    pub fn with_override(mut self, block: OverrideBlock) -> Self {
        self.overrides.push(block);
        self
    }

    /// Whether composing this fragment configures nothing
    ///
    /// Declared plugins alone do not count: a plugin nothing refers to
    /// changes no rule.
    pub fn is_noop(&self) -> bool {
        self.rules.is_empty()
            && self.settings.is_empty()
            && self.parser_options.is_empty()
            && self.parser.is_none()
            && self.overrides.is_empty()
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}
