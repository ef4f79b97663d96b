//! The merged configuration and its per-file resolution

use crate::config::MergePolicy;
use crate::diagnostics::Diagnostic;
use crate::fragment::{OverrideBlock, RuleKey, RuleMap, RuleSetting, Severity, SettingsMap};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an override block was declared
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSource {
    pub fragment_id: String,
    /// Position of the block within its fragment's `overrides`
    pub index: usize,
}

impl fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#overrides[{}]", self.fragment_id, self.index)
    }
}

/// An override block carried forward by the merge, tagged with its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedOverride {
    #[serde(default)]
    pub source: OverrideSource,
    #[serde(flatten)]
    pub block: OverrideBlock,
}

/// Which fragment (or override block) last contributed each value
///
/// Settings and parser options are keyed by the merged value's path
/// (`settings.import/resolver.node`); a value nested below a recorded path
/// belongs to that path's contributor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rules: IndexMap<RuleKey, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub settings: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parser_options: IndexMap<String, String>,
}

impl Provenance {
    pub fn is_empty(&self) -> bool {
        self.parser.is_none()
            && self.rules.is_empty()
            && self.settings.is_empty()
            && self.parser_options.is_empty()
    }
}

/// Result of composing an ordered list of fragments
///
/// Override blocks stay separate from the base maps; they are applied per
/// file by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfiguration {
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub plugins: IndexSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    #[serde(default)]
    pub rules: RuleMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub settings: SettingsMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parser_options: SettingsMap,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ScopedOverride>,

    /// Array policy the configuration was merged with; resolution reuses it
    #[serde(default, skip_serializing_if = "MergePolicy::is_default")]
    pub policy: MergePolicy,

    #[serde(default, skip_serializing_if = "Provenance::is_empty")]
    pub provenance: Provenance,
}

impl EffectiveConfiguration {
    pub fn rule(&self, key: &str) -> Option<&RuleSetting> {
        self.rules.get(key)
    }
}

/// Final rule set, settings and parser options for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFileConfiguration {
    pub file_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    pub rules: RuleMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub settings: SettingsMap,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parser_options: SettingsMap,

    /// Override blocks that applied, in application order (rendered as `<fragment>#overrides[<n>]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_overrides: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedFileConfiguration {
    pub fn rule(&self, key: &str) -> Option<&RuleSetting> {
        self.rules.get(key)
    }

    /// Effective severity of a rule; rules that are not configured are off
    pub fn severity_of(&self, key: &str) -> Severity {
        self.rule(key).map_or(Severity::Off, |r| r.severity)
    }

    /// Rules that will actually run on this file
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&RuleKey, &RuleSetting)> {
        self.rules.iter().filter(|(_, setting)| setting.is_enabled())
    }
}
