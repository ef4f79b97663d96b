//! Fragment composition
//!
//! Folds an ordered list of fragments into one [`EffectiveConfiguration`].
//! Input order is precedence order: a later fragment overrides an earlier
//! one, the way an `extends` chain followed by local overrides behaves.
//!
//! - plugins are unioned (first appearance order)
//! - rules are last-wins; a differing earlier setting yields `RuleOverridden`
//! - settings and parserOptions are deep-merged where both sides are maps;
//!   anything else is replaced (`SettingReplaced` when the value changes),
//!   with arrays following the configured [`MergePolicy`]
//! - override blocks are concatenated, never merged, and applied per file by
//!   the resolver
//!
//! Any fragment failing validation rejects the whole composition.

use crate::config::{ArrayMerge, LintfoldConfig, MergePolicy, SettingsSection};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use crate::effective::{EffectiveConfiguration, OverrideSource, Provenance, ScopedOverride};
use crate::fragment::{OverrideBlock, RuleMap, RuleSetFragment, RuleSetting, SettingsMap};
use crate::result::Result;
use crate::validate::{FragmentValidator, ValidationResult};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use serde_json::map::Entry;
use tracing::{debug, trace};

/// The merged configuration plus everything noticed while building it
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub config: EffectiveConfiguration,
    pub diagnostics: Vec<Diagnostic>,
}

/// Composes fragments under a fixed policy
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    policy: MergePolicy,
    validator: FragmentValidator,
}

impl MergeEngine {
    pub fn new(config: &LintfoldConfig) -> Self {
        Self {
            policy: config.merge.clone(),
            validator: FragmentValidator::new(&config.validation),
        }
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            validator: FragmentValidator::default(),
        }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Validate every fragment, then fold them left to right
    ///
    /// Fails with `FragmentValidationFailed` for the first invalid fragment
    /// in input order; no partial configuration is produced.
    pub fn merge(&self, fragments: &[RuleSetFragment]) -> Result<MergeOutcome> {
        // Validation is fragment-local, so it can run in parallel; collect()
        // keeps input order.
        let validations: Vec<ValidationResult> = fragments
            .par_iter()
            .map(|fragment| self.validator.validate(fragment))
            .collect();

        let mut collector = DiagnosticCollector::new();
        let mut warnings = Vec::with_capacity(validations.len());
        for validation in validations {
            warnings.push(validation.into_result()?);
        }

        let mut state = LayerState::default();
        let mut plugins = indexmap::IndexSet::new();
        let mut overrides = Vec::new();

        for (fragment, fragment_warnings) in fragments.iter().zip(warnings) {
            debug!(
                fragment = %fragment.id,
                rules = fragment.rules.len(),
                overrides = fragment.overrides.len(),
                "Folding fragment"
            );
            collector.extend(fragment_warnings);

            plugins.extend(fragment.plugins.iter().cloned());
            state.apply(
                Layer::from_fragment(fragment),
                &fragment.id,
                &self.policy,
                &mut collector,
            );
            overrides.extend(fragment.overrides.iter().enumerate().map(|(index, block)| {
                ScopedOverride {
                    source: OverrideSource {
                        fragment_id: fragment.id.clone(),
                        index,
                    },
                    block: block.clone(),
                }
            }));
        }

        let config = EffectiveConfiguration {
            plugins,
            parser: state.parser,
            rules: state.rules,
            settings: state.settings,
            parser_options: state.parser_options,
            overrides,
            policy: self.policy.clone(),
            provenance: state.provenance,
        };

        Ok(MergeOutcome {
            config,
            diagnostics: collector.collect(),
        })
    }
}

/// Merge fragments with the default policy and validation options
pub fn merge(fragments: &[RuleSetFragment]) -> Result<MergeOutcome> {
    MergeEngine::default().merge(fragments)
}

/// One layer of rule / setting declarations: a fragment's base section or an
/// override block
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layer<'a> {
    pub parser: Option<&'a str>,
    pub rules: &'a RuleMap,
    pub settings: &'a SettingsMap,
    pub parser_options: &'a SettingsMap,
}

impl<'a> Layer<'a> {
    pub fn from_fragment(fragment: &'a RuleSetFragment) -> Self {
        Self {
            parser: fragment.parser.as_deref(),
            rules: &fragment.rules,
            settings: &fragment.settings,
            parser_options: &fragment.parser_options,
        }
    }

    pub fn from_override(block: &'a OverrideBlock) -> Self {
        Self {
            parser: block.parser.as_deref(),
            rules: &block.rules,
            settings: &block.settings,
            parser_options: &block.parser_options,
        }
    }
}

/// Accumulated values of a layering pass, with their provenance
#[derive(Debug, Clone, Default)]
pub(crate) struct LayerState {
    pub parser: Option<String>,
    pub rules: RuleMap,
    pub settings: SettingsMap,
    pub parser_options: SettingsMap,
    pub provenance: Provenance,
}

impl LayerState {
    /// Start from an already merged configuration's base layer
    pub fn from_base(config: &EffectiveConfiguration) -> Self {
        Self {
            parser: config.parser.clone(),
            rules: config.rules.clone(),
            settings: config.settings.clone(),
            parser_options: config.parser_options.clone(),
            provenance: config.provenance.clone(),
        }
    }

    /// Put `layer` on top; `origin` names it in diagnostics
    pub fn apply(
        &mut self,
        layer: Layer<'_>,
        origin: &str,
        policy: &MergePolicy,
        collector: &mut DiagnosticCollector,
    ) {
        if let Some(parser) = layer.parser {
            self.apply_parser(parser, origin, collector);
        }
        self.apply_rules(layer.rules, origin, collector);
        apply_settings(
            &mut self.settings,
            &mut self.provenance.settings,
            layer.settings,
            SettingsSection::Settings,
            origin,
            policy,
            collector,
        );
        apply_settings(
            &mut self.parser_options,
            &mut self.provenance.parser_options,
            layer.parser_options,
            SettingsSection::ParserOptions,
            origin,
            policy,
            collector,
        );
    }

    fn apply_parser(&mut self, parser: &str, origin: &str, collector: &mut DiagnosticCollector) {
        if let Some(previous) = self.parser.as_deref()
            && previous != parser
        {
            collector.push(Diagnostic::new(
                DiagnosticKind::SettingReplaced,
                "parser",
                contributors(self.provenance.parser.as_deref(), origin),
                format!("parser '{previous}' replaced by '{parser}'"),
            ));
        }
        self.parser = Some(parser.to_string());
        self.provenance.parser = Some(origin.to_string());
    }

    fn apply_rules(&mut self, rules: &RuleMap, origin: &str, collector: &mut DiagnosticCollector) {
        for (key, setting) in rules {
            if let Some(previous) = self.rules.get(key)
                && previous != setting
            {
                trace!(rule = %key, from = %previous.severity, to = %setting.severity, "Rule overridden");
                collector.push(Diagnostic::new(
                    DiagnosticKind::RuleOverridden,
                    key.as_str(),
                    contributors(self.provenance.rules.get(key).map(String::as_str), origin),
                    describe_rule_change(previous, setting),
                ));
            }
            self.rules.insert(key.clone(), setting.clone());
            self.provenance.rules.insert(key.clone(), origin.to_string());
        }
    }
}

fn apply_settings(
    target: &mut SettingsMap,
    sources: &mut IndexMap<String, String>,
    incoming: &SettingsMap,
    section: SettingsSection,
    origin: &str,
    policy: &MergePolicy,
    collector: &mut DiagnosticCollector,
) {
    for (namespace, value) in incoming {
        let mut ctx = MergeContext {
            strategy: policy.array_strategy(section, namespace),
            origin,
            sources: &mut *sources,
            collector: &mut *collector,
        };
        let path = format!("{}.{}", section.as_str(), namespace);
        merge_entry(target, namespace, value, &path, &mut ctx);
    }
}

struct MergeContext<'a> {
    strategy: ArrayMerge,
    origin: &'a str,
    /// Contributor per merged value path
    sources: &'a mut IndexMap<String, String>,
    collector: &'a mut DiagnosticCollector,
}

impl MergeContext<'_> {
    /// Who set the value at `path`; values inserted as part of a larger
    /// map inherit the map's contributor
    fn contributor_of(&self, path: &str) -> Option<&str> {
        let mut current = path;
        loop {
            if let Some(origin) = self.sources.get(current) {
                return Some(origin.as_str());
            }
            current = &current[..current.rfind('.')?];
        }
    }

    /// Every contributor to the map at `path`, first recorded first
    fn contributors_within(&self, path: &str) -> Vec<String> {
        let prefix = format!("{path}.");
        let mut found: Vec<String> = self.contributor_of(path).map(str::to_string).into_iter().collect();
        for (key, origin) in self.sources.iter() {
            if key.starts_with(&prefix) && !found.contains(origin) {
                found.push(origin.clone());
            }
        }
        found
    }

    fn record(&mut self, path: &str) {
        self.sources.insert(path.to_string(), self.origin.to_string());
    }

    /// Drop contributors recorded below `path`
    fn forget_below(&mut self, path: &str) {
        let prefix = format!("{path}.");
        self.sources.retain(|key, _| !key.starts_with(&prefix));
    }
}

/// Layer `incoming` onto `target[key]`
fn merge_entry(
    target: &mut SettingsMap,
    key: &str,
    incoming: &Value,
    path: &str,
    ctx: &mut MergeContext<'_>,
) {
    match target.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(incoming.clone());
            ctx.record(path);
        }
        Entry::Occupied(mut slot) => merge_value(slot.get_mut(), incoming, path, ctx),
    }
}

/// Maps merge recursively; everything else is replaced, except arrays under
/// `concat`, which gain the incoming items they lack
fn merge_value(existing: &mut Value, incoming: &Value, path: &str, ctx: &mut MergeContext<'_>) {
    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (child, value) in incoming {
                merge_entry(existing, child, value, &format!("{path}.{child}"), ctx);
            }
        }
        (Value::Array(existing), Value::Array(incoming))
            if ctx.strategy == ArrayMerge::Concat =>
        {
            for item in incoming {
                if !existing.contains(item) {
                    existing.push(item.clone());
                }
            }
            ctx.record(path);
        }
        (existing, incoming) => {
            if existing != incoming {
                let mut fragments = if existing.is_object() {
                    ctx.contributors_within(path)
                } else {
                    ctx.contributor_of(path).map(str::to_string).into_iter().collect()
                };
                if !fragments.iter().any(|f| f == ctx.origin) {
                    fragments.push(ctx.origin.to_string());
                }
                ctx.collector.push(Diagnostic::new(
                    DiagnosticKind::SettingReplaced,
                    path,
                    fragments,
                    format!("{} replaced by {}", summarize(existing), summarize(incoming)),
                ));
                if existing.is_object() {
                    ctx.forget_below(path);
                }
                *existing = incoming.clone();
            }
            ctx.record(path);
        }
    }
}

fn contributors(previous: Option<&str>, current: &str) -> Vec<String> {
    previous
        .into_iter()
        .map(str::to_string)
        .chain(std::iter::once(current.to_string()))
        .collect()
}

fn describe_rule_change(previous: &RuleSetting, next: &RuleSetting) -> String {
    let options_changed = previous.options != next.options;
    if previous.severity == next.severity {
        return format!("options changed (severity stays {})", next.severity);
    }

    let direction = if next.severity > previous.severity {
        "raised"
    } else {
        "lowered"
    };
    let mut message = format!(
        "severity {direction} from {} to {}",
        previous.severity, next.severity
    );
    if options_changed {
        message.push_str(" and options changed");
    }
    message
}

fn summarize(value: &Value) -> String {
    const MAX: usize = 60;
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX {
        rendered
    } else {
        let truncated: String = rendered.chars().take(MAX).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::config::ValidationOptions;
    use crate::error::{LintfoldError, ValidationError};
    use crate::fragment::Severity;
    use serde_json::json;

    #[test]
    fn test_later_fragment_wins_with_diagnostic() {
        let a = RuleSetFragment::new("a").with_rule("x", RuleSetting::error());
        let b = RuleSetFragment::new("b").with_rule("x", RuleSetting::warn());

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.config.rules["x"], RuleSetting::warn());
        assert_eq!(outcome.diagnostics.len(), 1);

        let diagnostic = &outcome.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::RuleOverridden);
        assert_eq!(diagnostic.subject, "x");
        assert_eq!(diagnostic.fragments, vec!["a", "b"]);
        assert_eq!(diagnostic.message, "severity lowered from error to warn");
    }

    #[test]
    fn test_equal_redeclaration_is_silent() {
        let a = RuleSetFragment::new("a").with_rule("x", RuleSetting::error());
        let b = RuleSetFragment::new("b").with_rule("x", RuleSetting::error());

        let outcome = merge(&[a, b]).unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.config.provenance.rules["x"], "b");
    }

    #[test]
    fn test_option_change_is_reported() {
        let a = RuleSetFragment::new("a")
            .with_rule("max-len", RuleSetting::error().with_option(json!({ "code": 100 })));
        let b = RuleSetFragment::new("b")
            .with_rule("max-len", RuleSetting::error().with_option(json!({ "code": 120 })));

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(
            outcome.diagnostics[0].message,
            "options changed (severity stays error)"
        );
        assert_eq!(outcome.config.rules["max-len"].options, vec![json!({ "code": 120 })]);
    }

    #[test]
    fn test_plugins_are_unioned_in_first_appearance_order() {
        let a = RuleSetFragment::new("a").with_plugin("jest").with_plugin("react");
        let b = RuleSetFragment::new("b").with_plugin("react").with_plugin("vue");

        let outcome = merge(&[a, b]).unwrap();
        let plugins: Vec<&str> = outcome.config.plugins.iter().map(String::as_str).collect();
        assert_eq!(plugins, vec!["jest", "react", "vue"]);
    }

    #[test]
    fn test_settings_deep_merge() {
        let a = RuleSetFragment::new("a").with_setting(
            "import/resolver",
            json!({ "node": { "extensions": [".js", ".jsx"] }, "webpack": { "config": "a.js" } }),
        );
        let b = RuleSetFragment::new("b").with_setting(
            "import/resolver",
            json!({ "node": { "extensions": [".ts"], "paths": ["src"] } }),
        );

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(
            outcome.config.settings["import/resolver"],
            json!({
                "node": { "extensions": [".ts"], "paths": ["src"] },
                "webpack": { "config": "a.js" }
            })
        );

        assert_eq!(outcome.diagnostics.len(), 1);
        let diagnostic = &outcome.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::SettingReplaced);
        assert_eq!(diagnostic.subject, "settings.import/resolver.node.extensions");
        assert_eq!(diagnostic.fragments, vec!["a", "b"]);
    }

    #[test]
    fn test_setting_replaced_names_fragment_that_set_the_leaf() {
        let a = RuleSetFragment::new("a").with_setting("s", json!({ "x": 1 }));
        let b = RuleSetFragment::new("b").with_setting("s", json!({ "y": 2 }));
        let c = RuleSetFragment::new("c").with_setting("s", json!({ "x": 3 }));

        let outcome = merge(&[a, b, c]).unwrap();
        assert_eq!(outcome.config.settings["s"], json!({ "x": 3, "y": 2 }));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].subject, "settings.s.x");
        assert_eq!(outcome.diagnostics[0].fragments, vec!["a", "c"]);

        let provenance = &outcome.config.provenance.settings;
        assert_eq!(provenance["settings.s"], "a");
        assert_eq!(provenance["settings.s.y"], "b");
        assert_eq!(provenance["settings.s.x"], "c");
    }

    #[test]
    fn test_replaced_map_forgets_nested_contributors() {
        let a = RuleSetFragment::new("a").with_setting("s", json!({ "x": { "y": 1 } }));
        let b = RuleSetFragment::new("b").with_setting("s", json!({ "x": { "y": 2 } }));
        let c = RuleSetFragment::new("c").with_setting("s", json!({ "x": false }));
        let d = RuleSetFragment::new("d").with_setting("s", json!({ "x": { "y": 3 } }));

        let outcome = merge(&[a, b, c, d]).unwrap();
        let subjects: Vec<(&str, Vec<String>)> = outcome
            .diagnostics
            .iter()
            .map(|d| (d.subject.as_str(), d.fragments.clone()))
            .collect();
        assert_eq!(
            subjects,
            vec![
                ("settings.s.x.y", vec!["a".to_string(), "b".to_string()]),
                (
                    "settings.s.x",
                    vec!["a".to_string(), "b".to_string(), "c".to_string()]
                ),
                ("settings.s.x", vec!["c".to_string(), "d".to_string()]),
            ]
        );
        assert!(!outcome.config.provenance.settings.contains_key("settings.s.x.y"));
    }

    #[test]
    fn test_scalar_replacing_map_is_reported() {
        let a = RuleSetFragment::new("a").with_parser_option("ecmaFeatures", json!({ "jsx": true }));
        let b = RuleSetFragment::new("b").with_parser_option("ecmaFeatures", json!(false));

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.config.parser_options["ecmaFeatures"], json!(false));
        assert_eq!(outcome.diagnostics[0].subject, "parserOptions.ecmaFeatures");
    }

    #[test]
    fn test_concat_policy_appends_missing_items() {
        let mut policy = MergePolicy::default();
        policy
            .settings
            .insert("import/extensions".to_string(), ArrayMerge::Concat);
        let engine = MergeEngine::with_policy(policy);

        let a = RuleSetFragment::new("a").with_setting("import/extensions", json!([".js", ".jsx"]));
        let b = RuleSetFragment::new("b").with_setting("import/extensions", json!([".jsx", ".ts"]));
        let c = RuleSetFragment::new("c").with_setting("import/external-module-folders", json!(["node_modules"]));
        let d = RuleSetFragment::new("d").with_setting("import/external-module-folders", json!(["vendor"]));

        let outcome = engine.merge(&[a, b, c, d]).unwrap();
        assert_eq!(
            outcome.config.settings["import/extensions"],
            json!([".js", ".jsx", ".ts"])
        );
        // other namespaces keep the default (replace)
        assert_eq!(
            outcome.config.settings["import/external-module-folders"],
            json!(["vendor"])
        );
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_parser_last_wins() {
        let a = RuleSetFragment::new("a").with_parser("espree");
        let b = RuleSetFragment::new("b").with_parser("vue-eslint-parser");

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.config.parser.as_deref(), Some("vue-eslint-parser"));
        assert_eq!(outcome.diagnostics[0].subject, "parser");
    }

    #[test]
    fn test_overrides_are_concatenated_in_order() {
        let a = RuleSetFragment::new("a")
            .with_override(OverrideBlock::new(["*.ts"]).with_rule("x", RuleSetting::off()))
            .with_override(OverrideBlock::new(["*.tsx"]).with_rule("x", RuleSetting::warn()));
        let b = RuleSetFragment::new("b")
            .with_override(OverrideBlock::new(["*.ts"]).with_rule("x", RuleSetting::error()));

        let outcome = merge(&[a, b]).unwrap();
        let sources: Vec<String> = outcome
            .config
            .overrides
            .iter()
            .map(|o| o.source.to_string())
            .collect();
        assert_eq!(sources, vec!["a#overrides[0]", "a#overrides[1]", "b#overrides[0]"]);
        // no merging of overrides at this stage
        assert!(outcome.config.rules.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_first_invalid_fragment_rejects_composition() {
        let good = RuleSetFragment::new("good").with_rule("x", RuleSetting::error());
        let bad_plugin = RuleSetFragment::new("bad-plugin").with_rule("foo/bar", RuleSetting::error());
        let bad_pattern = RuleSetFragment::new("bad-pattern")
            .with_override(OverrideBlock::new(["{a,b"]).with_rule("x", RuleSetting::off()));

        let err = merge(&[good, bad_plugin, bad_pattern]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        match err {
            LintfoldError::FragmentValidationFailed { fragment_id, cause } => {
                assert_eq!(fragment_id, "bad-plugin");
                assert!(matches!(cause, ValidationError::UnknownPluginNamespace { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_engine_uses_validation_options() {
        let config = LintfoldConfig {
            validation: ValidationOptions {
                ambient_plugins: vec!["import".to_string()],
            },
            ..Default::default()
        };
        let fragment = RuleSetFragment::new("vue-airbnb").with_rule("import/named", RuleSetting::off());

        assert!(merge(std::slice::from_ref(&fragment)).is_err());
        let outcome = MergeEngine::new(&config).merge(&[fragment]).unwrap();
        assert_eq!(outcome.config.rules["import/named"].severity, Severity::Off);
    }

    #[test]
    fn test_empty_fragment_warning_is_surfaced() {
        let outcome = merge(&[RuleSetFragment::new("empty")]).unwrap();
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::EmptyFragment);
    }

    #[test]
    fn test_empty_input() {
        let outcome = merge(&[]).unwrap();
        assert_eq!(outcome.config, EffectiveConfiguration::default());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_merge_is_deterministic() {
        let fragments = vec![
            RuleSetFragment::new("a")
                .with_rule("x", RuleSetting::error())
                .with_setting("s", json!({ "k": 1 })),
            RuleSetFragment::new("b")
                .with_rule("x", RuleSetting::warn())
                .with_setting("s", json!({ "k": 2 })),
        ];

        let first = merge(&fragments).unwrap();
        let second = merge(&fragments).unwrap();
        assert_eq!(first, second);
    }
}
