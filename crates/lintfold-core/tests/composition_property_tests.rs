//! Property-based tests for fragment composition and override resolution

use lintfold_core::{
    OverrideBlock, RuleSetFragment, RuleSetting, Severity, merge, resolve,
};
use proptest::prelude::*;
use serde_json::json;

const RULE_KEYS: &[&str] = &["eqeqeq", "no-console", "no-debugger", "curly", "semi"];

fn setting_strategy() -> impl Strategy<Value = RuleSetting> {
    (
        prop_oneof![
            Just(Severity::Off),
            Just(Severity::Warn),
            Just(Severity::Error),
        ],
        prop::option::of(0u32..3),
    )
        .prop_map(|(severity, option)| {
            let setting = RuleSetting::new(severity);
            match option {
                Some(level) => setting.with_option(json!({ "level": level })),
                None => setting,
            }
        })
}

/// Fragments using only core rules, so validation never rejects them
fn fragment_strategy(id: &'static str) -> impl Strategy<Value = RuleSetFragment> {
    (
        prop::collection::vec((prop::sample::select(RULE_KEYS), setting_strategy()), 0..5),
        prop::option::of(0u32..4),
    )
        .prop_map(move |(rules, depth)| {
            let mut fragment = RuleSetFragment::new(id);
            for (key, setting) in rules {
                fragment = fragment.with_rule(key, setting);
            }
            if let Some(depth) = depth {
                fragment = fragment.with_setting("shared", json!({ "depth": depth, "owner": id }));
            }
            fragment
        })
}

proptest! {
    /// Merging a fragment with itself changes nothing
    #[test]
    fn prop_merge_is_idempotent(a in fragment_strategy("a")) {
        let once = merge(std::slice::from_ref(&a)).unwrap().config;
        let twice = merge(&[a.clone(), a]).unwrap().config;

        prop_assert_eq!(&once.rules, &twice.rules);
        prop_assert_eq!(&once.settings, &twice.settings);
        prop_assert_eq!(&once.parser_options, &twice.parser_options);
    }

    /// Every rule ends up with the setting of the last fragment declaring it
    #[test]
    fn prop_last_declaration_wins(
        a in fragment_strategy("a"),
        b in fragment_strategy("b"),
    ) {
        let outcome = merge(&[a.clone(), b.clone()]).unwrap();

        for key in RULE_KEYS {
            let expected = b.rules.get(*key).or_else(|| a.rules.get(*key));
            prop_assert_eq!(outcome.config.rules.get(*key), expected);
        }

        // a conflict diagnostic exists exactly when both declared different values
        let conflicts = RULE_KEYS
            .iter()
            .filter(|key| matches!((a.rules.get(**key), b.rules.get(**key)), (Some(x), Some(y)) if x != y))
            .count();
        let reported = outcome
            .diagnostics
            .iter()
            .filter(|d| d.kind == lintfold_core::DiagnosticKind::RuleOverridden)
            .count();
        prop_assert_eq!(conflicts, reported);
    }

    /// Swapping two conflicting fragments swaps the winner
    #[test]
    fn prop_order_decides_conflicts(
        first in setting_strategy(),
        second in setting_strategy(),
    ) {
        prop_assume!(first != second);
        let a = RuleSetFragment::new("a").with_rule("eqeqeq", first.clone());
        let b = RuleSetFragment::new("b").with_rule("eqeqeq", second.clone());

        let ab = merge(&[a.clone(), b.clone()]).unwrap().config;
        let ba = merge(&[b, a]).unwrap().config;
        prop_assert_eq!(&ab.rules["eqeqeq"], &second);
        prop_assert_eq!(&ba.rules["eqeqeq"], &first);
    }

    /// A path no override selects resolves to the base layer
    #[test]
    fn prop_unmatched_path_resolves_to_base(
        a in fragment_strategy("a"),
        override_setting in setting_strategy(),
        name in "[a-z]{1,8}",
    ) {
        let a = a.with_override(
            OverrideBlock::new(["*.test.js"]).with_rule("eqeqeq", override_setting),
        );
        let config = merge(&[a]).unwrap().config;

        let resolved = resolve(&config, &format!("src/{name}.js"));
        prop_assert_eq!(&resolved.rules, &config.rules);
        prop_assert_eq!(&resolved.settings, &config.settings);
        prop_assert!(resolved.matched_overrides.is_empty());
    }

    /// Of several matching blocks the last one decides
    #[test]
    fn prop_last_matching_override_wins(
        settings in prop::collection::vec(setting_strategy(), 1..6),
        base in setting_strategy(),
    ) {
        let mut fragment = RuleSetFragment::new("a").with_rule("curly", base);
        for setting in &settings {
            fragment = fragment.with_override(
                OverrideBlock::new(["src/**"]).with_rule("curly", setting.clone()),
            );
        }
        let config = merge(&[fragment]).unwrap().config;

        let resolved = resolve(&config, "src/lib/index.js");
        prop_assert_eq!(resolved.rule("curly"), settings.last());
        prop_assert_eq!(resolved.matched_overrides.len(), settings.len());
    }
}
