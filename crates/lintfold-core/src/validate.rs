//! Fragment validation
//!
//! Validation is fragment-local: it never consults other fragments and has
//! no side effects. A fragment either passes (possibly with warnings) or
//! carries one or more [`ValidationError`]s, any of which rejects the whole
//! composition.

use crate::config::ValidationOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{LintfoldError, ValidationError};
use crate::fragment::{RuleMap, RuleSetFragment};
use crate::pattern::FilePattern;
use crate::result::Result;
use std::collections::HashSet;

/// Outcome of validating one fragment
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub fragment_id: String,
    /// Fatal problems, in declaration order
    pub errors: Vec<ValidationError>,
    /// Non-fatal findings
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error reported when this fragment rejects a composition
    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Convert into the composition-boundary result, keeping the warnings
    pub fn into_result(self) -> Result<Vec<Diagnostic>> {
        match self.errors.into_iter().next() {
            Some(cause) => Err(LintfoldError::validation_failed(self.fragment_id, cause)),
            None => Ok(self.warnings),
        }
    }
}

/// Checks fragments for structural well-formedness
#[derive(Debug, Clone, Default)]
pub struct FragmentValidator {
    ambient_plugins: HashSet<String>,
}

impl FragmentValidator {
    pub fn new(options: &ValidationOptions) -> Self {
        Self {
            ambient_plugins: options
                .ambient_plugins
                .iter()
                .map(|p| normalize_plugin_name(p))
                .collect(),
        }
    }

    pub fn validate(&self, fragment: &RuleSetFragment) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let declared: HashSet<String> = fragment
            .plugins
            .iter()
            .map(|p| normalize_plugin_name(p))
            .collect();

        self.check_namespaces(&fragment.rules, &declared, &mut errors);

        for (index, block) in fragment.overrides.iter().enumerate() {
            for pattern in block.all_patterns() {
                if let Err(err) = FilePattern::parse(&pattern) {
                    errors.push(err);
                }
            }
            self.check_namespaces(&block.rules, &declared, &mut errors);

            if !block.has_positive_pattern() {
                warnings.push(Diagnostic::new(
                    DiagnosticKind::OverrideNeverMatches,
                    format!("{}#overrides[{index}]", fragment.id),
                    vec![fragment.id.clone()],
                    "override block has no positive file pattern and can never apply",
                ));
            }
        }

        if fragment.is_noop() {
            warnings.push(Diagnostic::new(
                DiagnosticKind::EmptyFragment,
                fragment.id.clone(),
                vec![fragment.id.clone()],
                "fragment declares no rules, settings or overrides",
            ));
        }

        ValidationResult {
            fragment_id: fragment.id.clone(),
            errors,
            warnings,
        }
    }

    fn check_namespaces(
        &self,
        rules: &RuleMap,
        declared: &HashSet<String>,
        errors: &mut Vec<ValidationError>,
    ) {
        for key in rules.keys() {
            let Some(namespace) = key.namespace() else {
                continue;
            };
            if !declared.contains(namespace) && !self.ambient_plugins.contains(namespace) {
                errors.push(ValidationError::UnknownPluginNamespace {
                    rule: key.to_string(),
                    namespace: namespace.to_string(),
                });
            }
        }
    }
}

/// Validate a fragment with default options
pub fn validate(fragment: &RuleSetFragment) -> ValidationResult {
    FragmentValidator::default().validate(fragment)
}

/// Reduce a plugin package name to the namespace its rules use
///
/// `eslint-plugin-jest` → `jest`, `@scope/eslint-plugin` → `@scope`,
/// `@scope/eslint-plugin-foo` → `@scope/foo`. Short names pass through.
pub fn normalize_plugin_name(name: &str) -> String {
    if name.starts_with('@') {
        return match name.split_once('/') {
            Some((scope, "eslint-plugin")) => scope.to_string(),
            Some((scope, rest)) => match rest.strip_prefix("eslint-plugin-") {
                Some(short) => format!("{scope}/{short}"),
                None => name.to_string(),
            },
            None => name.to_string(),
        };
    }
    name.strip_prefix("eslint-plugin-")
        .unwrap_or(name)
        .to_string()
}
