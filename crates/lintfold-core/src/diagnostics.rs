//! Non-fatal composition diagnostics
//!
//! Diagnostics describe conflicts and notable conditions found while
//! validating, merging or resolving. They never abort an operation; the caller
//! decides whether to log them or fail a build step on them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A later layer declared a rule with a different severity or options
    RuleOverridden,
    /// A later layer replaced a non-mergeable setting with a different value
    SettingReplaced,
    /// A fragment configures nothing
    EmptyFragment,
    /// An override block has no pattern that can select a file, or could not
    /// be compiled at resolution time
    OverrideNeverMatches,
}

impl DiagnosticKind {
    /// The level a diagnostic of this kind is reported at
    pub fn level(&self) -> DiagnosticLevel {
        match self {
            DiagnosticKind::RuleOverridden | DiagnosticKind::SettingReplaced => {
                DiagnosticLevel::Info
            }
            DiagnosticKind::EmptyFragment | DiagnosticKind::OverrideNeverMatches => {
                DiagnosticLevel::Warning
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::RuleOverridden => "rule-overridden",
            DiagnosticKind::SettingReplaced => "setting-replaced",
            DiagnosticKind::EmptyFragment => "empty-fragment",
            DiagnosticKind::OverrideNeverMatches => "override-never-matches",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic levels, ordered by importance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Expected, usually intentional (overriding is the common case)
    Info,
    /// Worth a look, e.g. a fragment that does nothing
    Warning,
}

/// A single non-fatal finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub level: DiagnosticLevel,
    /// Rule key, setting path, pattern or fragment id the finding is about
    pub subject: String,
    /// Ids of the fragments (or override blocks) involved, earliest first
    pub fragments: Vec<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        subject: impl Into<String>,
        fragments: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            level: kind.level(),
            subject: subject.into(),
            fragments,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)?;
        if !self.fragments.is_empty() {
            write!(f, " ({})", self.fragments.join(" -> "))?;
        }
        Ok(())
    }
}

/// Append-only collector scoped to one merge or resolve invocation
///
/// Exact duplicates are collapsed; anything that differs in any field is
/// kept.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.seen.insert(diagnostic.clone()) {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Record several diagnostics in order
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level >= DiagnosticLevel::Warning)
    }

    /// Count diagnostics by kind
    pub fn count_by_kind(&self) -> HashMap<DiagnosticKind, usize> {
        let mut counts = HashMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Finish the invocation and hand back everything recorded, in order
    pub fn collect(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
