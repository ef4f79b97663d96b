//! Per-file override resolution
//!
//! Starting from the merged base layer, every override block whose patterns
//! select the file is layered on top in declaration order, with the same
//! last-wins and deep-merge rules the merge engine uses. A later matching
//! block beats an earlier one; a file no block selects gets the base layer
//! unchanged.

use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use crate::effective::{EffectiveConfiguration, ResolvedFileConfiguration, ScopedOverride};
use crate::merge::{Layer, LayerState};
use crate::pattern::FilePattern;
use rayon::prelude::*;
use tracing::{trace, warn};

/// An override block with its patterns compiled
#[derive(Debug, Clone)]
struct CompiledOverride<'a> {
    scoped: &'a ScopedOverride,
    include: Vec<FilePattern>,
    exclude: Vec<FilePattern>,
}

impl CompiledOverride<'_> {
    fn applies_to(&self, path: &str) -> bool {
        self.include.iter().any(|p| p.matches(path)) && !self.exclude.iter().any(|p| p.matches(path))
    }
}

/// Resolves file paths against one configuration
///
/// Patterns are compiled once up front, so a resolver is the cheap way to
/// query many paths. It only borrows the configuration and can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct OverrideResolver<'a> {
    config: &'a EffectiveConfiguration,
    compiled: Vec<CompiledOverride<'a>>,
    /// Reported with every resolution
    skipped: Vec<Diagnostic>,
}

impl<'a> OverrideResolver<'a> {
    /// Compile every override of `config`
    ///
    /// Configurations produced by the merge engine only contain validated
    /// patterns. A block with a malformed pattern (possible for a
    /// configuration deserialized from elsewhere) is skipped as a whole and
    /// reported as `OverrideNeverMatches` with every resolution.
    pub fn new(config: &'a EffectiveConfiguration) -> Self {
        let mut compiled = Vec::with_capacity(config.overrides.len());
        let mut skipped = Vec::new();

        'blocks: for scoped in &config.overrides {
            let mut include = Vec::new();
            let mut exclude = Vec::new();
            for pattern in scoped.block.all_patterns() {
                match FilePattern::parse(&pattern) {
                    Ok(p) if p.is_negated() => exclude.push(p),
                    Ok(p) => include.push(p),
                    Err(e) => {
                        warn!(source = %scoped.source, error = %e, "Skipping override with malformed pattern");
                        skipped.push(Diagnostic::new(
                            DiagnosticKind::OverrideNeverMatches,
                            scoped.source.to_string(),
                            vec![scoped.source.fragment_id.clone()],
                            format!("override block skipped: {e}"),
                        ));
                        continue 'blocks;
                    }
                }
            }
            compiled.push(CompiledOverride {
                scoped,
                include,
                exclude,
            });
        }

        Self {
            config,
            compiled,
            skipped,
        }
    }

    /// Final configuration for `file_path`
    pub fn resolve(&self, file_path: &str) -> ResolvedFileConfiguration {
        let mut state = LayerState::from_base(self.config);
        let mut collector = DiagnosticCollector::new();
        collector.extend(self.skipped.iter().cloned());
        let mut matched = Vec::new();

        for compiled in &self.compiled {
            if !compiled.applies_to(file_path) {
                continue;
            }
            let origin = compiled.scoped.source.to_string();
            trace!(file = %file_path, source = %origin, "Override applies");
            state.apply(
                Layer::from_override(&compiled.scoped.block),
                &origin,
                &self.config.policy,
                &mut collector,
            );
            matched.push(origin);
        }

        ResolvedFileConfiguration {
            file_path: file_path.to_string(),
            parser: state.parser,
            rules: state.rules,
            settings: state.settings,
            parser_options: state.parser_options,
            matched_overrides: matched,
            diagnostics: collector.collect(),
        }
    }

    /// Resolve many paths in parallel; output follows input order
    pub fn resolve_all<P>(&self, paths: &[P]) -> Vec<ResolvedFileConfiguration>
    where
        P: AsRef<str> + Sync,
    {
        paths.par_iter().map(|p| self.resolve(p.as_ref())).collect()
    }
}

/// Final configuration for one file
pub fn resolve(config: &EffectiveConfiguration, file_path: &str) -> ResolvedFileConfiguration {
    OverrideResolver::new(config).resolve(file_path)
}

/// Final configurations for several files, in input order
pub fn resolve_all<P>(config: &EffectiveConfiguration, paths: &[P]) -> Vec<ResolvedFileConfiguration>
where
    P: AsRef<str> + Sync,
{
    OverrideResolver::new(config).resolve_all(paths)
}
