//! CLI command implementations
//!
//! Fragment-processing commands (merge, resolve, validate) live in this file;
//! configuration file management is in `commands/config.rs`.

pub mod config;

pub use config::{config_init_command, config_schema_command, config_show_command};

use anyhow::{Context, bail};
use lintfold_core::{
    ConfigLoader, Diagnostic, DiagnosticLevel, FragmentLoader, FragmentValidator, MergeEngine,
    OverrideResolver, RuleSetFragment,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::OutputFormat;
use crate::output::{Reporter, ValidationReport};

/// Merge command implementation
pub fn merge_command(
    fragments: &[String],
    format: OutputFormat,
    output: Option<&Path>,
    strict: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<bool> {
    let start = Instant::now();
    let config = ConfigLoader::load(config_path, None)?;
    let paths = expand_fragment_args(fragments)?;
    let loaded = load_fragments(&paths)?;

    let outcome = MergeEngine::new(&config).merge(&loaded)?;
    info!(
        "Merged {} fragments in {:.2?} ({} diagnostics)",
        loaded.len(),
        start.elapsed(),
        outcome.diagnostics.len()
    );

    let reporter = Reporter::new(format);
    let rendered = reporter.render_merge(&outcome, loaded.len())?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!("Wrote merged configuration to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    reporter.report_diagnostics(&outcome.diagnostics);

    Ok(passes(&outcome.diagnostics, strict))
}

/// Resolve command implementation
pub fn resolve_command(
    fragments: &[String],
    files: &[String],
    format: OutputFormat,
    strict: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(config_path, None)?;
    let paths = expand_fragment_args(fragments)?;
    let loaded = load_fragments(&paths)?;

    let outcome = MergeEngine::new(&config).merge(&loaded)?;
    let resolved = OverrideResolver::new(&outcome.config).resolve_all(files);
    debug!("Resolved {} files", resolved.len());

    let reporter = Reporter::new(format);
    print!("{}", reporter.render_resolved(&resolved)?);
    reporter.report_diagnostics(&outcome.diagnostics);

    let resolution_ok = resolved.iter().all(|r| passes(&r.diagnostics, strict));
    Ok(passes(&outcome.diagnostics, strict) && resolution_ok)
}

/// Validate command implementation
///
/// Every fragment is checked independently; a parse or validation failure in
/// one does not stop the others from being reported.
pub fn validate_command(
    fragments: &[String],
    format: OutputFormat,
    strict: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(config_path, None)?;
    let validator = FragmentValidator::new(&config.validation);
    let paths = expand_fragment_args(fragments)?;

    let reports: Vec<ValidationReport> = paths
        .par_iter()
        .map(|path| match FragmentLoader::load_file(path) {
            Ok(fragment) => ValidationReport::from_result(path, validator.validate(&fragment)),
            Err(e) => ValidationReport::load_failure(path, &e),
        })
        .collect();

    let reporter = Reporter::new(format);
    print!("{}", reporter.render_validation(&reports)?);

    Ok(reports
        .iter()
        .all(|r| r.valid && passes(&r.warnings, strict)))
}

/// Whether a run with these diagnostics succeeds
fn passes(diagnostics: &[Diagnostic], strict: bool) -> bool {
    !strict || diagnostics.iter().all(|d| d.level < DiagnosticLevel::Warning)
}

/// Load fragments in parallel, keeping argument order
fn load_fragments(paths: &[PathBuf]) -> anyhow::Result<Vec<RuleSetFragment>> {
    let fragments = paths
        .par_iter()
        .map(|path| FragmentLoader::load_file(path))
        .collect::<lintfold_core::Result<Vec<_>>>()?;
    Ok(fragments)
}

/// Expand fragment arguments into file paths
///
/// Arguments containing glob metacharacters are expanded and their matches
/// sorted; precedence between arguments follows the command line. A pattern
/// that matches nothing is an error.
pub(crate) fn expand_fragment_args(args: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for arg in args {
        if !arg.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(arg));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob::glob(arg)
            .with_context(|| format!("invalid fragment pattern '{arg}'"))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        if matched.is_empty() {
            bail!("no fragment files match '{arg}'");
        }
        matched.sort();
        debug!("Pattern '{}' matched {} fragments", arg, matched.len());
        paths.extend(matched);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintfold_core::DiagnosticKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_expand_plain_arguments_keep_order() {
        let args = vec!["b.json".to_string(), "a.json".to_string()];
        let paths = expand_fragment_args(&args).unwrap();
        assert_eq!(paths, vec![PathBuf::from("b.json"), PathBuf::from("a.json")]);
    }

    #[test]
    fn test_expand_glob_sorts_matches() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["20-jest.yaml", "10-base.json", "notes.txt"] {
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        let pattern = format!("{}/*0-*", temp_dir.path().display());

        let paths = expand_fragment_args(&[pattern]).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["10-base.json", "20-jest.yaml"]);
    }

    #[test]
    fn test_expand_unmatched_glob_fails() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.json", temp_dir.path().display());
        assert!(expand_fragment_args(&[pattern]).is_err());
    }

    #[test]
    fn test_strict_only_fails_on_warnings() {
        let info = Diagnostic::new(DiagnosticKind::RuleOverridden, "x", vec![], "changed");
        let warning = Diagnostic::new(DiagnosticKind::EmptyFragment, "empty", vec![], "nothing");

        assert!(passes(std::slice::from_ref(&info), true));
        assert!(passes(std::slice::from_ref(&warning), false));
        assert!(!passes(&[info, warning], true));
    }
}
