//! Output formatting and reporting
//!
//! Documents (merged or resolved configurations, validation reports) go to
//! stdout in the selected format. Composition diagnostics go to stdout with
//! human output and to stderr otherwise, so JSON/YAML stdout stays parseable.

use colored::*;
use lintfold_core::{
    Diagnostic, DiagnosticLevel, LintfoldError, MergeOutcome, ResolvedFileConfiguration,
    RuleMap, Severity, ValidationResult,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use crate::OutputFormat;

/// Per-fragment outcome of `lintfold validate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub fragment_id: String,
    pub path: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn from_result(path: &Path, result: ValidationResult) -> Self {
        Self {
            valid: result.is_valid(),
            errors: result.errors.iter().map(ToString::to_string).collect(),
            fragment_id: result.fragment_id,
            path: path.display().to_string(),
            warnings: result.warnings,
        }
    }

    /// Report for a fragment that could not be loaded at all
    pub fn load_failure(path: &Path, error: &LintfoldError) -> Self {
        Self {
            fragment_id: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            valid: false,
            errors: vec![error.to_string()],
            warnings: Vec::new(),
        }
    }
}

/// Renders command results in one output format
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// The merged configuration document, or a summary for humans
    pub fn render_merge(&self, outcome: &MergeOutcome, fragment_count: usize) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&outcome.config),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&outcome.config)?),
            OutputFormat::Human => {
                let config = &outcome.config;
                let mut out = String::new();
                writeln!(out, "{} Merged {} fragments", "✓".green(), fragment_count)?;
                if !config.plugins.is_empty() {
                    let plugins: Vec<&str> = config.plugins.iter().map(String::as_str).collect();
                    writeln!(out, "  {} {}", "plugins:".bold(), plugins.join(", "))?;
                }
                if let Some(parser) = &config.parser {
                    writeln!(out, "  {} {}", "parser:".bold(), parser)?;
                }
                if !config.settings.is_empty() {
                    let namespaces: Vec<&str> = config.settings.keys().map(String::as_str).collect();
                    writeln!(out, "  {} {}", "settings:".bold(), namespaces.join(", "))?;
                }
                writeln!(out, "  {} {} blocks", "overrides:".bold(), config.overrides.len())?;
                writeln!(
                    out,
                    "  {} {} ({} enabled)",
                    "rules:".bold(),
                    config.rules.len(),
                    config.rules.values().filter(|r| r.is_enabled()).count()
                )?;
                write_rules(&mut out, &config.rules, "    ")?;
                Ok(out)
            }
        }
    }

    pub fn render_resolved(&self, resolved: &[ResolvedFileConfiguration]) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&resolved),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&resolved)?),
            OutputFormat::Human => {
                let mut out = String::new();
                for file in resolved {
                    writeln!(out, "{}", file.file_path.bold().underline())?;
                    if file.matched_overrides.is_empty() {
                        writeln!(out, "  {}", "no overrides apply".dimmed())?;
                    } else {
                        writeln!(
                            out,
                            "  {} {}",
                            "overrides:".bold(),
                            file.matched_overrides.join(", ")
                        )?;
                    }
                    if let Some(parser) = &file.parser {
                        writeln!(out, "  {} {}", "parser:".bold(), parser)?;
                    }
                    write_rules(&mut out, &file.rules, "  ")?;
                    for diagnostic in &file.diagnostics {
                        writeln!(out, "  {}", format_diagnostic(diagnostic))?;
                    }
                    writeln!(out)?;
                }
                Ok(out)
            }
        }
    }

    pub fn render_validation(&self, reports: &[ValidationReport]) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&reports),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&reports)?),
            OutputFormat::Human => {
                let mut out = String::new();
                for report in reports {
                    let mark = if report.valid { "✓".green() } else { "✗".red() };
                    writeln!(out, "{} {} ({})", mark, report.fragment_id.bold(), report.path)?;
                    for error in &report.errors {
                        writeln!(out, "  {} {}", "error:".red().bold(), error)?;
                    }
                    for warning in &report.warnings {
                        writeln!(out, "  {}", format_diagnostic(warning))?;
                    }
                }

                let invalid = reports.iter().filter(|r| !r.valid).count();
                writeln!(out)?;
                if invalid == 0 {
                    writeln!(out, "{} fragments valid", reports.len().to_string().green())?;
                } else {
                    writeln!(
                        out,
                        "{} of {} fragments invalid",
                        invalid.to_string().red(),
                        reports.len()
                    )?;
                }
                Ok(out)
            }
        }
    }

    /// Print composition diagnostics
    pub fn report_diagnostics(&self, diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            return;
        }
        match self.format {
            OutputFormat::Human => {
                println!("\n{}", "Diagnostics:".bold());
                for diagnostic in diagnostics {
                    println!("  {}", format_diagnostic(diagnostic));
                }
            }
            OutputFormat::Json | OutputFormat::Yaml => {
                for diagnostic in diagnostics {
                    eprintln!("{}", format_diagnostic(diagnostic));
                }
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

fn write_rules(out: &mut String, rules: &RuleMap, indent: &str) -> std::fmt::Result {
    for (key, setting) in rules {
        let label = severity_label(setting.severity);
        if setting.options.is_empty() {
            writeln!(out, "{indent}{label} {key}")?;
        } else {
            let options: Vec<String> = setting.options.iter().map(ToString::to_string).collect();
            writeln!(out, "{indent}{label} {key} {}", options.join(" ").dimmed())?;
        }
    }
    Ok(())
}

fn severity_label(severity: Severity) -> ColoredString {
    let padded = format!("{:<5}", severity.as_str());
    match severity {
        Severity::Error => padded.red(),
        Severity::Warn => padded.yellow(),
        Severity::Off => padded.dimmed(),
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let level = match diagnostic.level {
        DiagnosticLevel::Info => "info".blue(),
        DiagnosticLevel::Warning => "warning".yellow().bold(),
    };
    format!("{level} {diagnostic}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintfold_core::{RuleSetFragment, RuleSetting, merge, resolve, validate};

    fn outcome() -> MergeOutcome {
        merge(&[
            RuleSetFragment::new("a").with_rule("eqeqeq", RuleSetting::error()),
            RuleSetFragment::new("b")
                .with_plugin("jest")
                .with_rule("jest/no-export", RuleSetting::warn()),
        ])
        .unwrap()
    }

    #[test]
    fn test_json_merge_is_the_configuration_document() {
        let rendered = Reporter::new(OutputFormat::Json)
            .render_merge(&outcome(), 2)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["plugins"], serde_json::json!(["jest"]));
        assert_eq!(value["rules"]["eqeqeq"], "error");
        assert_eq!(value["rules"]["jest/no-export"], "warn");
    }

    #[test]
    fn test_yaml_resolved_lists_files() {
        let outcome = outcome();
        let resolved = vec![resolve(&outcome.config, "a.js")];
        let rendered = Reporter::new(OutputFormat::Yaml)
            .render_resolved(&resolved)
            .unwrap();

        assert!(rendered.contains("filePath: a.js"));
        assert!(rendered.contains("eqeqeq: error"));
    }

    #[test]
    fn test_human_validation_counts_invalid_fragments() {
        colored::control::set_override(false);
        let good = RuleSetFragment::new("good").with_rule("eqeqeq", RuleSetting::error());
        let bad = RuleSetFragment::new("bad").with_rule("foo/bar", RuleSetting::error());
        let reports = vec![
            ValidationReport::from_result(Path::new("good.json"), validate(&good)),
            ValidationReport::from_result(Path::new("bad.json"), validate(&bad)),
        ];

        let rendered = Reporter::new(OutputFormat::Human)
            .render_validation(&reports)
            .unwrap();
        assert!(rendered.contains("✓ good (good.json)"));
        assert!(rendered.contains("✗ bad (bad.json)"));
        assert!(rendered.contains("1 of 2 fragments invalid"));
    }
}
