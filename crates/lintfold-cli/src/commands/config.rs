//! Configuration management subcommands: init, show, schema

use anyhow::{Context, bail};
use colored::Colorize;
use lintfold_core::{ConfigLoader, LintfoldConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::ConfigFormat;

/// Config init command implementation
pub fn config_init_command(format: ConfigFormat, force: bool) -> anyhow::Result<bool> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFormat::Json => ".lintfoldrc.json",
        ConfigFormat::Toml => ".lintfoldrc.toml",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        bail!("Configuration file '{filename}' already exists. Use --force to overwrite.");
    }

    let config = LintfoldConfig::default();
    let content = match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(&config).context("Failed to serialize JSON")?
        }
        ConfigFormat::Toml => toml::to_string_pretty(&config).context("Failed to serialize TOML")?,
    };
    std::fs::write(&config_path, content)
        .with_context(|| format!("failed to write '{filename}'"))?;

    println!("{} Created configuration file: {filename}", "✓".green());
    println!("   Set merge.settings / merge.parserOptions to choose array strategies per namespace.");

    Ok(true)
}

/// Config show command implementation
pub fn config_show_command(config_path: Option<&Path>) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(config_path, None)?;
    debug!("Showing configuration: {:?}", config);

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(true)
}

/// Config schema command implementation
pub fn config_schema_command() -> anyhow::Result<bool> {
    println!("{}", LintfoldConfig::json_schema()?);
    Ok(true)
}
