//! Lintfold CLI
//!
//! Command-line interface for composing lint rule-set fragments

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use lintfold_core::init_tracing;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "lintfold")]
#[command(about = "Lintfold: compose lint rule-set fragments into one effective configuration")]
#[command(version = lintfold_core::VERSION)]
#[command(
    long_about = "Lintfold merges independently authored lint rule-set fragments in precedence order,\n\
validates plugin namespaces and override patterns, and resolves the final rule set for individual files.\n\
\n\
Examples:\n  \
lintfold merge base.json jest.yaml            # Merge two fragments\n  \
lintfold merge 'rulesets/*.json' -f yaml      # Merge every fragment matching a glob\n  \
lintfold resolve --file src/a.test.js base.json jest.yaml\n  \
lintfold validate rulesets/*.json             # Validate fragments without merging\n  \
lintfold config init                          # Create a .lintfoldrc.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.lintfoldrc.json/.lintfoldrc.toml/lintfold.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fragments into one effective configuration
    Merge {
        /// Fragment files in precedence order (later wins); glob patterns are expanded
        #[arg(required = true, help = "Fragment files or glob patterns, lowest precedence first")]
        fragments: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "json", help = "Output format for the merged configuration")]
        format: OutputFormat,

        /// Write the merged configuration to a file instead of stdout
        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long, help = "Exit with non-zero code when warnings are reported")]
        strict: bool,
    },

    /// Resolve the final configuration for specific files
    Resolve {
        /// Files to resolve
        #[arg(
            long = "file",
            value_name = "PATH",
            required = true,
            help = "File path to resolve, relative to the project root (can be used multiple times)"
        )]
        files: Vec<String>,

        /// Fragment files in precedence order (later wins); glob patterns are expanded
        #[arg(required = true, help = "Fragment files or glob patterns, lowest precedence first")]
        fragments: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format")]
        format: OutputFormat,

        /// Treat warnings as errors
        #[arg(long, help = "Exit with non-zero code when warnings are reported")]
        strict: bool,
    },

    /// Validate fragments without merging them
    #[command(alias = "check")]
    Validate {
        /// Fragment files; glob patterns are expanded
        #[arg(required = true, help = "Fragment files or glob patterns")]
        fragments: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format")]
        format: OutputFormat,

        /// Treat warnings as errors
        #[arg(long, help = "Exit with non-zero code when warnings are reported")]
        strict: bool,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "json", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Show the configuration in effect
    Show,

    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// TOML configuration format
    Toml,
}

fn main() {
    let cli = Cli::parse();

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "lintfold=error,lintfold_core=error",
        1 => "lintfold=warn,lintfold_core=warn",
        2 => "lintfold=info,lintfold_core=info",
        3 => "lintfold=debug,lintfold_core=debug",
        _ => "lintfold=trace,lintfold_core=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        std::process::exit(1);
    }

    match run_command(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("lintfold failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run the selected command; `Ok(false)` means it completed but the run failed
fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Merge {
            fragments,
            format,
            output,
            strict,
        }) => commands::merge_command(&fragments, format, output.as_deref(), strict, config_path),

        Some(Commands::Resolve {
            files,
            fragments,
            format,
            strict,
        }) => commands::resolve_command(&fragments, &files, format, strict, config_path),

        Some(Commands::Validate {
            fragments,
            format,
            strict,
        }) => commands::validate_command(&fragments, format, strict, config_path),

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => commands::config_init_command(format, force),
            ConfigAction::Show => commands::config_show_command(config_path),
            ConfigAction::Schema => commands::config_schema_command(),
        },

        Some(Commands::Version) => {
            println!("lintfold {}", lintfold_core::VERSION);
            Ok(true)
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(true)
        }
    }
}
