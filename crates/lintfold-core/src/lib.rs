//! Lintfold Core
//!
//! Composition engine for lint rule-set fragments.
//! A fragment is a partial lint configuration (rules, plugin declarations,
//! shared settings, file-scoped overrides). This crate validates fragments,
//! merges an ordered list of them into one effective configuration, and
//! resolves that configuration for individual file paths.
//!
//! ```ignore
//! let fragments = FragmentLoader::load_all(&["base.json", "jest.yaml"])?;
//! let outcome = MergeEngine::default().merge(&fragments)?;
//! let resolved = resolve(&outcome.config, "src/app.test.js");
//! ```

pub mod config;
pub mod diagnostics;
pub mod effective;
pub mod error;
pub mod fragment;
pub mod loader;
pub mod merge;
pub mod pattern;
pub mod resolve;
pub mod result;
pub mod validate;

// Configuration system
pub use config::{
    ArrayMerge, ConfigLoader, LintfoldConfig, MergePolicy, SettingsSection, ValidationOptions,
};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticLevel};
pub use effective::{
    EffectiveConfiguration, OverrideSource, Provenance, ResolvedFileConfiguration, ScopedOverride,
};
pub use error::{ErrorKind, LintfoldError, ValidationError};
pub use fragment::{
    OverrideBlock, RuleKey, RuleMap, RuleSetFragment, RuleSetting, SettingsMap, Severity,
};
pub use loader::{DocumentFormat, FragmentLoader};
pub use merge::{MergeEngine, MergeOutcome, merge};
pub use pattern::FilePattern;
pub use resolve::{OverrideResolver, resolve, resolve_all};
pub use result::Result;
pub use validate::{FragmentValidator, ValidationResult, normalize_plugin_name, validate};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lintfold=info,lintfold_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
