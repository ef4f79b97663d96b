//! Configuration system for lintfold
//!
//! The engine configuration decides *how* fragments are composed. It does
//! not carry rules itself.
//!
//! ## Configuration Files
//!
//! Supported names, in discovery priority order:
//! - `.lintfoldrc.json`
//! - `.lintfoldrc.toml`
//! - `lintfold.yaml` / `lintfold.yml`
//! - `lintfold.json`
//!
//! When no explicit path is given, the loader searches from the current
//! directory upward until a file is found or the filesystem root is reached.
//! Finding nothing is not an error: the defaults apply.
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "merge": {
//!     // default for every array in settings / parserOptions
//!     "arrays": "replace",
//!     "settings": { "import/extensions": "concat" },
//!     "parserOptions": { "extraFileExtensions": "concat" }
//!   },
//!   "validation": {
//!     // plugins contributed by a shareable config outside the fragment set
//!     "ambientPlugins": ["import"]
//!   }
//! }
//! ```

mod lintfold_config;
mod loader;

pub use lintfold_config::{
    ArrayMerge, LintfoldConfig, MergePolicy, SettingsSection, ValidationOptions,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
