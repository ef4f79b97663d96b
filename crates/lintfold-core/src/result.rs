//! Result type alias for lintfold operations

use crate::error::LintfoldError;

/// Standard Result type for lintfold operations
pub type Result<T> = std::result::Result<T, LintfoldError>;
