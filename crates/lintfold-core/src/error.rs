//! Error types for fragment loading, validation, and composition

use std::path::PathBuf;
use thiserror::Error;

/// A structural problem found in a single fragment.
///
/// These are fragment-local: they are produced by the validator without
/// consulting any other fragment, and any one of them rejects the whole
/// composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An override glob pattern cannot be parsed
    #[error("malformed pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// A rule key references a plugin namespace the fragment does not declare
    #[error("rule '{rule}' references plugin '{namespace}', which is not declared in plugins")]
    UnknownPluginNamespace { rule: String, namespace: String },
}

/// Main error type for lintfold operations
#[derive(Debug, Error)]
pub enum LintfoldError {
    /// A fragment failed validation; composition is rejected as a whole
    #[error("fragment '{fragment_id}' failed validation: {cause}")]
    FragmentValidationFailed {
        fragment_id: String,
        #[source]
        cause: ValidationError,
    },

    /// A fragment document could not be parsed into a rule-set fragment
    #[error("failed to parse fragment '{}': {message}", path.display())]
    FragmentParse { path: PathBuf, message: String },

    /// Engine configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of an output document failed
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Parse,
    Config,
    Io,
    Serialization,
}

impl LintfoldError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LintfoldError::FragmentValidationFailed { .. } => ErrorKind::Validation,
            LintfoldError::FragmentParse { .. } => ErrorKind::Parse,
            LintfoldError::ConfigError { .. } => ErrorKind::Config,
            LintfoldError::IoError { .. } => ErrorKind::Io,
            LintfoldError::SerializationError { .. } => ErrorKind::Serialization,
        }
    }

    /// The id of the fragment that caused the failure, when there is one
    pub fn fragment_id(&self) -> Option<&str> {
        match self {
            LintfoldError::FragmentValidationFailed { fragment_id, .. } => Some(fragment_id),
            _ => None,
        }
    }

    /// Create a validation failure for a fragment
    pub fn validation_failed(fragment_id: impl Into<String>, cause: ValidationError) -> Self {
        Self::FragmentValidationFailed {
            fragment_id: fragment_id.into(),
            cause,
        }
    }

    /// Create a fragment parse error
    pub fn fragment_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FragmentParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LintfoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_error(err.to_string())
    }
}

impl From<serde_yaml::Error> for LintfoldError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization_error(err.to_string())
    }
}
