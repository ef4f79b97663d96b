//! Glob matching for override file patterns
//!
//! Patterns follow the usual glob rules: `*` matches a run of characters
//! within one path component, `**` crosses separators, `?` matches a single
//! character, `[...]` is a character class and `{a,b}` is alternation.
//!
//! A pattern without any `/` is matched against the final component of the
//! path, so `*.test.js` applies to `src/a.test.js` as well as `a.test.js`.
//! Paths are expected relative to the project root; backslashes are treated
//! as separators and a leading `./` is ignored.
//!
//! The `!` negation prefix is not interpreted by [`matches`]; callers split it
//! off with [`split_negation`] (or use [`FilePattern`], which does both).

use crate::error::ValidationError;
use globset::{GlobBuilder, GlobMatcher};
use std::borrow::Cow;

/// Prefix marking a pattern as an exclusion
pub const NEGATION_PREFIX: char = '!';

/// A compiled override pattern, possibly negated
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    negated: bool,
    match_base: bool,
    matcher: GlobMatcher,
}

impl FilePattern {
    /// Compile a pattern as written in an override block, including any `!` prefix
    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let (negated, body) = split_negation(pattern);
        let matcher = compile(body).map_err(|reason| ValidationError::MalformedPattern {
            pattern: pattern.to_string(),
            reason,
        })?;

        Ok(Self {
            source: pattern.to_string(),
            negated,
            match_base: !body.contains('/'),
            matcher,
        })
    }

    /// The pattern text as originally written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this pattern excludes rather than includes
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Literal match of the pattern body against `path`, ignoring negation
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        if self.match_base {
            self.matcher.is_match(base_name(&path))
        } else {
            self.matcher.is_match(&*path)
        }
    }
}

/// Split the `!` prefix off a pattern, returning whether it was present
pub fn split_negation(pattern: &str) -> (bool, &str) {
    match pattern.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, pattern),
    }
}

/// Whether `pattern` (already stripped of any `!`) matches `path`
///
/// Malformed patterns never match.
pub fn matches(pattern: &str, path: &str) -> bool {
    let Ok(matcher) = compile(pattern) else {
        return false;
    };
    let path = normalize_path(path);
    if pattern.contains('/') {
        matcher.is_match(&*path)
    } else {
        matcher.is_match(base_name(&path))
    }
}

/// Whether `pattern` (already stripped of any `!`) is syntactically valid
pub fn is_well_formed(pattern: &str) -> bool {
    compile(pattern).is_ok()
}

/// Normalize a file path for matching: `\` becomes `/`, leading `./` is dropped
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        let replaced = path.replace('\\', "/");
        Cow::Owned(strip_dot_prefix(&replaced).to_string())
    } else {
        Cow::Borrowed(strip_dot_prefix(path))
    }
}

fn strip_dot_prefix(mut path: &str) -> &str {
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn compile(body: &str) -> Result<GlobMatcher, String> {
    if body.is_empty() {
        return Err("pattern is empty".to_string());
    }

    GlobBuilder::new(body)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| e.kind().to_string())
}
