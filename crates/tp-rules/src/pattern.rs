//! Substring-style pattern matching for language codes and titles.
//!
//! Patterns are regular expressions searched anywhere in the text, so a
//! plain word like `eng` behaves as a substring match and anchors (`^eng$`)
//! give exact matching when needed.

use regex::Regex;
use std::fmt;

/// A pattern compiled once at rule-load time.
///
/// Invalid syntax is not fatal: the pattern is kept and never matches.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Result<Regex, String>,
}

impl Pattern {
    /// Compile a case-sensitive pattern (used for language codes).
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| {
            tracing::warn!("Invalid pattern '{}': {}", source, e);
            e.to_string()
        });
        Self { source, regex }
    }

    /// Compile a title pattern; the source is lower-cased first.
    pub fn title(source: &str) -> Self {
        Self::new(source.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_ok()
    }

    /// Test the pattern against `text`. Invalid patterns never match.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Ok(regex) => regex.is_match(text),
            Err(e) => {
                tracing::trace!("Skipping invalid pattern '{}': {}", self.source, e);
                false
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// One-shot pattern match for ad-hoc use; compiles `pattern` on every call.
///
/// An invalid pattern is logged and treated as non-matching.
pub fn matches(text: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(text),
        Err(e) => {
            tracing::warn!("Invalid pattern '{}': {}", pattern, e);
            false
        }
    }
}

/// Lower-case `title` and test it against any of the (lower-cased) patterns.
pub fn title_matches_any(title: Option<&str>, patterns: &[Pattern]) -> bool {
    match title {
        Some(title) => {
            let title = title.to_lowercase();
            patterns.iter().any(|p| p.is_match(&title))
        }
        None => false,
    }
}
