//! Schema and table name patterns.
//!
//! A pattern is written in one of three forms:
//!
//! - `~regex`: a regular expression, matched unanchored unless the author anchors it.
//! - a glob containing `*` (any run of characters) or `?` (exactly one character), always
//!   matched against the whole name.
//! - an exact name.
//!
//! Patterns are compiled once and follow the task [`Collation`].

use regex::{Regex, RegexBuilder};

use crate::bail;
use crate::error::{ErrorKind, SyncerResult};
use crate::types::Collation;

/// Prefix marking a pattern as a regular expression.
const REGEX_PREFIX: char = '~';

/// A compiled schema or table name pattern.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact { folded: String, collation: Collation },
    Wildcard,
    Regex(Regex),
}

impl NamePattern {
    /// Compiles `pattern` under the given collation.
    pub fn new(pattern: &str, collation: Collation) -> SyncerResult<NamePattern> {
        if pattern.is_empty() {
            bail!(ErrorKind::InvalidPattern, "Name pattern cannot be empty");
        }

        let matcher = if let Some(expression) = pattern.strip_prefix(REGEX_PREFIX) {
            if expression.is_empty() {
                bail!(
                    ErrorKind::InvalidPattern,
                    "Regular expression pattern cannot be empty",
                    pattern
                );
            }
            Matcher::Regex(build_regex(expression, collation)?)
        } else if pattern == "*" {
            Matcher::Wildcard
        } else if pattern.contains(['*', '?']) {
            Matcher::Regex(build_regex(&glob_to_regex(pattern), collation)?)
        } else {
            Matcher::Exact {
                folded: collation.fold(pattern).into_owned(),
                collation,
            }
        };

        Ok(NamePattern {
            source: pattern.to_string(),
            matcher,
        })
    }

    /// Returns `true` if `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Exact { folded, collation } => collation.fold(name) == folded.as_str(),
            Matcher::Wildcard => true,
            Matcher::Regex(regex) => regex.is_match(name),
        }
    }

    /// Returns the pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn build_regex(expression: &str, collation: Collation) -> SyncerResult<Regex> {
    let regex = RegexBuilder::new(expression)
        .case_insensitive(collation == Collation::CaseInsensitive)
        .build()?;

    Ok(regex)
}

/// Translates a glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let escaped = regex::escape(glob);
    let body = escaped.replace(r"\*", ".*").replace(r"\?", ".");

    format!("^{body}$")
}
