//! Bundling many strings into one plaintext request
//!
//! Groups are joined with an outer separator and the strings of a group
//! with an inner separator, each on its own line so that the backend treats
//! them as sentence breaks.

use crate::mt::error::{MtError, MtResult};
use regex::Regex;

/// Separator tokens for bundled requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separators {
    pub outer: String,
    pub inner: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            outer: ":!!!:".to_string(),
            inner: ":!!:".to_string(),
        }
    }
}

/// Join groups of strings into one text
pub fn bundle(groups: &[Vec<String>], separators: &Separators) -> String {
    let inner = format!("\n{}\n", separators.inner);
    let outer = format!("\n{}\n", separators.outer);
    groups
        .iter()
        .map(|group| group.join(&inner))
        .collect::<Vec<_>>()
        .join(&outer)
}

/// Split a translated bundle back into groups
///
/// Whitespace around the separators is dropped, since backends often move
/// or collapse it.
pub fn unbundle(bundled: &str, separators: &Separators) -> MtResult<Vec<Vec<String>>> {
    let pattern = |token: &str| {
        Regex::new(&format!(r"\s*{}\s*", regex::escape(token)))
            .map_err(|e| MtError::Bundle(format!("Bad separator {}: {}", token, e)))
    };
    let outer = pattern(&separators.outer)?;
    let inner = pattern(&separators.inner)?;
    Ok(outer
        .split(bundled)
        .map(|group| inner.split(group).map(str::to_string).collect())
        .collect())
}
