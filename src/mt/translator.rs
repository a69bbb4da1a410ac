//! Translator traits
//!
//! Two levels of abstraction:
//!
//! * [`MachineTranslator`] is a plaintext backend (Apertium, Google, Yandex,
//!   mock). It speaks the backend's own language codes.
//! * [`Translator`] translates annotated [`ChunkedText`]s between ISO codes.
//!   [`BundledTranslator`](crate::mt::BundledTranslator) implements it over any
//!   `MachineTranslator` by bundling every string into one request.
//!
//! # Example
//!
//! ```ignore
//! use parallel_translate::mt::{ApertiumTranslator, BundledTranslator, Translator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = BundledTranslator::new(ApertiumTranslator::from_env()?);
//!     let pairs = translator.parallel_lang_pairs().await?;
//!     println!("{:?}", pairs);
//!     Ok(())
//! }
//! ```

use crate::chunked::ChunkedText;
use crate::mt::bundle::Separators;
use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;
use icu_locale::Locale;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A supported translation direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangPair {
    pub source: String,
    pub target: String,
}

impl LangPair {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Plaintext machine translation backend
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate plaintext between two backend language codes
    ///
    /// # Arguments
    ///
    /// * `source_code` - Backend code of the source language (e.g., "eng")
    /// * `target_code` - Backend code of the target language (e.g., "spa")
    /// * `text` - The text to translate; may contain newlines and separator tokens
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails
    async fn translate_plaintext(&self, source_code: &str, target_code: &str, text: &str) -> MtResult<String>;

    /// Fetch the supported language pairs, in backend codes
    async fn fetch_lang_pairs(&self) -> MtResult<Vec<LangPair>>;

    /// Backend code for an ISO language code
    fn code_from_iso(&self, iso: &str) -> String {
        iso.to_string()
    }

    /// ISO language code for a backend code
    fn iso_from_code(&self, code: &str) -> String {
        code.to_string()
    }

    /// Separator tokens that survive translation on this backend
    fn separators(&self) -> Separators {
        Separators::default()
    }

    /// Get the name of this translation provider
    ///
    /// Used for logging and debugging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;
}

/// Translator of annotated text between ISO language codes
#[async_trait]
pub trait Translator: Send + Sync {
    /// Machine translate chunked source texts
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ChunkedText>)` - One translation per input, in order
    /// * `Err(MtError::UnsupportedLanguagePair)` - Before any request, if the
    ///   pair is not supported
    async fn translate(&self, source_lang: &str, target_lang: &str, texts: &[ChunkedText]) -> MtResult<Vec<ChunkedText>>;

    /// Supported language pairs, in ISO codes
    async fn lang_pairs(&self) -> MtResult<Vec<LangPair>>;

    /// Pairs supported in both directions
    async fn parallel_lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        let pairs = self.lang_pairs().await?;
        Ok(parallel_pairs(&pairs))
    }

    fn name(&self) -> &str;
}

/// Keep the pairs whose reverse is also present
pub fn parallel_pairs(pairs: &[LangPair]) -> Vec<LangPair> {
    let directions: HashSet<(&str, &str)> = pairs
        .iter()
        .map(|pair| (pair.source.as_str(), pair.target.as_str()))
        .collect();
    pairs
        .iter()
        .filter(|pair| directions.contains(&(pair.target.as_str(), pair.source.as_str())))
        .cloned()
        .collect()
}

pub fn pair_supported(pairs: &[LangPair], source: &str, target: &str) -> bool {
    pairs.iter().any(|pair| pair.source == source && pair.target == target)
}

/// Validate that a language code is a well-formed locale identifier
///
/// # Example
///
/// ```ignore
/// validate_locale("en")?; // OK
/// validate_locale("zh-Hans")?; // OK
/// validate_locale("invalid@code").unwrap_err(); // Error
/// ```
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }
    locale
        .parse::<Locale>()
        .map(|_| ())
        .map_err(|e| MtError::InvalidLocale(format!("Invalid locale code {}: {}", locale, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_pairs() {
        let pairs = vec![
            LangPair::new("en", "es"),
            LangPair::new("es", "en"),
            LangPair::new("en", "ca"),
        ];
        assert_eq!(
            parallel_pairs(&pairs),
            vec![LangPair::new("en", "es"), LangPair::new("es", "en")]
        );
    }

    #[test]
    fn test_pair_supported() {
        let pairs = vec![LangPair::new("en", "es")];
        assert!(pair_supported(&pairs, "en", "es"));
        assert!(!pair_supported(&pairs, "es", "en"));
    }

    #[test]
    fn test_validate_locale_valid_codes() {
        assert!(validate_locale("en").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("zh-Hans").is_ok());
        assert!(validate_locale("crh-latn").is_ok());
    }

    #[test]
    fn test_validate_locale_invalid_codes() {
        assert!(validate_locale("").is_err());
        assert!(validate_locale("en@invalid").is_err());
        assert!(validate_locale("fr#bad").is_err());
        assert!(validate_locale("es!error").is_err());
    }

    #[test]
    fn test_validate_locale_error_messages() {
        match validate_locale("en@US") {
            Err(MtError::InvalidLocale(msg)) => {
                assert!(msg.contains("en@US"));
            }
            _ => panic!("Expected InvalidLocale error"),
        }
    }
}
