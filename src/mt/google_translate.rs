//! Google Translate v2 backend
//!
//! Wraps the v2 REST endpoints as a plaintext
//! [`MachineTranslator`]. Requests go through a latest-only
//! [`RateLimiter`]: when a burst of requests arrives, only the last one is
//! sent and the earlier ones fail with [`MtError::Superseded`].
//!
//! # Authentication
//!
//! [`GoogleTranslateProvider::from_env`] reads the key from
//! `GOOGLE_TRANSLATE_API_KEY`.
//!
//! # Example
//!
//! ```ignore
//! use parallel_translate::mt::{BundledTranslator, GoogleTranslateProvider, Translator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = BundledTranslator::new(GoogleTranslateProvider::from_env()?);
//!     let texts = vec![ChunkedText::plain("Hello, world!")];
//!     let results = translator.translate("en", "fr", &texts).await?;
//!     println!("{}", results[0].all_text);
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::rate_limit::RateLimiter;
use crate::mt::translator::{LangPair, MachineTranslator};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());

/// ISO codes that Google spells differently
const GOOGLE_FROM_ISO: &[(&str, &str)] = &[
    ("he", "iw"),
    ("jv", "jw"),
    ("zh-hans", "zh-CN"),
    ("zh-hant", "zh-TW"),
];

/// Plaintext translation through Google Translate v2
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    /// Endpoint root; `/languages` lives under it
    base_url: String,
    /// Shared by clones so they throttle together
    limiter: Arc<RateLimiter>,
}

impl GoogleTranslateProvider {
    /// Window during which a newer request supersedes an older one
    const RATE_LIMIT_WINDOW: Duration = Duration::from_millis(100);

    /// Build a provider for `api_key`
    ///
    /// # Returns
    ///
    /// * `Err(MtError::Config)` - The key is blank
    /// * `Err(MtError::Network)` - The HTTP client could not be built
    ///
    /// # Example
    ///
    /// ```ignore
    /// let provider = GoogleTranslateProvider::new("your-api-key".to_string())?;
    /// ```
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
            limiter: Arc::new(RateLimiter::new(Self::RATE_LIMIT_WINDOW)),
        })
    }

    /// Build a provider from `GOOGLE_TRANSLATE_API_KEY`
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("GOOGLE_TRANSLATE_API_KEY").map_err(|_| {
            MtError::Config("GOOGLE_TRANSLATE_API_KEY environment variable not set".to_string())
        })?;

        Self::new(api_key)
    }

    /// Replace the default 100 ms rate-limit window
    pub fn with_rate_limit_window(mut self, window: Duration) -> Self {
        self.limiter = Arc::new(RateLimiter::new(window));
        self
    }

    /// Map an unsuccessful response to an error
    async fn check_status(response: reqwest::Response) -> MtResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(if status.is_client_error() {
            MtError::Config(format!("API client error ({}): {}", status, error_text))
        } else {
            MtError::Backend(format!("API server error ({}): {}", status, error_text))
        })
    }

    async fn send_translation(&self, source_code: &str, target_code: &str, text: &str) -> MtResult<String> {
        let url = format!("{}?key={}", self.base_url, self.api_key);
        let body = json!({
            "q": text,
            "source": source_code,
            "target": target_code,
            "format": "text"
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = Self::check_status(response).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MtError::Backend(format!("Failed to parse API response: {}", e)))?;

        let translated = json["data"]["translations"][0]["translatedText"]
            .as_str()
            .ok_or_else(|| {
                MtError::Backend("Invalid API response: missing 'data.translations[0].translatedText'".to_string())
            })?;
        Ok(unescape_numeric_entities(translated))
    }
}

/// Decode `&#NN;` entities, which the API emits even in text format
fn unescape_numeric_entities(text: &str) -> String {
    NUMERIC_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Every ordered pair of distinct languages
fn all_pairs(languages: &[String]) -> Vec<LangPair> {
    languages
        .iter()
        .flat_map(|source| {
            languages
                .iter()
                .filter(move |target| *target != source)
                .map(move |target| LangPair::new(source, target))
        })
        .collect()
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate_plaintext(&self, source_code: &str, target_code: &str, text: &str) -> MtResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        self.limiter
            .run(self.send_translation(source_code, target_code, text))
            .await
    }

    async fn fetch_lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        let url = format!("{}/languages?key={}", self.base_url, self.api_key);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MtError::Backend(format!("Failed to parse API response: {}", e)))?;
        let languages: Vec<String> = json["data"]["languages"]
            .as_array()
            .ok_or_else(|| MtError::Backend("Invalid API response: missing 'data.languages' array".to_string()))?
            .iter()
            .filter_map(|language| language["language"].as_str().map(str::to_string))
            .collect();
        Ok(all_pairs(&languages))
    }

    fn code_from_iso(&self, iso: &str) -> String {
        let lower = iso.to_lowercase();
        GOOGLE_FROM_ISO
            .iter()
            .find(|(from, _)| *from == lower)
            .map_or_else(|| iso.to_string(), |(_, code)| code.to_string())
    }

    fn iso_from_code(&self, code: &str) -> String {
        GOOGLE_FROM_ISO
            .iter()
            .find(|(_, google)| *google == code)
            .map_or_else(|| code.to_string(), |(iso, _)| iso.to_string())
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Initialization Tests ==========

    #[test]
    fn test_new_with_valid_key() {
        let provider = GoogleTranslateProvider::new("test-api-key".to_string());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().provider_name(), "Google Translate");
    }

    #[test]
    fn test_new_with_empty_key() {
        let result = GoogleTranslateProvider::new("".to_string());
        match result {
            Err(MtError::Config(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_new_with_whitespace_key() {
        assert!(GoogleTranslateProvider::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_rate_limit_window() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.limiter.window(), Duration::from_millis(100));
        let provider = provider.with_rate_limit_window(Duration::from_millis(10));
        assert_eq!(provider.limiter.window(), Duration::from_millis(10));
    }

    // ========== Code Mapping Tests ==========

    #[test]
    fn test_code_from_iso() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.code_from_iso("he"), "iw");
        assert_eq!(provider.code_from_iso("zh-Hans"), "zh-CN");
        assert_eq!(provider.code_from_iso("fr"), "fr");
    }

    #[test]
    fn test_iso_from_code() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.iso_from_code("jw"), "jv");
        assert_eq!(provider.iso_from_code("zh-TW"), "zh-hant");
        assert_eq!(provider.iso_from_code("de"), "de");
    }

    // ========== Response Handling Tests ==========

    #[test]
    fn test_unescape_numeric_entities() {
        assert_eq!(unescape_numeric_entities("l&#39;homme"), "l'homme");
        assert_eq!(unescape_numeric_entities("&#34;hi&#34;"), "\"hi\"");
        assert_eq!(unescape_numeric_entities("plain"), "plain");
        assert_eq!(unescape_numeric_entities("&#99999999999;"), "&#99999999999;");
    }

    #[test]
    fn test_all_pairs() {
        let languages = vec!["en".to_string(), "es".to_string(), "fr".to_string()];
        let pairs = all_pairs(&languages);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&LangPair::new("fr", "en")));
        assert!(!pairs.contains(&LangPair::new("en", "en")));
    }

    #[tokio::test]
    async fn test_translate_empty_text() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let result = provider.translate_plaintext("en", "fr", "").await.unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = GoogleTranslateProvider::new("secret-key".to_string()).unwrap();
        let rendered = format!("{:?}", provider);
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("secret-key"));
    }

    // ========== Live API (needs GOOGLE_TRANSLATE_API_KEY) ==========

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_translation() {
        if std::env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
            eprintln!("Skipping: GOOGLE_TRANSLATE_API_KEY not set");
            return;
        }

        let provider = GoogleTranslateProvider::from_env().unwrap();
        let result = provider.translate_plaintext("en", "fr", "Hello").await.unwrap();
        assert!(!result.is_empty());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_keeps_separators() {
        if std::env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
            eprintln!("Skipping: GOOGLE_TRANSLATE_API_KEY not set");
            return;
        }

        let provider = GoogleTranslateProvider::from_env().unwrap();
        let text = "The cat\n:!!:\nThe dog";
        let result = provider.translate_plaintext("en", "fr", text).await.unwrap();
        println!("Translated: {}", result);
        assert!(result.contains(":!!:"));
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_invalid_key() {
        let provider = GoogleTranslateProvider::new("invalid-key-xyz".to_string()).unwrap();
        let result = provider.translate_plaintext("en", "fr", "hello").await;
        assert!(matches!(result, Err(MtError::Config(_)) | Err(MtError::Backend(_))));
    }
}
