use thiserror::Error;

/// Error types for the machine translation layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// The backend does not translate between these languages
    #[error("Unsupported language pair: {source_lang} -> {target_lang}")]
    UnsupportedLanguagePair {
        source_lang: String,
        target_lang: String,
    },
    /// A language code that is not a valid locale
    #[error("Invalid locale code: {0}")]
    InvalidLocale(String),
    /// Missing or invalid backend configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// The request could not be sent or the response could not be read
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with an error
    #[error("Translation backend error: {0}")]
    Backend(String),
    /// The unbundled response does not match the shape of the request
    #[error("Bundle error: {0}")]
    Bundle(String),
    /// A rate-limited request was replaced by a newer one
    #[error("Request superseded by a newer request")]
    Superseded,
}

impl MtError {
    pub fn unsupported(source_lang: &str, target_lang: &str) -> Self {
        MtError::UnsupportedLanguagePair {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::Network(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
