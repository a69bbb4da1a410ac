//! Mock translators for testing
//!
//! This module provides deterministic, API-free translators for testing
//! the sync pipeline without requiring API keys or network access.
//!
//! * [`MockTranslator`] is a plaintext [`MachineTranslator`]. It translates
//!   line by line and passes separator lines through, like real backends do
//!   with the bundling separators.
//! * [`DoublingTranslator`] is a [`Translator`] that upper-cases and doubles
//!   every character, moving chunk annotations along exactly.
//!
//! # Example
//!
//! ```ignore
//! use parallel_translate::mt::{MachineTranslator, MockMode, MockTranslator};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate_plaintext("en", "fr", "hello").await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::chunked::{Chunk, ChunkedText, char_slice};
use crate::mt::bundle::Separators;
use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{LangPair, MachineTranslator, Translator, pair_supported};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined line mappings for realistic translations,
    /// falling back to suffix mode for unknown lines
    Mappings(HashMap<String, String>),

    /// Reverse the order of words separated by spaces
    Reorder,

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Language pairs between English, Spanish and French, in both directions
fn default_lang_pairs() -> Vec<LangPair> {
    let languages = ["en", "es", "fr"];
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

/// Plaintext translator that simulates various translation scenarios
///
/// Counts the backend calls it receives, so tests can check that bundling
/// issues exactly one request.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    lang_pairs: Vec<LangPair>,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            lang_pairs: default_lang_pairs(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// # Arguments
    ///
    /// * `mode` - The translation mode
    /// * `delay_ms` - Simulated delay in milliseconds
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Replace the reported language pairs
    pub fn with_lang_pairs(mut self, lang_pairs: Vec<LangPair>) -> Self {
        self.lang_pairs = lang_pairs;
        self
    }

    /// Number of `translate_plaintext` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Internal helper to apply the simulated delay
    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    /// Translate one line according to the mode
    fn translate_line(&self, line: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", line, target)),
            MockMode::Mappings(map) => Ok(map
                .get(line)
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", line, target))),
            MockMode::Reorder => Ok(line.split_whitespace().rev().collect::<Vec<_>>().join(" ")),
            MockMode::Error(msg) => Err(MtError::Backend(msg.clone())),
            MockMode::NoOp => Ok(line.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate_plaintext(&self, _source_code: &str, target_code: &str, text: &str) -> MtResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_delay().await;

        let separators = self.separators();
        text.split('\n')
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed == separators.outer || trimmed == separators.inner {
                    Ok(line.to_string())
                } else {
                    self.translate_line(line, target_code)
                }
            })
            .collect::<MtResult<Vec<_>>>()
            .map(|lines| lines.join("\n"))
    }

    async fn fetch_lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        if let MockMode::Error(msg) = &self.mode {
            return Err(MtError::Backend(msg.clone()));
        }
        Ok(self.lang_pairs.clone())
    }

    fn separators(&self) -> Separators {
        Separators::default()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

/// Chunk-level fake translator: "cat" → "CCAATT"
#[derive(Debug, Clone, Default)]
pub struct DoublingTranslator {
    /// Simulated delay (in milliseconds)
    delay_ms: u64,
}

impl DoublingTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn double(text: &str) -> String {
        text.chars()
            .flat_map(char::to_uppercase)
            .flat_map(|c| [c, c])
            .collect()
    }

    /// Translate one chunked text, moving each chunk to its doubled position
    pub fn translate_one(chunked: &ChunkedText) -> ChunkedText {
        let chunks = chunked
            .chunks
            .iter()
            .map(|chunk| Chunk {
                start: Self::double(&char_slice(&chunked.all_text, 0, chunk.start)).chars().count(),
                text: Self::double(&chunk.text),
                ann_list: chunk.ann_list.clone(),
            })
            .collect();
        ChunkedText::new(&Self::double(&chunked.all_text), chunked.common_ann_list.clone(), chunks)
    }
}

#[async_trait]
impl Translator for DoublingTranslator {
    async fn translate(&self, source_lang: &str, target_lang: &str, texts: &[ChunkedText]) -> MtResult<Vec<ChunkedText>> {
        let pairs = self.lang_pairs().await?;
        if !pair_supported(&pairs, source_lang, target_lang) {
            return Err(MtError::unsupported(source_lang, target_lang));
        }
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        Ok(texts.iter().map(Self::translate_one).collect())
    }

    async fn lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        Ok(default_lang_pairs())
    }

    fn name(&self) -> &str {
        "Doubling Translator"
    }
}
