//! One round of translations
//!
//! A round is collected from the pending pairs, translated without holding
//! the documents, and then completed against the documents as they are by
//! then. Pairs whose source or target moved on in the meantime are left
//! pending.

use super::NodeKey;
use crate::chunked::ChunkedText;
use crate::mt::{MtError, MtResult, Translator};
use std::sync::Arc;

/// Everything needed to translate one node pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairRequest {
    pub source: NodeKey,
    pub target: NodeKey,
    pub source_lang: String,
    pub target_lang: String,
    /// Source content at the last approval
    pub old_source: ChunkedText,
    /// Source content when the round started
    pub new_source: ChunkedText,
    /// Target content at the last approval
    pub old_target: ChunkedText,
    /// Target content when the round started
    pub current_target: ChunkedText,
}

/// Machine translations of the old and new source
#[derive(Debug, Clone, PartialEq)]
pub struct Translations {
    pub old_mt: ChunkedText,
    pub new_mt: ChunkedText,
}

#[derive(Debug)]
pub struct PairOutcome {
    pub request: PairRequest,
    pub result: MtResult<Translations>,
}

pub struct TranslationRound {
    translator: Option<Arc<dyn Translator>>,
    requests: Vec<PairRequest>,
}

impl std::fmt::Debug for TranslationRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationRound")
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("requests", &self.requests)
            .finish()
    }
}

impl TranslationRound {
    pub fn new(translator: Option<Arc<dyn Translator>>, requests: Vec<PairRequest>) -> Self {
        Self { translator, requests }
    }

    pub fn requests(&self) -> &[PairRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Translate every request, old and new source in one call per pair
    ///
    /// Requests run one after another, so a rate-limited backend sees no
    /// burst from a single round.
    pub async fn run(self) -> Vec<PairOutcome> {
        let Some(translator) = self.translator else {
            return Vec::new();
        };
        let mut outcomes = Vec::with_capacity(self.requests.len());
        for request in self.requests {
            let texts = [request.old_source.clone(), request.new_source.clone()];
            let result = translator
                .translate(&request.source_lang, &request.target_lang, &texts)
                .await
                .and_then(|mut translated| {
                    if translated.len() != 2 {
                        return Err(MtError::Bundle(format!(
                            "Expected 2 translations, got {}",
                            translated.len()
                        )));
                    }
                    let new_mt = translated.pop().unwrap_or_default();
                    let old_mt = translated.pop().unwrap_or_default();
                    Ok(Translations { old_mt, new_mt })
                });
            outcomes.push(PairOutcome { request, result });
        }
        outcomes
    }
}
