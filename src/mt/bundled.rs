//! Annotated translation over a plaintext backend
//!
//! [`BundledTranslator`] turns any [`MachineTranslator`] into a
//! [`Translator`]: every variant of every input goes out in one bundled
//! request, and annotations are relocated from the upper-cased variants.

use crate::chunked::ChunkedText;
use crate::mt::bundle::{bundle, unbundle};
use crate::mt::error::{MtError, MtResult};
use crate::mt::expansion::plex_group;
use crate::mt::reassembly::adapt_annotations_with_modified_targets;
use crate::mt::translator::{LangPair, MachineTranslator, Translator, pair_supported, validate_locale};
use async_trait::async_trait;
use tokio::sync::OnceCell;

pub struct BundledTranslator<M> {
    machine: M,
    /// Supported pairs in ISO codes, fetched once
    lang_pairs: OnceCell<Vec<LangPair>>,
}

impl<M: MachineTranslator> BundledTranslator<M> {
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            lang_pairs: OnceCell::new(),
        }
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }
}

impl<M: MachineTranslator + std::fmt::Debug> std::fmt::Debug for BundledTranslator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundledTranslator")
            .field("machine", &self.machine)
            .finish()
    }
}

#[async_trait]
impl<M: MachineTranslator> Translator for BundledTranslator<M> {
    async fn translate(&self, source_lang: &str, target_lang: &str, texts: &[ChunkedText]) -> MtResult<Vec<ChunkedText>> {
        validate_locale(source_lang)?;
        validate_locale(target_lang)?;
        let pairs = self.lang_pairs().await?;
        if !pair_supported(&pairs, source_lang, target_lang) {
            return Err(MtError::unsupported(source_lang, target_lang));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let groups: Vec<Vec<String>> = texts.iter().map(plex_group).collect();
        let separators = self.machine.separators();
        let request = bundle(&groups, &separators);
        tracing::debug!(
            provider = self.machine.provider_name(),
            source_lang,
            target_lang,
            texts = texts.len(),
            variants = groups.iter().map(Vec::len).sum::<usize>(),
            "Sending bundled translation request"
        );
        let response = self
            .machine
            .translate_plaintext(
                &self.machine.code_from_iso(source_lang),
                &self.machine.code_from_iso(target_lang),
                &request,
            )
            .await?;

        let translated_groups = unbundle(&response, &separators)?;
        if translated_groups.len() != groups.len() {
            return Err(MtError::Bundle(format!(
                "Expected {} texts, got {}",
                groups.len(),
                translated_groups.len()
            )));
        }
        texts
            .iter()
            .zip(groups.iter().zip(translated_groups))
            .map(|(source, (group, mut translated))| {
                if translated.len() != group.len() {
                    return Err(MtError::Bundle(format!(
                        "Expected {} variants, got {}",
                        group.len(),
                        translated.len()
                    )));
                }
                let plain = translated.pop().unwrap_or_default();
                Ok(adapt_annotations_with_modified_targets(source, &plain, &translated))
            })
            .collect()
    }

    async fn lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        let pairs = self
            .lang_pairs
            .get_or_try_init(|| async {
                let pairs = self.machine.fetch_lang_pairs().await?;
                Ok::<_, MtError>(
                    pairs
                        .iter()
                        .map(|pair| {
                            LangPair::new(
                                &self.machine.iso_from_code(&pair.source),
                                &self.machine.iso_from_code(&pair.target),
                            )
                        })
                        .collect(),
                )
            })
            .await?;
        Ok(pairs.clone())
    }

    fn name(&self) -> &str {
        self.machine.provider_name()
    }
}
