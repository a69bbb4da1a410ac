/// Machine Translation Module
///
/// This module translates annotated text ([`ChunkedText`](crate::chunked::ChunkedText))
/// with backends that only understand plain text.
///
/// # Overview
///
/// The MT module consists of several components working together:
///
/// 1. **Expansion** - One upper-cased variant per annotated chunk, plus the plain text
/// 2. **Bundling** - Every variant of every text in one request, split by separator tokens
/// 3. **Backends** - Apertium, Google Translate and Yandex behind [`MachineTranslator`]
/// 4. **Reassembly** - Relocates annotations by comparing variant translations
/// 5. **BundledTranslator** - Orchestrates the pipeline as a [`Translator`]
///
/// # Example
///
/// ```ignore
/// use parallel_translate::chunked::ChunkedText;
/// use parallel_translate::mt::{BundledTranslator, GoogleTranslateProvider, Translator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let translator = BundledTranslator::new(GoogleTranslateProvider::from_env()?);
///     let texts = vec![ChunkedText::plain("It is a big red box")];
///     let translated = translator.translate("en", "fr", &texts).await?;
///     println!("{:?}", translated);
///     Ok(())
/// }
/// ```
pub mod apertium;
pub mod bundle;
pub mod bundled;
pub mod error;
pub mod expansion;
pub mod google_translate;
pub mod mock;
pub mod rate_limit;
pub mod reassembly;
pub mod translator;
pub mod yandex;

pub use apertium::ApertiumTranslator;
pub use bundle::{Separators, bundle, unbundle};
pub use bundled::BundledTranslator;
pub use error::{MtError, MtResult};
pub use expansion::plex_group;
pub use google_translate::GoogleTranslateProvider;
pub use mock::{DoublingTranslator, MockMode, MockTranslator};
pub use rate_limit::RateLimiter;
pub use reassembly::adapt_annotations_with_modified_targets;
pub use translator::{LangPair, MachineTranslator, Translator, parallel_pairs, validate_locale};
pub use yandex::YandexTranslateProvider;
