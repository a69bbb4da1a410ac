//! Apertium APY backend
//!
//! Talks to an [apertium-apy](https://github.com/apertium/apertium-apy)
//! instance: `GET /list` for language pairs and `GET /translate` for text.
//! Apertium uses its own three-letter codes, mapped to ISO codes here.
//!
//! # Example
//!
//! ```ignore
//! use parallel_translate::mt::{ApertiumTranslator, MachineTranslator};
//!
//! let apertium = ApertiumTranslator::new("https://apertium.example.org/apy")?;
//! let text = apertium.translate_plaintext("eng", "spa", "It is a big red box").await?;
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{LangPair, MachineTranslator};
use async_trait::async_trait;
use serde::Deserialize;

/// ISO code to Apertium code
const APERTIUM_FROM_ISO: &[(&str, &str)] = &[
    ("af", "afr"),
    ("an", "arg"),
    ("ar", "ara"),
    ("ast", "ast"),
    ("be", "bel"),
    ("bg", "bul"),
    ("br", "bre"),
    ("bs", "hbs_BS"),
    ("ca", "cat"),
    ("crh-latn", "crh"),
    ("cy", "cym"),
    ("da", "dan"),
    ("en", "eng"),
    ("eo", "epo"),
    ("es", "spa"),
    ("eu", "eus"),
    ("fr", "fra"),
    ("gl", "glg"),
    ("hi", "hin"),
    ("hr", "hbs_HR"),
    ("id", "ind"),
    ("is", "isl"),
    ("it", "ita"),
    ("kk", "kaz"),
    ("la", "lat"),
    ("mk", "mkd"),
    ("ms", "msa"),
    ("mt", "mlt"),
    ("nl", "nld"),
    ("nb", "nob"),
    ("nn", "nno"),
    ("no", "nob"),
    ("oc", "oci"),
    ("pt", "por"),
    ("ro", "ron"),
    ("ru", "rus"),
    ("sc", "srd"),
    ("se", "sme"),
    ("sh", "hbs"),
    ("sl", "slv"),
    ("sr", "hbs_SR"),
    ("sv", "swe"),
    ("tr", "tur"),
    ("tt", "tat"),
    ("uk", "ukr"),
    ("ur", "urd"),
];

/// Apertium codes that several ISO codes map to, with the ISO code to report
const ISO_FROM_SHARED_CODE: &[(&str, &str)] = &[("nob", "nb")];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    response_data: Vec<ApertiumPair>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApertiumPair {
    source_language: String,
    target_language: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    response_data: TranslatedText,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
}

#[derive(Debug, Clone)]
pub struct ApertiumTranslator {
    url: String,
    client: reqwest::Client,
}

impl ApertiumTranslator {
    /// Create a translator for the APY instance at `url`
    pub fn new(url: &str) -> MtResult<Self> {
        let url = url.trim().trim_end_matches('/');
        reqwest::Url::parse(url).map_err(|e| MtError::Config(format!("Invalid Apertium URL {}: {}", url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Create an ApertiumTranslator from the `APERTIUM_URL` environment variable
    pub fn from_env() -> MtResult<Self> {
        let url = std::env::var("APERTIUM_URL")
            .map_err(|_| MtError::Config("APERTIUM_URL environment variable not set".to_string()))?;
        Self::new(&url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: reqwest::Url) -> MtResult<T> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MtError::Backend(format!("Apertium error ({}): {}", status, error_text)));
        }
        response
            .json()
            .await
            .map_err(|e| MtError::Backend(format!("Failed to parse Apertium response: {}", e)))
    }
}

#[async_trait]
impl MachineTranslator for ApertiumTranslator {
    async fn translate_plaintext(&self, source_code: &str, target_code: &str, text: &str) -> MtResult<String> {
        let langpair = format!("{}|{}", source_code, target_code);
        let url = reqwest::Url::parse_with_params(
            &format!("{}/translate", self.url),
            &[("markUnknown", "no"), ("langpair", langpair.as_str()), ("q", text)],
        )
        .map_err(|e| MtError::Config(e.to_string()))?;
        let response: TranslateResponse = self.get_json(url).await?;
        Ok(response.response_data.translated_text)
    }

    async fn fetch_lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        let url = reqwest::Url::parse(&format!("{}/list", self.url)).map_err(|e| MtError::Config(e.to_string()))?;
        let response: ListResponse = self.get_json(url).await?;
        Ok(response
            .response_data
            .into_iter()
            .map(|pair| LangPair {
                source: pair.source_language,
                target: pair.target_language,
            })
            .collect())
    }

    fn code_from_iso(&self, iso: &str) -> String {
        let iso = iso.to_lowercase();
        APERTIUM_FROM_ISO
            .iter()
            .find(|(from, _)| *from == iso)
            .map_or(iso.clone(), |(_, code)| code.to_string())
    }

    fn iso_from_code(&self, code: &str) -> String {
        let shared = ISO_FROM_SHARED_CODE
            .iter()
            .find(|(apertium, _)| *apertium == code)
            .map(|(_, iso)| *iso);
        shared
            .or_else(|| {
                APERTIUM_FROM_ISO
                    .iter()
                    .find(|(_, apertium)| *apertium == code)
                    .map(|(iso, _)| *iso)
            })
            .unwrap_or(code)
            .to_string()
    }

    fn provider_name(&self) -> &str {
        "Apertium"
    }
}
