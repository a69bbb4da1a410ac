//! Yandex Translate API v1.5 provider
//!
//! The key is read from `YANDEX_TRANSLATE_API_KEY`. Yandex uses ISO codes
//! directly, and names directions as `"en-ru"`.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{LangPair, MachineTranslator};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Deserialize)]
struct LangsResponse {
    dirs: Vec<String>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    text: Vec<String>,
}

#[derive(Clone)]
pub struct YandexTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl YandexTranslateProvider {
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            client,
            base_url: "https://translate.yandex.net/api/v1.5/tr.json".to_string(),
        })
    }

    /// Create a provider from the `YANDEX_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("YANDEX_TRANSLATE_API_KEY").map_err(|_| {
            MtError::Config("YANDEX_TRANSLATE_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> MtResult<T> {
        let mut query = vec![("key", self.api_key.as_str())];
        query.extend_from_slice(params);
        let url = reqwest::Url::parse_with_params(&format!("{}/{}", self.base_url, endpoint), &query)
            .map_err(|e| MtError::Config(e.to_string()))?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(if status.is_client_error() {
                MtError::Config(format!("API client error ({}): {}", status, error_text))
            } else {
                MtError::Backend(format!("API server error ({}): {}", status, error_text))
            });
        }
        response
            .json()
            .await
            .map_err(|e| MtError::Backend(format!("Failed to parse API response: {}", e)))
    }
}

/// Parse a direction such as `"en-ru"`
fn parse_dir(dir: &str) -> Option<LangPair> {
    let (source, target) = dir.split_once('-')?;
    (!source.is_empty() && !target.is_empty()).then(|| LangPair::new(source, target))
}

impl std::fmt::Debug for YandexTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for YandexTranslateProvider {
    async fn translate_plaintext(&self, source_code: &str, target_code: &str, text: &str) -> MtResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let lang = format!("{}-{}", source_code, target_code);
        let response: TranslateResponse = self
            .get_json("translate", &[("lang", lang.as_str()), ("text", text)])
            .await?;
        Ok(response.text.concat())
    }

    async fn fetch_lang_pairs(&self) -> MtResult<Vec<LangPair>> {
        let response: LangsResponse = self.get_json("getLangs", &[]).await?;
        Ok(response.dirs.iter().filter_map(|dir| parse_dir(dir)).collect())
    }

    fn provider_name(&self) -> &str {
        "Yandex Translate"
    }
}
