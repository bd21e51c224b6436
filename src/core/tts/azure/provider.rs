//! Azure Text-to-Speech request builder and synthesizer.
//!
//! Each call posts one SSML document to
//! `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1` and writes
//! the returned MP3 bytes to `{audio_dir}/{id}.mp3`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::config::{
    AZURE_OUTPUT_FORMAT_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, AzureTTSConfig, build_ssml,
    locale_for_language, voice_for_language,
};
use crate::core::tts::base::{SpeechSynthesizer, TTSError, TTSResult};
use crate::utils::req_manager::ReqManager;

const USER_AGENT: &str = "quick-cards-app";

/// Builds synthesis requests for one Azure Speech resource.
#[derive(Debug, Clone)]
pub struct AzureRequestBuilder {
    azure_config: AzureTTSConfig,
}

impl AzureRequestBuilder {
    pub fn new(azure_config: AzureTTSConfig) -> Self {
        Self { azure_config }
    }

    /// Build the POST request for `text` spoken in `language`.
    ///
    /// - **Headers**: subscription key, `application/ssml+xml`, output format, user agent
    /// - **Body**: SSML with the voice and locale mapped from `language`
    pub fn build_http_request(
        &self,
        client: &reqwest::Client,
        text: &str,
        language: &str,
    ) -> reqwest::RequestBuilder {
        let ssml_body = build_ssml(
            text,
            voice_for_language(language),
            locale_for_language(language),
        );

        client
            .post(self.azure_config.build_tts_url())
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, &self.azure_config.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header(
                AZURE_OUTPUT_FORMAT_HEADER,
                self.azure_config.output_format.as_str(),
            )
            .header("User-Agent", USER_AGENT)
            .body(ssml_body)
    }
}

/// Azure speech synthesizer writing one audio file per card.
pub struct AzureTTS {
    request_builder: AzureRequestBuilder,
    req_manager: Arc<ReqManager>,
}

impl AzureTTS {
    /// Creates a synthesizer sharing `req_manager`'s HTTP client.
    ///
    /// Fails if the subscription key is empty.
    pub fn new(config: AzureTTSConfig, req_manager: Arc<ReqManager>) -> TTSResult<Self> {
        if config.subscription_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Azure subscription key is required".to_string(),
            ));
        }

        info!(
            "Azure TTS configured for {} ({})",
            config.build_tts_url(),
            config.output_format.as_str()
        );

        Ok(Self {
            request_builder: AzureRequestBuilder::new(config),
            req_manager,
        })
    }

    pub fn azure_config(&self) -> &AzureTTSConfig {
        &self.request_builder.azure_config
    }

    fn output_path(&self, id: &str) -> PathBuf {
        let config = self.azure_config();
        config
            .audio_dir
            .join(format!("{id}.{}", config.output_format.file_extension()))
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureTTS {
    async fn synthesize(&self, text: &str, id: &str, language: &str) -> TTSResult<PathBuf> {
        let audio = {
            let guard = self
                .req_manager
                .acquire()
                .await
                .map_err(|e| TTSError::NetworkError(e.to_string()))?;

            let request = self
                .request_builder
                .build_http_request(guard.client(), text, language);
            let response = guard.send(request).await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                warn!("Azure TTS rate limited card {id} (retry-after: {retry_after:?})");
                return Err(TTSError::RateLimited(format!(
                    "Azure TTS returned 429 for card {id}"
                )));
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(TTSError::ProviderError {
                    status: status.as_u16(),
                    message: if message.is_empty() {
                        status.canonical_reason().unwrap_or("unknown").to_string()
                    } else {
                        message
                    },
                });
            }

            response.bytes().await?
        };

        if audio.is_empty() {
            return Err(TTSError::AudioGenerationFailed(format!(
                "Azure TTS returned no audio for card {id}"
            )));
        }

        let path = self.output_path(id);
        tokio::fs::create_dir_all(&self.azure_config().audio_dir).await?;
        tokio::fs::write(&path, &audio).await?;

        debug!("Wrote {} bytes of audio to {}", audio.len(), path.display());
        Ok(path)
    }

    fn provider_name(&self) -> &'static str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> AzureTTSConfig {
        AzureTTSConfig {
            subscription_key: "test-subscription-key".to_string(),
            region: "westeurope".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_http_request_url() {
        let builder = AzureRequestBuilder::new(create_test_config());
        let client = reqwest::Client::new();
        let request = builder
            .build_http_request(&client, "Hola", "Spanish")
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn test_build_http_request_headers() {
        let builder = AzureRequestBuilder::new(create_test_config());
        let client = reqwest::Client::new();
        let request = builder
            .build_http_request(&client, "Hola", "Spanish")
            .build()
            .unwrap();
        let headers = request.headers();

        assert_eq!(
            headers.get(AZURE_SUBSCRIPTION_KEY_HEADER).unwrap(),
            "test-subscription-key"
        );
        assert_eq!(headers.get("content-type").unwrap(), "application/ssml+xml");
        assert_eq!(
            headers.get(AZURE_OUTPUT_FORMAT_HEADER).unwrap(),
            "audio-24khz-48kbitrate-mono-mp3"
        );
        assert_eq!(headers.get("user-agent").unwrap(), USER_AGENT);
    }

    #[test]
    fn test_build_http_request_body_uses_language_voice() {
        let builder = AzureRequestBuilder::new(create_test_config());
        let client = reqwest::Client::new();
        let request = builder
            .build_http_request(&client, "Gato.<br><br>El gato duerme.", "Spanish")
            .build()
            .unwrap();
        let body = std::str::from_utf8(request.body().unwrap().as_bytes().unwrap()).unwrap();

        assert!(body.contains("name='es-MX-DaliaNeural'"));
        assert!(body.contains("xml:lang='es-MX'"));
        assert!(body.contains("Gato.  El gato duerme."));
        assert!(!body.contains("<br>"));
    }

    #[test]
    fn test_new_requires_key() {
        let manager = Arc::new(ReqManager::new(1).unwrap());
        let result = AzureTTS::new(AzureTTSConfig::default(), manager);
        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_output_path() {
        let manager = Arc::new(ReqManager::new(1).unwrap());
        let config = AzureTTSConfig {
            audio_dir: PathBuf::from("/tmp/audio"),
            ..create_test_config()
        };
        let tts = AzureTTS::new(config, manager).unwrap();
        assert_eq!(tts.output_path("abc"), PathBuf::from("/tmp/audio/abc.mp3"));
        assert_eq!(tts.provider_name(), "azure");
    }
}
