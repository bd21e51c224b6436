use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::deck::ApkgPackager;
use crate::core::llm::OpenAIClient;
use crate::core::pipeline::CardPipeline;
use crate::core::tts::AzureTTS;
use crate::utils::req_manager::ReqManager;

/// Concurrent connections allowed towards the language model API
const LLM_MAX_CONCURRENT_REQUESTS: usize = 8;
/// Concurrent connections allowed towards the speech API; the queue keeps
/// actual synthesis sequential, the extra slots cover retries in flight.
const TTS_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Core-specific shared state for the application.
///
/// Holds the card pipeline and the HTTP request managers its adapters share.
#[derive(Clone)]
pub struct CoreState {
    pub pipeline: Arc<CardPipeline>,
    /// Request manager used by the OpenAI adapter
    pub llm_req_manager: Option<Arc<ReqManager>>,
    /// Request manager used by the Azure speech adapter
    pub tts_req_manager: Option<Arc<ReqManager>>,
}

impl CoreState {
    /// Build the OpenAI client, the Azure synthesizer and the deck packager
    /// from configuration and wire them into a pipeline.
    ///
    /// # Errors
    /// Returns an error when an API key is missing or an HTTP client cannot
    /// be created.
    pub fn new(
        config: &ServerConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let llm_req_manager = Arc::new(ReqManager::new(LLM_MAX_CONCURRENT_REQUESTS)?);
        let tts_req_manager = Arc::new(ReqManager::new(TTS_MAX_CONCURRENT_REQUESTS)?);

        let openai_config = config.openai_config()?;
        info!(
            "Using OpenAI model {} at {}",
            openai_config.model, openai_config.base_url
        );
        let model = OpenAIClient::new(openai_config, llm_req_manager.clone())?;

        let azure_config = config.azure_tts_config()?;
        info!(
            "Using Azure TTS at {}, audio written to {}",
            azure_config.build_tts_url(),
            azure_config.audio_dir.display()
        );
        let synthesizer = AzureTTS::new(azure_config, tts_req_manager.clone())?;

        let rate_limit = config.rate_limit_config();
        info!(
            "Speech synthesis limited to {} request(s)/s with {} retries",
            rate_limit.requests_per_second, rate_limit.max_retries
        );

        let pipeline = CardPipeline::new(
            Arc::new(model),
            Arc::new(synthesizer),
            Arc::new(ApkgPackager::new()),
            config.pipeline_config(),
            rate_limit,
        );

        Ok(Arc::new(Self {
            pipeline: Arc::new(pipeline),
            llm_req_manager: Some(llm_req_manager),
            tts_req_manager: Some(tts_req_manager),
        }))
    }

    /// Wrap an already assembled pipeline, e.g. one built from stub adapters.
    pub fn with_pipeline(pipeline: CardPipeline) -> Arc<Self> {
        Arc::new(Self {
            pipeline: Arc::new(pipeline),
            llm_req_manager: None,
            tts_req_manager: None,
        })
    }
}
