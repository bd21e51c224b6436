//! Configuration module for the quickcards server
//!
//! Server configuration comes from environment variables (with `.env`
//! support) or from a YAML file merged with the environment.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Parsing helpers shared by the loaders
//!
//! # Example
//! ```rust,no_run
//! use quickcards::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file merged with environment variables
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::llm::OpenAIConfig;
use crate::core::pipeline::PipelineConfig;
use crate::core::rate_limit::RateLimitConfig;
use crate::core::tts::AzureTTSConfig;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Server configuration
///
/// Groups the HTTP server settings, the OpenAI and Azure credentials and the
/// speech-synthesis rate limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS
    pub frontend_url: String,
    /// Root for the `audio/` and `decks/` scratch directories
    pub work_dir: PathBuf,

    // OpenAI
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout_seconds: u64,
    pub openai_max_retries: u32,
    pub openai_temperature: f32,

    // Azure Text-to-Speech
    pub azure_tts_key: Option<String>,
    pub azure_tts_region: String,
    pub azure_tts_endpoint: Option<String>,

    // Speech synthesis rate limit
    pub tts_requests_per_second: u32,
    pub tts_max_retries: u32,
    pub tts_initial_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let openai = OpenAIConfig::default();
        let rate_limit = RateLimitConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            work_dir: PathBuf::from("."),
            openai_api_key: None,
            openai_model: openai.model,
            openai_base_url: openai.base_url,
            openai_timeout_seconds: openai.timeout.as_secs(),
            openai_max_retries: openai.max_retries,
            openai_temperature: 0.7,
            azure_tts_key: None,
            azure_tts_region: "eastus".to_string(),
            azure_tts_endpoint: None,
            tts_requests_per_second: rate_limit.requests_per_second,
            tts_max_retries: rate_limit.max_retries,
            tts_initial_backoff_ms: rate_limit.initial_backoff.as_millis() as u64,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file merged with environment variables
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// The `.env` file is not read here; only real environment variables
    /// fill gaps left by the YAML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or validation fails.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.work_dir.join("audio")
    }

    pub fn decks_dir(&self) -> PathBuf {
        self.work_dir.join("decks")
    }

    /// Get API key for a specific provider ("openai" or "azure")
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.clone().ok_or_else(|| {
                "OpenAI API key not configured in server environment".to_string()
            }),
            "azure" => self.azure_tts_key.clone().ok_or_else(|| {
                "Azure TTS key not configured in server environment".to_string()
            }),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }

    pub fn openai_config(&self) -> Result<OpenAIConfig, String> {
        Ok(OpenAIConfig {
            api_key: self.get_api_key("openai")?,
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
            timeout: Duration::from_secs(self.openai_timeout_seconds),
            max_retries: self.openai_max_retries,
            ..Default::default()
        })
    }

    pub fn azure_tts_config(&self) -> Result<AzureTTSConfig, String> {
        Ok(AzureTTSConfig {
            subscription_key: self.get_api_key("azure")?,
            region: self.azure_tts_region.clone(),
            endpoint: self.azure_tts_endpoint.clone(),
            audio_dir: self.audio_dir(),
            ..Default::default()
        })
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: self.tts_requests_per_second,
            max_retries: self.tts_max_retries,
            initial_backoff: Duration::from_millis(self.tts_initial_backoff_ms),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            decks_dir: self.decks_dir(),
            temperature: self.openai_temperature,
            ..Default::default()
        }
    }
}
