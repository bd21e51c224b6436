use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional so a file may configure only part of the server;
/// environment variables and defaults fill the rest.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   frontend_url: "http://localhost:5173"
///   work_dir: "/var/lib/quickcards"
///
/// openai:
///   api_key: "sk-..."
///   model: "gpt-4.1-nano"
///   base_url: "https://api.openai.com/v1"
///   timeout_seconds: 60
///   max_retries: 3
///   temperature: 0.7
///
/// azure_tts:
///   key: "your-speech-key"
///   region: "eastus"
///
/// rate_limit:
///   requests_per_second: 3
///   max_retries: 3
///   initial_backoff_ms: 1000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub azure_tts: Option<AzureTtsYaml>,
    pub rate_limit: Option<RateLimitYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub frontend_url: Option<String>,
    pub work_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub temperature: Option<f32>,
}

/// Azure Speech resource settings
/// (Azure Portal → Speech resource → Keys and Endpoint)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AzureTtsYaml {
    pub key: Option<String>,
    pub region: Option<String>,
    /// Full synthesis URL, overrides the one derived from `region`
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RateLimitYaml {
    pub requests_per_second: Option<u32>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is malformed or
    /// a field has the wrong type.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
