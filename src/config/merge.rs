use std::path::PathBuf;

use super::ServerConfig;
use super::utils::{env_string, parse_env};
use super::yaml::YamlConfig;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Errors
/// Returns an error if a numeric environment variable does not parse.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = ServerConfig::default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env_string($env_var))
                .unwrap_or($default)
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env_string($env_var))
        };
    }

    // Helper macro for parsed values: YAML > ENV (must parse) > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => parse_env($env_var)?.unwrap_or($default),
            }
        };
    }

    let server = yaml.server.unwrap_or_default();
    let openai = yaml.openai.unwrap_or_default();
    let azure = yaml.azure_tts.unwrap_or_default();
    let rate_limit = yaml.rate_limit.unwrap_or_default();

    // Server configuration
    let host = get_value!("HOST", server.host, defaults.host);
    let port = get_parsed!("PORT", server.port, defaults.port);
    let frontend_url = get_value!("FRONTEND_URL", server.frontend_url, defaults.frontend_url);
    let work_dir = server
        .work_dir
        .or_else(|| env_string("WORK_DIR"))
        .map(PathBuf::from)
        .unwrap_or(defaults.work_dir);

    // OpenAI configuration
    let openai_api_key = get_optional!("OPENAI_API_KEY", openai.api_key);
    let openai_model = get_value!("OPENAI_MODEL", openai.model, defaults.openai_model);
    let openai_base_url = get_value!("OPENAI_BASE_URL", openai.base_url, defaults.openai_base_url);
    let openai_timeout_seconds = get_parsed!(
        "OPENAI_TIMEOUT_SECONDS",
        openai.timeout_seconds,
        defaults.openai_timeout_seconds
    );
    let openai_max_retries = get_parsed!(
        "OPENAI_MAX_RETRIES",
        openai.max_retries,
        defaults.openai_max_retries
    );
    let openai_temperature = get_parsed!(
        "OPENAI_TEMPERATURE",
        openai.temperature,
        defaults.openai_temperature
    );

    // Azure Text-to-Speech configuration
    let azure_tts_key = get_optional!("AZURE_TTS_KEY", azure.key);
    let azure_tts_region = get_value!("AZURE_TTS_REGION", azure.region, defaults.azure_tts_region);
    let azure_tts_endpoint = get_optional!("AZURE_TTS_ENDPOINT", azure.endpoint);

    // Rate limit configuration
    let tts_requests_per_second = get_parsed!(
        "TTS_REQUESTS_PER_SECOND",
        rate_limit.requests_per_second,
        defaults.tts_requests_per_second
    );
    let tts_max_retries = get_parsed!(
        "TTS_MAX_RETRIES",
        rate_limit.max_retries,
        defaults.tts_max_retries
    );
    let tts_initial_backoff_ms = get_parsed!(
        "TTS_INITIAL_BACKOFF_MS",
        rate_limit.initial_backoff_ms,
        defaults.tts_initial_backoff_ms
    );

    Ok(ServerConfig {
        host,
        port,
        frontend_url,
        work_dir,
        openai_api_key,
        openai_model,
        openai_base_url,
        openai_timeout_seconds,
        openai_max_retries,
        openai_temperature,
        azure_tts_key,
        azure_tts_region,
        azure_tts_endpoint,
        tts_requests_per_second,
        tts_max_retries,
        tts_initial_backoff_ms,
    })
}
