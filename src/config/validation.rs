use super::ServerConfig;

/// Validate a merged configuration
///
/// Credentials are not required here; a missing OpenAI or Azure key is
/// reported when the server state is built.
pub fn validate_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_rate_limit(config.tts_requests_per_second)?;
    validate_temperature(config.openai_temperature)?;
    validate_frontend_url(&config.frontend_url)?;

    if config.openai_timeout_seconds == 0 {
        return Err("openai timeout_seconds must be greater than zero".into());
    }

    Ok(())
}

/// The speech queue spaces requests by `1 / requests_per_second`.
pub fn validate_rate_limit(requests_per_second: u32) -> Result<(), Box<dyn std::error::Error>> {
    if requests_per_second == 0 {
        return Err(
            "rate_limit requests_per_second (TTS_REQUESTS_PER_SECOND) must be greater than zero"
                .into(),
        );
    }
    Ok(())
}

pub fn validate_temperature(temperature: f32) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(format!(
            "openai temperature must be between 0.0 and 2.0, got {temperature}"
        )
        .into());
    }
    Ok(())
}

/// Validate the CORS origin
///
/// Must be an absolute http(s) origin without a path, e.g. `http://localhost:5173`.
pub fn validate_frontend_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| format!("FRONTEND_URL must start with http:// or https://, got '{url}'"))?;

    if rest.is_empty() {
        return Err(format!("FRONTEND_URL has no host: '{url}'").into());
    }
    if rest.trim_end_matches('/').contains('/') {
        return Err(format!("FRONTEND_URL must be an origin without a path: '{url}'").into());
    }

    Ok(())
}
