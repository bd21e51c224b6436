use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::CoreState;
use crate::core::pipeline::CardPipeline;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state that holds the card pipeline and its HTTP clients
    pub core_state: Arc<CoreState>,
}

impl AppState {
    /// Build the application state from configuration.
    ///
    /// # Errors
    /// Fails when the OpenAI or Azure credentials are missing.
    pub fn new(
        config: ServerConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let core_state = CoreState::new(&config)?;
        Ok(Self::with_core_state(config, core_state))
    }

    pub fn with_core_state(config: ServerConfig, core_state: Arc<CoreState>) -> Arc<Self> {
        Arc::new(Self { config, core_state })
    }

    /// Get a handle to the card pipeline
    pub fn pipeline(&self) -> &CardPipeline {
        &self.core_state.pipeline
    }
}
