//! OpenAPI specification and documentation
//!
//! This module provides OpenAPI documentation for the quickcards API.
//! It is only compiled when the `openapi` feature is enabled.

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::core::cards::{Card, CardWithAudio};
use crate::handlers::{
    api::HealthResponse,
    cards::{
        ApkgFile, CardInputRequest, GenerateCardsRequest, GenerateCardsResponse,
        PreviewCardResponse, ReviewInputsResponse,
    },
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quickcards API",
        version = "0.1.0",
        description = "Generates language-learning flashcards with a language model, adds Azure text-to-speech audio and packages them as Anki decks"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    paths(
        crate::handlers::api::health_check,
        crate::handlers::cards::generate_cards,
        crate::handlers::cards::preview_card,
        crate::handlers::cards::review_inputs,
    ),
    components(schemas(
        HealthResponse,
        Card,
        CardWithAudio,
        ApkgFile,
        GenerateCardsRequest,
        GenerateCardsResponse,
        CardInputRequest,
        PreviewCardResponse,
        ReviewInputsResponse,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "cards", description = "Flashcard generation, preview and review")
    )
)]
pub struct ApiDoc;

/// Create OpenAPI documentation routes
///
/// Routes:
/// - `GET /docs/openapi.json` - OpenAPI spec as JSON
/// - `GET /docs/openapi.yaml` - OpenAPI spec as YAML
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/docs/openapi.json", get(openapi_json_handler))
        .route("/docs/openapi.yaml", get(openapi_yaml_handler))
}

async fn openapi_json_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn openapi_yaml_handler() -> ([(axum::http::header::HeaderName, &'static str); 1], String) {
    let yaml = spec_yaml().unwrap_or_else(|e| format!("Error generating YAML: {e}"));
    ([(axum::http::header::CONTENT_TYPE, "application/yaml")], yaml)
}

/// Get OpenAPI spec as YAML string
///
/// Used by the `openapi` CLI command.
pub fn spec_yaml() -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ApiDoc::openapi())
}

/// Get OpenAPI spec as JSON string
pub fn spec_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ApiDoc::openapi())
}
