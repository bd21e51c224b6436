//! Flashcard endpoints: deck generation, single-card preview and input review.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::cards::{Card, CardWithAudio};
use crate::core::pipeline::{CardRequest, EncodedDeckFile, InputRequest};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /generate-cards`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateCardsRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Animals"))]
    pub deck_name: String,
    /// One word or phrase per line
    #[cfg_attr(feature = "openapi", schema(example = "cat\ndog"))]
    pub words: String,
    #[cfg_attr(feature = "openapi", schema(example = "Spanish"))]
    pub target_language: String,
    #[cfg_attr(feature = "openapi", schema(example = "English"))]
    pub source_language: String,
    /// Also produce a deck with front and back swapped
    #[serde(default)]
    pub include_reversed_cards: bool,
}

/// A deck archive, base64 encoded
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApkgFile {
    #[cfg_attr(feature = "openapi", schema(example = "Animals.apkg"))]
    pub name: String,
    pub content: String,
}

impl From<EncodedDeckFile> for ApkgFile {
    fn from(file: EncodedDeckFile) -> Self {
        Self {
            name: file.name,
            content: file.content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateCardsResponse {
    #[cfg_attr(
        feature = "openapi",
        schema(example = "Successfully generated 2 flashcards")
    )]
    pub message: String,
    pub cards: Vec<CardWithAudio>,
    pub apkg_files: Vec<ApkgFile>,
}

/// Request body for `POST /preview-card` and `POST /review-inputs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CardInputRequest {
    #[cfg_attr(feature = "openapi", schema(example = "cat\ndog"))]
    pub input: String,
    #[cfg_attr(feature = "openapi", schema(example = "Spanish"))]
    pub target_language: String,
    #[cfg_attr(feature = "openapi", schema(example = "English"))]
    pub source_language: String,
}

impl CardInputRequest {
    fn into_pipeline_request(self) -> AppResult<InputRequest> {
        require_languages(&self.source_language, &self.target_language)?;
        Ok(InputRequest {
            input: self.input,
            source_language: self.source_language,
            target_language: self.target_language,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PreviewCardResponse {
    /// `null` when the model reply held no usable card
    pub card: Option<Card>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewInputsResponse {
    pub feedback: String,
}

fn require_languages(source: &str, target: &str) -> AppResult<()> {
    if source.trim().is_empty() || target.trim().is_empty() {
        return Err(AppError::BadRequest(
            "sourceLanguage and targetLanguage are required".to_string(),
        ));
    }
    Ok(())
}

/// Generate flashcards with audio and return them as Anki decks
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/generate-cards",
        request_body = GenerateCardsRequest,
        responses(
            (status = 200, description = "Deck generated", body = GenerateCardsResponse),
            (status = 400, description = "Invalid request"),
            (status = 429, description = "Speech synthesis rate limit exceeded (code AZURE_TTS_RATE_LIMIT)"),
            (status = 500, description = "Language model, synthesis or packaging failure")
        ),
        tag = "cards"
    )
)]
pub async fn generate_cards(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateCardsRequest>,
) -> AppResult<Json<GenerateCardsResponse>> {
    info!(
        "Generate cards request - deck: {}, reversed: {}",
        request.deck_name, request.include_reversed_cards
    );
    require_languages(&request.source_language, &request.target_language)?;

    let deck = state
        .pipeline()
        .generate(&CardRequest {
            deck_name: request.deck_name,
            words: request.words,
            source_language: request.source_language,
            target_language: request.target_language,
            include_reversed: request.include_reversed_cards,
        })
        .await?;

    Ok(Json(GenerateCardsResponse {
        message: deck.message,
        cards: deck.cards,
        apkg_files: deck.deck_files.into_iter().map(ApkgFile::from).collect(),
    }))
}

/// Preview the card the first input line would produce
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/preview-card",
        request_body = CardInputRequest,
        responses(
            (status = 200, description = "Card preview", body = PreviewCardResponse),
            (status = 400, description = "Input holds no non-empty line"),
            (status = 500, description = "Language model failure")
        ),
        tag = "cards"
    )
)]
pub async fn preview_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CardInputRequest>,
) -> AppResult<Json<PreviewCardResponse>> {
    let request = request.into_pipeline_request()?;
    let card = state.pipeline().preview(&request).await?;
    Ok(Json(PreviewCardResponse { card }))
}

/// Ask the model for feedback on the input lines
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/review-inputs",
        request_body = CardInputRequest,
        responses(
            (status = 200, description = "Model feedback", body = ReviewInputsResponse),
            (status = 400, description = "Input holds no non-empty line"),
            (status = 500, description = "Language model failure")
        ),
        tag = "cards"
    )
)]
pub async fn review_inputs(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CardInputRequest>,
) -> AppResult<Json<ReviewInputsResponse>> {
    let request = request.into_pipeline_request()?;
    let feedback = state.pipeline().review(&request).await?;
    Ok(Json(ReviewInputsResponse { feedback }))
}
