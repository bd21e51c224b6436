use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, cards};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/generate-cards", post(cards::generate_cards))
        .route("/preview-card", post(cards::preview_card))
        .route("/review-inputs", post(cards::review_inputs))
        .layer(TraceLayer::new_for_http())
}
