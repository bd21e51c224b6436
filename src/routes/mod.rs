pub mod api;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

/// CORS policy admitting the configured frontend origin for `GET` and `POST`.
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}
