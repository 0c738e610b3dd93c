use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use document_storage::DocumentGateway;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DocumentGateway>,
    pub max_upload_bytes: usize,
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Wrap the body-limit layer's plain-text 413 in the JSON envelope
async fn envelope_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }

    ApiError::PayloadTooLarge("Request body too large".to_string()).into_response()
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/documents", post(handlers::documents::upload_document))
        .route(
            "/documents/:id",
            get(handlers::documents::download_document)
                .head(handlers::documents::document_exists)
                .delete(handlers::documents::delete_document),
        )
        .route("/documents/:id/url", get(handlers::documents::document_url))
        .route(
            "/documents/:id/metadata",
            get(handlers::documents::document_metadata),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(envelope_payload_too_large))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
