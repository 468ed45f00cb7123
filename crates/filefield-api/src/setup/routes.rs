//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use filefield_decoder::MultipartDecoder;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, UploadPhoto};
use crate::middleware::inject_files;

/// Upper bound on a whole request body. Per-file ceilings are enforced by the decoder.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

const HTTP_CONCURRENCY_LIMIT: usize = 1024;

/// Setup all application routes
pub fn setup_routes(decoder: Arc<MultipartDecoder>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/photo",
            post(handlers::upload_photo).layer(axum::middleware::from_fn_with_state(
                decoder,
                inject_files::<UploadPhoto>,
            )),
        )
        .route("/health", get(handlers::health))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
