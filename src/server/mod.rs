//! HTTP API over the cached dataset.

pub mod routes;

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::data::cache::DatasetCache;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Arc<DatasetCache>,
    /// Maximum number of rows returned in the `analyze` table.
    pub table_limit: usize,
}

impl AppState {
    pub fn new(cache: DatasetCache, table_limit: usize) -> Self {
        Self {
            cache: Arc::new(cache),
            table_limit,
        }
    }
}

/// Build the application router
pub fn build_app(state: AppState) -> Router {
    // Any origin so a browser frontend served elsewhere can call the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/compare", post(routes::compare))
        .route("/api/download-csv", post(routes::download_csv))
        .route("/api/download-pdf", post(routes::download_pdf))
        .route("/api/chart", post(routes::chart))
        .route("/api/reload", post(routes::reload))
        .with_state(state)
        .layer(cors)
}
