//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Upload, batch and file-table routes
//! - JSON error responses
//! - Body and query extraction helpers

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use danmu_core::upload::UploadService;
use danmu_shared::AppError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Upload service, absent when storage is not configured.
    pub uploads: Option<Arc<UploadService>>,
}

impl AppState {
    /// Creates state around an optional upload service.
    #[must_use]
    pub fn new(uploads: Option<Arc<UploadService>>) -> Self {
        Self { uploads }
    }

    /// Returns the upload service or a configuration error.
    pub fn upload_service(&self) -> Result<&UploadService, ApiError> {
        self.uploads.as_deref().ok_or_else(|| {
            ApiError::from(AppError::Configuration(
                "object storage is not configured".to_string(),
            ))
        })
    }
}

/// Creates the main application router.
///
/// Routes are served at the root and again under `/api`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
