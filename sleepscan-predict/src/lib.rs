//! sleepscan-predict library - Parkinson's risk prediction service
//!
//! Accepts a nightly CSV upload, validates it against a fixed positional
//! schema, and runs the loaded classifier on the extracted features.
//! The adapter (`adapter::Adapter`) is transport-agnostic; `api` wraps it
//! in HTTP.

pub mod adapter;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod schema;
pub mod upload;

pub use crate::adapter::{Adapter, InferenceResult, InputBindings, Prediction};
pub use crate::error::{AdapterError, ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Adapter holding the one loaded engine
    pub adapter: Adapter,
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
    /// Upload size cap in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(adapter: Adapter, allowed_origins: Vec<String>, max_upload_bytes: usize) -> Self {
        Self {
            adapter,
            allowed_origins,
            max_upload_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let cors = api::cors_layer(&state.allowed_origins);
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/predict", post(api::predict))
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/model", get(api::get_model_info))
        .merge(api::health_routes())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
