//! HTTP API handlers for sleepscan-predict

pub mod buildinfo;
pub mod cors;
pub mod health;
pub mod model;
pub mod predict;

pub use buildinfo::get_build_info;
pub use cors::cors_layer;
pub use health::health_routes;
pub use model::get_model_info;
pub use predict::{predict, PredictionResponse};
