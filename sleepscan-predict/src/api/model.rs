//! Model information endpoint
//!
//! Reports which engine is serving and how the two feature tensors are bound,
//! so a client can check it is talking to the model it expects.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::schema::{Column, MOVEMENT_STEPS, PROFILE_FEATURES, SCHEMA_V1};
use crate::AppState;

/// One model input as the adapter feeds it
#[derive(Debug, Serialize)]
pub struct InputBinding {
    pub name: String,
    pub shape: Vec<usize>,
}

/// Model information response
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    /// Engine backend ("onnxruntime", "static")
    pub backend: String,
    /// Inputs declared by the model itself (empty if the backend cannot tell)
    pub declared_inputs: Vec<String>,
    pub profile_input: InputBinding,
    pub movement_input: InputBinding,
    pub schema_version: u32,
    /// Upload columns read, in model input order
    pub profile_columns: Vec<Column>,
    pub movement_column: Column,
}

/// GET /api/model
pub async fn get_model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let engine = state.adapter.engine();
    let bindings = state.adapter.bindings();

    Json(ModelInfo {
        backend: engine.name().to_string(),
        declared_inputs: engine.input_names(),
        profile_input: InputBinding {
            name: bindings.profile.clone(),
            shape: vec![1, PROFILE_FEATURES],
        },
        movement_input: InputBinding {
            name: bindings.movement.clone(),
            shape: vec![1, MOVEMENT_STEPS, 1],
        },
        schema_version: SCHEMA_V1.version,
        profile_columns: SCHEMA_V1.profile.to_vec(),
        movement_column: SCHEMA_V1.movement,
    })
}
