//! Prediction endpoint
//!
//! POST /predict with multipart/form-data, CSV in the `file` field.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::adapter::{InferenceResult, Prediction};
use crate::error::{ApiError, ApiResult};
use crate::features::MovementSeries;
use crate::AppState;

/// Form field carrying the upload
pub const UPLOAD_FIELD: &str = "file";

/// Prediction response
///
/// Key names are the ones the web client reads.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "REM Sleep Percentage")]
    pub rem_sleep_percentage: f64,
    #[serde(rename = "Deep Sleep Percentage")]
    pub deep_sleep_percentage: f64,
    #[serde(rename = "Exercise Frequency")]
    pub exercise_frequency: f64,
    #[serde(rename = "Movement Time Series")]
    pub movement_time_series: MovementSeries,
    #[serde(rename = "Parkinsons_Likelihood")]
    pub parkinsons_likelihood: f32,
    #[serde(rename = "Prediction")]
    pub prediction: Prediction,
}

impl From<&InferenceResult> for PredictionResponse {
    fn from(result: &InferenceResult) -> Self {
        Self {
            age: result.profile.age(),
            rem_sleep_percentage: result.profile.rem_sleep_percentage(),
            deep_sleep_percentage: result.profile.deep_sleep_percentage(),
            exercise_frequency: result.profile.exercise_frequency(),
            movement_time_series: result.movement,
            parkinsons_likelihood: result.probability,
            prediction: result.prediction,
        }
    }
}

/// POST /predict
///
/// Parsing and inference run on the blocking pool; the engine call is
/// synchronous and may hold the session lock for the whole call.
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<PredictionResponse>> {
    let bytes = read_upload(&mut multipart).await?;

    let upload_id = Uuid::new_v4();
    let span = info_span!("predict", %upload_id);
    info!(parent: &span, bytes = bytes.len(), "Upload received");

    let adapter = state.adapter.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        adapter.predict(&bytes).map_err(|e| {
            warn!(code = e.code(), "Prediction rejected: {}", e);
            e
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))?;

    let result = outcome?;
    Ok(Json(PredictionResponse::from(&result)))
}

/// Pull the `file` field out of the form, ignoring any other fields
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field.bytes().await.map_err(multipart_error)?;
            return Ok(data.to_vec());
        }
    }

    Err(ApiError::BadRequest(format!(
        "No file uploaded or incorrect form field name (expected '{}')",
        UPLOAD_FIELD
    )))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
