//! Input contract & inference adapter
//!
//! Turns an uploaded byte stream into one shaped engine call and a labeled
//! result. The engine handle is injected at construction and is the only
//! state shared between calls.

use ndarray::{Array2, Array3};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::{EngineError, InferenceEngine, NamedTensor, Tensor};
use crate::error::AdapterResult;
use crate::features::{build_movement_series, build_profile_vector, MovementSeries, ProfileVector};
use crate::schema::{MOVEMENT_STEPS, PROFILE_FEATURES};
use crate::upload::parse_upload;

/// Probabilities strictly above this are labeled positive
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Default ONNX input slot for the (1, 4) profile tensor
pub const DEFAULT_PROFILE_INPUT: &str = "profile_input";

/// Default ONNX input slot for the (1, 24, 1) movement tensor
pub const DEFAULT_MOVEMENT_INPUT: &str = "movement_input";

/// Binary decision derived from the raw probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prediction {
    #[serde(rename = "Parkinson")]
    Parkinson,
    #[serde(rename = "No Parkinson")]
    NoParkinson,
}

impl Prediction {
    /// Label a raw probability; exactly 0.5 is negative
    pub fn from_probability(probability: f32) -> Self {
        if probability > DECISION_THRESHOLD {
            Prediction::Parkinson
        } else {
            Prediction::NoParkinson
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Prediction::Parkinson => "Parkinson",
            Prediction::NoParkinson => "No Parkinson",
        }
    }
}

/// Model input slot names for the two tensors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBindings {
    pub profile: String,
    pub movement: String,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE_INPUT.to_string(),
            movement: DEFAULT_MOVEMENT_INPUT.to_string(),
        }
    }
}

/// Outcome of one successful prediction
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub profile: ProfileVector,
    pub movement: MovementSeries,
    /// Unthresholded model output in [0, 1]
    pub probability: f32,
    pub prediction: Prediction,
}

/// Adapter between uploads and a loaded engine
#[derive(Clone)]
pub struct Adapter {
    engine: Arc<dyn InferenceEngine>,
    bindings: InputBindings,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("engine", &self.engine.name())
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl Adapter {
    /// Create an adapter using the default input slot names
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self::with_bindings(engine, InputBindings::default())
    }

    pub fn with_bindings(engine: Arc<dyn InferenceEngine>, bindings: InputBindings) -> Self {
        Self { engine, bindings }
    }

    pub fn engine(&self) -> &dyn InferenceEngine {
        self.engine.as_ref()
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    /// Full pipeline: parse → profile → movement → invoke
    ///
    /// Any input error returns before the engine is touched.
    pub fn predict(&self, bytes: &[u8]) -> AdapterResult<InferenceResult> {
        let rows = parse_upload(bytes)?;
        let profile = build_profile_vector(&rows)?;
        let movement = build_movement_series(&rows)?;

        debug!(
            rows = rows.len(),
            profile = ?profile.values(),
            "Upload parsed"
        );

        self.invoke(&profile, &movement)
    }

    /// Shape features into tensors, run the engine once, and label the output
    pub fn invoke(
        &self,
        profile: &ProfileVector,
        movement: &MovementSeries,
    ) -> AdapterResult<InferenceResult> {
        let inputs = [
            NamedTensor::new(self.bindings.profile.clone(), profile_tensor(profile)),
            NamedTensor::new(self.bindings.movement.clone(), movement_tensor(movement)),
        ];

        let outputs = self.engine.run(&inputs)?;
        let probability = read_probability(&outputs)?;
        let prediction = Prediction::from_probability(probability);

        info!(
            engine = self.engine.name(),
            probability,
            prediction = prediction.label(),
            "Prediction complete"
        );

        Ok(InferenceResult {
            profile: *profile,
            movement: *movement,
            probability,
            prediction,
        })
    }
}

/// (1, 4) profile tensor
fn profile_tensor(profile: &ProfileVector) -> Tensor {
    let values = profile.values();
    Tensor::from_array(Array2::from_shape_fn((1, PROFILE_FEATURES), |(_, j)| {
        values[j] as f32
    }))
}

/// (1, 24, 1) movement tensor
fn movement_tensor(movement: &MovementSeries) -> Tensor {
    let values = movement.as_slice();
    Tensor::from_array(Array3::from_shape_fn((1, MOVEMENT_STEPS, 1), |(_, t, _)| {
        values[t]
    }))
}

/// First scalar of the first output, which must be a probability
fn read_probability(outputs: &[Tensor]) -> Result<f32, EngineError> {
    let probability = outputs
        .first()
        .and_then(Tensor::first)
        .ok_or(EngineError::NoOutput)?;

    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(EngineError::InvalidOutput(format!(
            "expected a probability in [0, 1], got {}",
            probability
        )));
    }

    Ok(probability)
}
