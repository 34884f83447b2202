//! Inference engine abstraction
//!
//! The classifier is an external collaborator. Everything the adapter knows
//! about it is this trait: named f32 tensors in, f32 tensors out.

#[cfg(feature = "onnx")]
pub mod onnx;

use ndarray::{Array, Dimension};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[cfg(feature = "onnx")]
pub use onnx::OnnxEngine;

/// Inference engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Model file could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// Engine rejected the inputs or failed while running
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Engine returned no output tensor, or an empty one
    #[error("Inference produced no output")]
    NoOutput,

    /// First output scalar is not a probability
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    /// Tensor data does not match its shape
    #[error("Shape mismatch: shape {shape:?} needs {expected} values, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

/// Dense row-major f32 tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Build from explicit shape and row-major data
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, EngineError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(EngineError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build from an ndarray of any rank
    pub fn from_array<D: Dimension>(array: Array<f32, D>) -> Self {
        let shape = array.shape().to_vec();
        let data = array.iter().copied().collect();
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// First scalar in row-major order
    pub fn first(&self) -> Option<f32> {
        self.data.first().copied()
    }
}

/// Tensor bound to a model input slot
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    pub name: String,
    pub tensor: Tensor,
}

impl NamedTensor {
    pub fn new(name: impl Into<String>, tensor: Tensor) -> Self {
        Self {
            name: name.into(),
            tensor,
        }
    }
}

/// A loaded classifier
///
/// Implementations must tolerate concurrent calls; the adapter shares one
/// instance across all requests.
pub trait InferenceEngine: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Input slot names declared by the model, if known
    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run one inference call
    fn run(&self, inputs: &[NamedTensor]) -> Result<Vec<Tensor>, EngineError>;
}

/// Engine that answers every call with the same probability
///
/// Used for wiring tests and for running the service without a model file.
#[derive(Debug)]
pub struct StaticEngine {
    probability: f32,
    calls: AtomicUsize,
}

impl StaticEngine {
    pub fn new(probability: f32) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `run` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl InferenceEngine for StaticEngine {
    fn name(&self) -> &str {
        "static"
    }

    fn run(&self, inputs: &[NamedTensor]) -> Result<Vec<Tensor>, EngineError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if inputs.is_empty() {
            return Err(EngineError::Inference("no inputs provided".to_string()));
        }
        Tensor::new(vec![1, 1], vec![self.probability]).map(|t| vec![t])
    }
}
