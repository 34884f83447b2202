//! ONNX Runtime backend
//!
//! Loads the classifier once from a model file using the `ort` crate.

use ort::session::Session;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{EngineError, InferenceEngine, NamedTensor, Tensor};

/// ONNX Runtime session loaded from a model file
pub struct OnnxEngine {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    model_path: PathBuf,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl std::fmt::Debug for OnnxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEngine")
            .field("model_path", &self.model_path)
            .field("input_names", &self.input_names)
            .field("output_names", &self.output_names)
            .finish()
    }
}

impl OnnxEngine {
    /// Load a model and check that it declares every required input
    pub fn from_file<P: AsRef<Path>>(path: P, required_inputs: &[&str]) -> Result<Self, EngineError> {
        let path = path.as_ref();
        info!(?path, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| EngineError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| EngineError::ModelLoad(format!("Failed to load {}: {}", path.display(), e)))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect();

        if let Some(missing) = required_inputs
            .iter()
            .find(|name| !input_names.iter().any(|declared| declared == *name))
        {
            return Err(EngineError::ModelLoad(format!(
                "Model has no input named '{}' (declared inputs: {:?})",
                missing, input_names
            )));
        }

        if output_names.is_empty() {
            return Err(EngineError::ModelLoad(
                "Model declares no outputs".to_string(),
            ));
        }

        info!(
            inputs = ?input_names,
            outputs = ?output_names,
            "ONNX model loaded successfully"
        );

        Ok(Self {
            session: Mutex::new(session),
            model_path: path.to_path_buf(),
            input_names,
            output_names,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceEngine for OnnxEngine {
    fn name(&self) -> &str {
        "onnxruntime"
    }

    fn input_names(&self) -> Vec<String> {
        self.input_names.clone()
    }

    fn run(&self, inputs: &[NamedTensor]) -> Result<Vec<Tensor>, EngineError> {
        let mut session_inputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let shape: Vec<i64> = input.tensor.shape().iter().map(|&d| d as i64).collect();
            let value = ort::value::Tensor::from_array((shape, input.tensor.data().to_vec()))
                .map_err(|e| {
                    EngineError::Inference(format!("Failed to create tensor '{}': {}", input.name, e))
                })?;
            session_inputs.push((input.name.clone(), value));
        }

        let mut session = self.session.lock();
        let session_outputs = session
            .run(session_inputs)
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        let result = outputs_in_declared_order(&self.output_names, |name| {
            let output = session_outputs.get(name)?;
            Some(
                output
                    .try_extract_tensor::<f32>()
                    .map_err(|e| EngineError::InvalidOutput(format!("output '{}': {}", name, e)))
                    .and_then(|(shape, data)| {
                        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
                        Tensor::new(dims, data.to_vec())
                    }),
            )
        })?;

        debug!(outputs = result.len(), "ONNX inference completed");
        Ok(result)
    }
}

/// Collect outputs in model declaration order
///
/// Every declared output must be present, so the first declared output is
/// always the one the adapter reads.
fn outputs_in_declared_order<F>(declared: &[String], mut extract: F) -> Result<Vec<Tensor>, EngineError>
where
    F: FnMut(&str) -> Option<Result<Tensor, EngineError>>,
{
    declared
        .iter()
        .map(|name| {
            extract(name).unwrap_or_else(|| {
                Err(EngineError::InvalidOutput(format!(
                    "declared output '{}' missing from session results",
                    name
                )))
            })
        })
        .collect()
}
