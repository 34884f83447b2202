//! predict-file - run the prediction adapter on a CSV on disk
//!
//! Prints the same JSON payload `POST /predict` returns. Useful for checking
//! an export against a model without starting the server.
//!
//! ```text
//! predict-file night.csv --model models/parkinsons_prediction_model.onnx
//! predict-file night.csv --stub-probability 0.73
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use sleepscan_predict::adapter::{DEFAULT_MOVEMENT_INPUT, DEFAULT_PROFILE_INPUT};
use sleepscan_predict::api::PredictionResponse;
use sleepscan_predict::engine::{InferenceEngine, StaticEngine};
use sleepscan_predict::{Adapter, InputBindings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Command-line arguments for predict-file
#[derive(Parser, Debug)]
#[command(name = "predict-file")]
#[command(about = "Run a Parkinson's risk prediction on a local CSV file")]
#[command(version)]
struct Args {
    /// CSV upload to evaluate
    csv: PathBuf,

    /// ONNX model file
    #[arg(short, long, env = "SLEEPSCAN_MODEL", conflicts_with = "stub_probability")]
    model: Option<PathBuf>,

    /// Use a fixed probability instead of a model
    #[arg(long, value_name = "PROBABILITY")]
    stub_probability: Option<f32>,

    /// Model input slot for the profile tensor
    #[arg(long, default_value = DEFAULT_PROFILE_INPUT)]
    profile_input: String,

    /// Model input slot for the movement tensor
    #[arg(long, default_value = DEFAULT_MOVEMENT_INPUT)]
    movement_input: String,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let bytes = std::fs::read(&args.csv)
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;

    let bindings = InputBindings {
        profile: args.profile_input.clone(),
        movement: args.movement_input.clone(),
    };
    let engine = build_engine(&args, &bindings)?;
    let adapter = Adapter::with_bindings(engine, bindings);

    match adapter.predict(&bytes) {
        Ok(result) => {
            let payload = serde_json::to_string_pretty(&PredictionResponse::from(&result))?;
            println!("{}", payload);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let payload = json!({
                "error": {
                    "code": e.code(),
                    "message": e.to_string(),
                    "column": e.column(),
                }
            });
            eprintln!("{}", serde_json::to_string_pretty(&payload)?);
            // 2 = bad file, 3 = model problem
            Ok(ExitCode::from(if e.is_input_error() { 2 } else { 3 }))
        }
    }
}

fn build_engine(args: &Args, bindings: &InputBindings) -> Result<Arc<dyn InferenceEngine>> {
    if let Some(probability) = args.stub_probability {
        anyhow::ensure!(
            (0.0..=1.0).contains(&probability),
            "--stub-probability must be within [0, 1]"
        );
        return Ok(Arc::new(StaticEngine::new(probability)));
    }

    let model = args
        .model
        .as_deref()
        .context("Either --model or --stub-probability is required")?;
    load_model(model, bindings)
}

#[cfg(feature = "onnx")]
fn load_model(path: &std::path::Path, bindings: &InputBindings) -> Result<Arc<dyn InferenceEngine>> {
    use sleepscan_predict::engine::OnnxEngine;

    let required = [bindings.profile.as_str(), bindings.movement.as_str()];
    let engine = OnnxEngine::from_file(path, &required)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "onnx"))]
fn load_model(path: &std::path::Path, _bindings: &InputBindings) -> Result<Arc<dyn InferenceEngine>> {
    anyhow::bail!(
        "Cannot load {}: built without the `onnx` feature (use --stub-probability)",
        path.display()
    )
}
