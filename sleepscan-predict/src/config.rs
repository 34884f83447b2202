//! Configuration for sleepscan-predict
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`SLEEPSCAN_*`, read by clap)
//! 3. TOML config file (see `sleepscan_common::config`)
//! 4. Built-in defaults (code constants)

use clap::Parser;
use serde::Deserialize;
use sleepscan_common::config::LoggingConfig;
use sleepscan_common::{Error, Result};
use std::path::PathBuf;

use crate::adapter::{InputBindings, DEFAULT_MOVEMENT_INPUT, DEFAULT_PROFILE_INPUT};

/// Module name, also the config file stem
pub const MODULE_NAME: &str = "sleepscan-predict";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL_PATH: &str = "models/parkinsons_prediction_model.onnx";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
/// 1 MiB; a 24-row upload is a few kilobytes
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// Command-line arguments for sleepscan-predict
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sleepscan-predict")]
#[command(about = "Parkinson's risk prediction from nightly movement uploads")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, env = "SLEEPSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SLEEPSCAN_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SLEEPSCAN_PORT")]
    pub port: Option<u16>,

    /// ONNX model file
    #[arg(short, long, env = "SLEEPSCAN_MODEL")]
    pub model: Option<PathBuf>,

    /// Serve a fixed probability instead of loading a model
    #[arg(long, value_name = "PROBABILITY")]
    pub stub_probability: Option<f32>,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    pub allowed_origins: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SLEEPSCAN_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything left out falls back to built-in defaults.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PredictToml {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub profile_input_name: Option<String>,
    #[serde(default)]
    pub movement_input_name: Option<String>,
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the service obtains its engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSource {
    /// Load an ONNX model from disk
    Model(PathBuf),
    /// Answer every request with this probability
    Stub(f32),
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub engine: EngineSource,
    pub bindings: InputBindings,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Merge CLI/environment values over the TOML file and defaults
    pub fn resolve(cli: &Cli, toml: PredictToml) -> Result<Self> {
        let engine = match cli.stub_probability {
            Some(probability) => {
                if !(0.0..=1.0).contains(&probability) {
                    return Err(Error::InvalidInput(format!(
                        "Stub probability must be within [0, 1], got {}",
                        probability
                    )));
                }
                EngineSource::Stub(probability)
            }
            None => EngineSource::Model(
                cli.model
                    .clone()
                    .or(toml.model_path)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            ),
        };

        let allowed_origins = if cli.allowed_origins.is_empty() {
            toml.allowed_origins
                .unwrap_or_else(|| vec![DEFAULT_ALLOWED_ORIGIN.to_string()])
        } else {
            cli.allowed_origins.clone()
        };

        let max_upload_bytes = toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        let logging = match &cli.log_level {
            Some(level) => LoggingConfig {
                level: level.clone(),
            },
            None => toml.logging,
        };
        logging.validate()?;

        Ok(Self {
            host: cli
                .host
                .clone()
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            engine,
            bindings: InputBindings {
                profile: toml
                    .profile_input_name
                    .unwrap_or_else(|| DEFAULT_PROFILE_INPUT.to_string()),
                movement: toml
                    .movement_input_name
                    .unwrap_or_else(|| DEFAULT_MOVEMENT_INPUT.to_string()),
            },
            allowed_origins,
            max_upload_bytes,
            logging,
        })
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
