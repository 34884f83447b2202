//! sleepscan-predict - Parkinson's risk prediction microservice
//!
//! Loads the classifier once at startup, then serves `POST /predict`
//! uploads until Ctrl+C / SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use sleepscan_common::config::{load_toml_config, resolve_config_path};
use sleepscan_predict::config::{Cli, EngineSource, PredictToml, Settings, MODULE_NAME};
use sleepscan_predict::engine::{InferenceEngine, StaticEngine};
use sleepscan_predict::{build_router, Adapter, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is read before tracing starts: the log level lives in it
    let config_path = resolve_config_path(cli.config.as_deref(), MODULE_NAME);
    let loaded = load_toml_config::<PredictToml>(config_path.as_deref())?;
    let settings = Settings::resolve(&cli, loaded.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.to_ascii_lowercase().into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting SleepScan Predict ({}) v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.source.log();

    // Load the engine once; every request shares it
    let engine = load_engine(&settings)?;
    let adapter = Adapter::with_bindings(engine, settings.bindings.clone());
    info!(
        "Engine ready: {} (inputs: {}, {})",
        adapter.engine().name(),
        settings.bindings.profile,
        settings.bindings.movement
    );

    let state = AppState::new(
        adapter,
        settings.allowed_origins.clone(),
        settings.max_upload_bytes,
    );
    let app = build_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("{} listening on http://{}", MODULE_NAME, addr);
    info!("Health check: http://{}/health", addr);
    info!("Allowed origins: {:?}", settings.allowed_origins);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn load_engine(settings: &Settings) -> Result<Arc<dyn InferenceEngine>> {
    match &settings.engine {
        EngineSource::Stub(probability) => {
            warn!(
                "No model loaded: every prediction returns probability {}",
                probability
            );
            Ok(Arc::new(StaticEngine::new(*probability)))
        }
        EngineSource::Model(path) => load_model(settings, path),
    }
}

#[cfg(feature = "onnx")]
fn load_model(settings: &Settings, path: &std::path::Path) -> Result<Arc<dyn InferenceEngine>> {
    use sleepscan_predict::engine::OnnxEngine;

    let required = [
        settings.bindings.profile.as_str(),
        settings.bindings.movement.as_str(),
    ];
    let engine = OnnxEngine::from_file(path, &required)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "onnx"))]
fn load_model(_settings: &Settings, path: &std::path::Path) -> Result<Arc<dyn InferenceEngine>> {
    anyhow::bail!(
        "Cannot load {}: built without the `onnx` feature (use --stub-probability)",
        path.display()
    )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
