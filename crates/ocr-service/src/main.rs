use anyhow::{Context, Result};
use ocr_service::{
    api,
    plugin::{plate_reader::PlateReaderPlugin, AiPlugin},
    provider::{GoogleVisionConfig, GoogleVisionProvider},
    PlateEngine, PluginRegistry, ServiceConfig, ServiceState,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = telemetry::init_with_service("ocr-service");

    info!("Starting OCR Service...");

    let config = ServiceConfig::from_env()?;
    info!(
        bind = %config.bind_addr,
        node_id = %config.node_id,
        mode = %config.default_mode,
        "OCR Service configuration"
    );

    let engine_config = config.engine_config()?;

    let mut plate_reader = PlateReaderPlugin::new();
    match GoogleVisionConfig::from_env()? {
        Some(gcv) => {
            info!(endpoint = %gcv.endpoint, locale = %gcv.locale_hint, "Using Google Vision annotations");
            plate_reader.set_provider(Arc::new(GoogleVisionProvider::new(gcv)?));
        }
        None => warn!("GCV_API_KEY not set, /v1/plates/read is disabled"),
    }
    plate_reader
        .init(serde_json::json!({
            "engine": engine_config,
            "mode": config.default_mode,
        }))
        .await
        .context("Failed to initialize plate reader")?;

    let registry = PluginRegistry::new();
    registry.register(Arc::new(RwLock::new(plate_reader))).await?;
    info!("Plugin registry initialized with {} plugins", registry.count().await);

    let state = ServiceState::new(
        config.node_id.clone(),
        registry,
        PlateEngine::new(engine_config),
        config.default_mode,
    );

    let app = api::router(state.clone());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("OCR Service listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

async fn shutdown_signal(state: ServiceState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
    if let Err(e) = state.shutdown().await {
        error!("Error during shutdown: {}", e);
    }
}
