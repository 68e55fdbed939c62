//! riskmap HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use riskmap::catalogue::Catalogue;
use riskmap::config::Config;
use riskmap::embedding::{EmbedderConfig, PatternEmbedder};
use riskmap::gateway::{HandlerState, create_router_with_state};
use riskmap::index::{IndexBackend, MemoryPatternIndex, QdrantPatternIndex, SharedIndex};
use riskmap::llm::{GenaiModel, ResilientModelClient, RetryPolicy};
use riskmap::pipeline::Classifier;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }
    let force_rebuild = std::env::args().any(|arg| arg == "--rebuild-index");

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        model = %config.llm_model,
        threshold = config.match_threshold,
        "riskmap starting"
    );

    let catalogue = Arc::new(Catalogue::from_csv_path(&config.catalogue_path)?);

    let embedder = Arc::new(PatternEmbedder::load(EmbedderConfig::from_service_config(
        &config,
    ))?);
    let embedder_mode = if embedder.is_stub() { "stub" } else { "model" };

    let backend = match &config.qdrant_url {
        Some(url) => IndexBackend::Qdrant(
            QdrantPatternIndex::connect(
                url,
                &config.collection_name,
                Arc::clone(&embedder),
                Arc::clone(&catalogue),
                force_rebuild,
            )
            .await?,
        ),
        None => {
            if force_rebuild {
                tracing::info!("--rebuild-index has no effect on the in-process index");
            }
            IndexBackend::Memory(MemoryPatternIndex::build(Arc::clone(&embedder), &catalogue)?)
        }
    };
    let index_backend = backend.name();
    tracing::info!(backend = index_backend, patterns = catalogue.len(), "Pattern index ready");

    let model = ResilientModelClient::new(
        Arc::new(GenaiModel::new(config.llm_model.clone())),
        RetryPolicy::from_config(&config),
    );
    let classifier = Classifier::from_config(&config, SharedIndex::new(backend), model);

    let state = HandlerState::new(classifier, catalogue.frameworks().to_vec())
        .with_components(index_backend, embedder_mode);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("riskmap shutdown complete");
    Ok(())
}

async fn run_health_check() -> i32 {
    let port = std::env::var("RISKMAP_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    else {
        return 1;
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        _ => 1,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
