// Pet Flights - Web Server
//
// init (load CSV) -> serve until Ctrl+C / SIGTERM -> teardown (save CSV)

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use pet_flights::api::{router, AppState};
use pet_flights::config::ServerConfig;
use pet_flights::logging::init_logging;
use pet_flights::{init, teardown};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_logging(config.common.verbosity());

    info!("Pet Flights server v{}", pet_flights::VERSION);

    // Load before accepting any traffic
    let files = config.common.data_files();
    let (store, summary) = init(&files);
    if !summary.is_clean() {
        warn!(
            skipped = summary.skipped(),
            "started with an incomplete data directory; run `pet-flights check` for details"
        );
    }

    let state = AppState::new(store);
    let app = router(state.clone());

    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Traffic has stopped: flush once
    state.with_store(|store| teardown(store, &files))?;
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
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
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
