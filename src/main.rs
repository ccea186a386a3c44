use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinescape::{
    config::Config,
    create_router,
    services::providers::{DemoProvider, MetadataProvider, TmdbProvider},
    trending::TrendPoller,
    AppState,
};

/// How often stale rate-limit windows are forgotten
const RATE_LIMIT_PRUNE_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinescape=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let upstream: Option<Arc<dyn MetadataProvider>> = match config.usable_token() {
        Some(token) => Some(Arc::new(
            TmdbProvider::new(token.to_string(), config.tmdb_api_url.clone())
                .context("Failed to build TMDB client")?,
        )),
        None => {
            warn!("TMDB access token not configured, running with the demo catalog");
            None
        }
    };
    let poll_source: Arc<dyn MetadataProvider> = match &upstream {
        Some(provider) => Arc::clone(provider),
        None => Arc::new(DemoProvider::new()),
    };

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_addr()))?;
    let poll_interval = config.poll_interval();
    let window = config.trending_window;

    let state = AppState::new(config, upstream);
    let shutdown = CancellationToken::new();

    let poller = TrendPoller::new(poll_source, state.hub.clone(), window, poll_interval)
        .spawn(shutdown.clone());
    let pruner = state
        .rate_limiter
        .spawn_pruner(RATE_LIMIT_PRUNE_EVERY, shutdown.clone());

    let hub = state.hub.clone();
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    let stop = shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        stop.cancel();
        // Open sockets and event streams end once their queues close
        hub.close_all();
    })
    .await
    .context("Server error")?;

    shutdown.cancel();
    for (name, handle) in [("poller", poller), ("rate limit pruner", pruner)] {
        if let Err(e) = handle.await {
            error!(task = name, error = %e, "Background task did not stop cleanly");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install signal handler");
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
