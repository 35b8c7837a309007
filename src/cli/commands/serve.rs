use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace, warn};

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;
use crate::session::log_session_events;

pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering serve function");
    debug!("Database URL: {}", database_url);

    let state = initialize_app_state_with_url(database_url)
        .await
        .inspect_err(|e| error!("Failed to initialize application state: {}", e))?;

    trace!("Spawning session event logger");
    tokio::spawn(log_session_events(state.sessions.subscribe()));
    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("RewardCore API listening on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    run_server(listener, app, shutdown_signal()).await
}

/// Serves `app` until `shutdown` resolves, then lets in-flight requests finish.
pub async fn run_server<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        debug!("Accepting connections on {}", address);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| error!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
