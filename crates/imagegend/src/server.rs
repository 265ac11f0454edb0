//! HTTP server for imagegend

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use imagegen_core::{AuditLog, IdentityResolver, Orchestrator};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub audit_log: Arc<dyn AuditLog>,
    pub identities: Arc<dyn IdentityResolver>,
    pub logs_enabled: bool,
    /// Fired on shutdown; in-flight polling stops at its next suspension point
    pub shutdown: CancellationToken,
}

pub fn app(state: AppState) -> Router {
    routes::router(Arc::new(state)).layer(TraceLayer::new_for_http())
}

/// Serve until ctrl-c, then cancel in-flight generations and drain.
pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, cancelling in-flight generations");
            }
            shutdown.cancel();
        })
        .await?;

    info!("imagegend stopped");
    Ok(())
}
