mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::engine::ImportEngine;
use crate::storage::LedgerStore;

pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared by every request; holds no per-request state.
pub struct AppState<S: LedgerStore> {
    pub engine: Arc<ImportEngine<S>>
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone() }
    }
}

pub fn router<S: LedgerStore>(engine: Arc<ImportEngine<S>>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health::<S>))
        .route("/api/tools/import-cartera", post(handlers::import_ledger::<S>))
        .route("/api/cartera/{card_code}", get(handlers::customer_ledger::<S>))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(AppState { engine })
}

pub async fn serve<S: LedgerStore>(engine: Arc<ImportEngine<S>>, bind: &str, max_body_bytes: usize) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(engine, max_body_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, draining in-flight requests");
    }
}
