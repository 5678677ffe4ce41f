//! HTTP side of the bot: the liveness probe the host platform polls, and
//! the webhook route Telegram pushes updates to in webhook mode.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use teloxide::types::{Update, UpdateKind};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::gateway::telegram::inbound_event;
use crate::router::ContactRouter;

pub const LIVENESS: &str = "🟢 Contact router bot is alive";

async fn liveness() -> &'static str {
    LIVENESS
}

async fn receive_update(
    State(router): State<Arc<ContactRouter>>,
    Json(update): Json<Update>,
) -> StatusCode {
    match &update.kind {
        UpdateKind::Message(msg) => match inbound_event(msg) {
            Some(event) => router.handle(event).await,
            None => debug!("Ignoring message without sender in update {:?}", update.id),
        },
        _ => debug!("Ignoring non-message update {:?}", update.id),
    }
    StatusCode::OK
}

/// Build the HTTP app. With `webhook = Some((path, router))` the app also
/// accepts Telegram updates on `POST path`.
pub fn app(webhook: Option<(String, Arc<ContactRouter>)>) -> Router {
    let app = Router::new().route("/", get(liveness));
    match webhook {
        Some((path, router)) => app.merge(
            Router::new()
                .route(&path, post(receive_update))
                .with_state(router),
        ),
        None => app,
    }
}

/// Bind the HTTP port on all interfaces. Done before any transport starts
/// so a taken port stops the process instead of leaving it without probe.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))
}

/// Serve `app` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP health-check listening on {}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;
    info!("HTTP server stopped");
    Ok(())
}
