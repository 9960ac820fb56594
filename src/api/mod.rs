//! WebSocket/HTTP carrier for remote UI clients
//!
//! Clients connect to `/ws`, send named commands as JSON, and receive the
//! full-state broadcast events. The HTTP side optionally serves a static UI
//! bundle and a health endpoint; everything stateful stays behind the command
//! channel consumed by the router loop.

use crate::events::{EventBus, UiEvent};
use crate::router::UiCommand;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{debug, info, warn};

/// Default UI/API port
pub const DEFAULT_API_PORT: u16 = 8037;

/// Shared state for API handlers
pub struct ApiState {
    /// Broadcast hub the router and store publish into
    pub events: EventBus,
    /// Command channel into the router loop
    pub cmd_tx: mpsc::Sender<UiCommand>,
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ApiState>, ui_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/api/health", get(health_check));

    if let Some(dir) = ui_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    let rx = state.events.subscribe();
    let cmd_tx = state.cmd_tx.clone();
    ws.on_upgrade(move |socket| handle_client(socket, rx, cmd_tx))
}

/// One connected UI client: fan events out, feed parsed commands in.
async fn handle_client(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<UiEvent>,
    cmd_tx: mpsc::Sender<UiCommand>,
) {
    debug!("UI client connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Failed to serialize event: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Snapshots are full-state, so a lagged client only
                        // needs the next event to converge
                        warn!("UI client lagged by {n} events");
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<UiCommand>(&text) {
                            Ok(cmd) => {
                                if cmd_tx.send(cmd).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Rejected malformed UI command: {e}"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    debug!("UI client disconnected");
}

async fn health_check() -> &'static str {
    "ok"
}

/// Start the API server.
pub async fn start_server(
    state: Arc<ApiState>,
    port: u16,
    ui_dir: Option<PathBuf>,
) -> Result<()> {
    let router = build_router(state, ui_dir);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting UI server on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind UI server")?;

    axum::serve(listener, router)
        .await
        .context("UI server error")?;

    Ok(())
}
