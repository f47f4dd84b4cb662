//! API Routes
//!
//! HTTP endpoints and the `/ws` event channel

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::api::Metrics;
use crate::broadcast::Broadcaster;
use crate::config::MonitorConfig;
use crate::types::ServerEvent;

/// Shared API state
pub struct ApiState {
    pub config: Arc<MonitorConfig>,
    pub broadcaster: Arc<Broadcaster>,
    pub metrics: Arc<Metrics>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Build the router (separate from serving so it can be exercised in tests)
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Event channel
        .route("/ws", get(ws_handler))

        // Health & Status
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/snapshot", get(get_snapshot))

        // Metrics
        .route("/metrics", get(get_metrics_prometheus))
        .route("/metrics/json", get(get_metrics_json))

        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Run the HTTP API server until `shutdown` is cancelled
pub async fn run_api_server(
    config: Arc<MonitorConfig>,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let state = Arc::new(ApiState {
        config: config.clone(),
        broadcaster,
        metrics,
        started_at: chrono::Utc::now(),
    });

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("📊 HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

/// GET /ws - Subscribe to `network_update` events
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_updates(socket, state))
}

/// Push snapshots to one client until either side goes away
async fn stream_updates(mut socket: WebSocket, state: Arc<ApiState>) {
    let mut subscription = match state.broadcaster.connect().await {
        Ok(s) => s,
        Err(e) => {
            warn!("Rejecting subscriber: {}", e);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    let id = subscription.id;

    loop {
        tokio::select! {
            update = subscription.receiver.recv() => {
                let Some(snapshot) = update else { break };

                let text = match ServerEvent::NetworkUpdate(&snapshot).to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Dropping update for subscriber {}: {}", id, e);
                        continue;
                    }
                };

                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Push-only channel: inbound frames are ignored
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => debug!("Ignoring inbound frame from subscriber {}", id),
                }
            }
        }
    }

    state.broadcaster.disconnect(id).await;
}

/// GET /health - Simple health check
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// GET /status - Detailed status
async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let broadcaster = &state.broadcaster;
    let subscribers = broadcaster.subscribers().count().await;

    let (round, validators) = {
        let simulation = broadcaster.simulation().read().await;
        let net = simulation.state();
        (net.round(), net.registry.stats())
    };

    let status = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": state.metrics.uptime_secs(),
        "scheduler": broadcaster.scheduler().state(),
        "tick_interval_ms": state.config.tick_interval_ms,
        "subscribers": subscribers,
        "network": {
            "latest_consensus_round": round,
            "validators": validators,
        }
    });

    Json(status)
}

/// GET /snapshot - Most recent broadcast snapshot
async fn get_snapshot(State(state): State<Arc<ApiState>>) -> Response {
    match state.broadcaster.subscribers().latest().await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot.as_ref().clone())).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "No snapshot yet; connect a subscriber to start the feed" })),
        )
            .into_response(),
    }
}

/// GET /metrics - Prometheus format metrics
async fn get_metrics_prometheus(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.to_prometheus(),
    )
}

/// GET /metrics/json - JSON format metrics
async fn get_metrics_json(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.metrics.to_json())
}
