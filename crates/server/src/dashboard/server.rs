//! axum web server for the live dashboard.
//!
//! Serves a single-page dashboard at `/`, JSON snapshots under `/api`, and
//! pushes metrics plus every notification to connected browsers via
//! WebSocket at `/ws`.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use super::DashboardState;
use super::metrics::MetricsSnapshot;
use crate::manage::LandInfo;

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/metrics", get(metrics))
        .route("/api/lands", get(lands))
        .route("/api/lands/:name", get(land))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

/// Start the dashboard web server. Runs forever on its own tasks.
pub async fn start(state: Arc<DashboardState>, port: u16) {
    let addr = format!("0.0.0.0:{}", port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Dashboard failed to bind to {}: {}", addr, e);
            return;
        }
    };
    tracing::info!("Dashboard listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!("Dashboard server error: {}", e);
    }
}

async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn metrics(State(state): State<Arc<DashboardState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot(state.lands.len() as u64))
}

async fn lands(State(state): State<Arc<DashboardState>>) -> Json<Vec<LandInfo>> {
    Json(state.lands.list_all().iter().map(LandInfo::from).collect())
}

async fn land(
    State(state): State<Arc<DashboardState>>,
    Path(name): Path<String>,
) -> Result<Json<LandInfo>, StatusCode> {
    state
        .lands
        .get(&name)
        .map(|land| Json(LandInfo::from(&land)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DashboardState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push metrics every half second and forward notifications as they happen.
async fn handle_socket(mut socket: WebSocket, state: Arc<DashboardState>) {
    let mut notifications = state.bus.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snap = state.metrics.snapshot(state.lands.len() as u64);
                let msg = serde_json::json!({
                    "type": "metrics",
                    "data": snap,
                });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            result = notifications.recv() => {
                let note = match result {
                    Ok(note) => note,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Dashboard client lagged, skipped {} notifications", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let msg = serde_json::json!({
                    "type": "notification",
                    "data": note,
                });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            // Drain any incoming messages (ping/pong, close).
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

async fn send_json(socket: &mut WebSocket, value: &serde_json::Value) -> Result<(), ()> {
    let text = value.to_string();
    socket.send(Message::Text(text)).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_engine::land::{ActorId, Land};
    use claim_engine::store::MemoryStore;
    use claim_engine::world::position::{BlockPos, DimensionId};
    use claim_engine::repository::LandRepository;

    use crate::dashboard::Metrics;
    use crate::event_bus::BusNotifier;

    fn state() -> Arc<DashboardState> {
        let lands = Arc::new(LandRepository::open(Arc::new(MemoryStore::new())).unwrap());
        lands
            .create(Land::new(
                "Home",
                ActorId::new("Alice"),
                DimensionId::new("main"),
                BlockPos::new(0, 64, 0),
                BlockPos::new(10, 70, 10),
            ))
            .unwrap();
        Arc::new(DashboardState::new(Arc::new(Metrics::new()), lands, BusNotifier::new()))
    }

    #[tokio::test]
    async fn api_handlers_read_shared_state() {
        let state = state();
        let Json(snap) = metrics(State(state.clone())).await;
        assert_eq!(snap.lands, 1);

        let Json(all) = lands(State(state.clone())).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].capacity, 847);

        let found = land(State(state.clone()), Path("Home".to_string())).await;
        assert!(found.is_ok());
        let missing = land(State(state), Path("Nowhere".to_string())).await;
        assert_eq!(missing.err(), Some(StatusCode::NOT_FOUND));
    }
}
