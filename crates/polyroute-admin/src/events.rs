use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::select;
use tokio::time::{self, Duration};

use crate::state::AdminState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

pub fn router() -> Router<AdminState> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AdminState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(mut socket: WebSocket, state: AdminState) {
    let mut sub = state.events.subscribe();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    loop {
        select! {
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
            event = sub.recv() => {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }
}
