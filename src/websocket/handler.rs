use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

use crate::AppState;

/// WebSocket upgrade handler for the live stats stream.
pub async fn stats_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("Stats WebSocket client connected");

    // Send a snapshot immediately so the client needn't wait for the next tick
    match serde_json::to_string(&state.manager.get_all_stats()) {
        Ok(json) => {
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
        Err(e) => {
            error!("Failed to serialize stats snapshot: {}", e);
            return;
        }
    }

    let mut stats_rx = state.stats_tx.subscribe();

    // Forward broadcast stats frames until either side hangs up
    let send_task = tokio::spawn(async move {
        loop {
            match stats_rx.recv().await {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Frames are full snapshots, so dropped ones are harmless
                    debug!("Stats stream lagged, skipped {} frames", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // The stream is one-way; drain incoming frames to honor pings and closes
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                info!("Stats WebSocket client disconnecting");
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
                debug!("Received ping from stats client");
            }
            Ok(_) => {}
            Err(e) => {
                error!("Stats WebSocket error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    info!("Stats WebSocket client disconnected");
}
