use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::StreamExt;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};

use crate::ServerState;

/// Accepts a single console command as the raw request body.
pub async fn post_command(state: State<Arc<ServerState>>, body: String) -> StatusCode {
    match state.commands.send(body) {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn websocket(ws: WebSocketUpgrade, state: State<Arc<ServerState>>) -> impl IntoResponse {
    let rx = state.updates.subscribe();
    let tx = state.commands.clone();
    ws.on_upgrade(|socket| async move {
        handle_ws_conn(tx, rx, socket).await;
    })
}

async fn handle_ws_conn(
    tx: mpsc::UnboundedSender<String>,
    mut rx: broadcast::Receiver<String>,
    mut socket: WebSocket,
) {
    log::info!("Console connected");
    loop {
        tokio::select! {
            msg = socket.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if tx.send(text).is_err() {
                        log::debug!("Match loop gone, closing console");
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    log::warn!("Console connection failed: {}", err);
                    break;
                }
            },
            update = rx.recv() => match update {
                Ok(text) => {
                    if let Err(err) = socket.send(Message::Text(text)).await {
                        log::error!("Failed to send update: {}", err);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Console is lagging, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    log::info!("Console disconnected");
    if let Err(err) = socket.close().await {
        log::debug!("Failed to close websocket: {}", err);
    }
}
