use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub order_number: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<EventFilter>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state, filter))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, filter: EventFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.order_events_tx.subscribe();

    info!(order_number = ?filter.order_number, "websocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging; events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if let Some(wanted) = &filter.order_number {
                if event.order_number() != wanted.as_str() {
                    continue;
                }
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize order event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    first_to_finish(send_task, recv_task).await;

    info!("websocket client disconnected");
}

/// Waits for either task, then aborts the other and waits for it to drop.
/// A filtered sender only notices a closed socket when it sends, so it has
/// to be torn down from here.
async fn first_to_finish<A, B>(mut send_task: JoinHandle<A>, mut recv_task: JoinHandle<B>) {
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }
}
