//! WebSocket gateway for the game protocol.
//!
//! Every client - dealer console, display board, per-seat views -
//! connects here. On connect the client is subscribed to the table's
//! broadcast stream and immediately receives a `game_state_update`
//! snapshot, so a listen-only client is consistent from its first frame.
//!
//! Inbound frames are JSON [`ClientAction`]s. Registration actions are
//! answered by the gateway itself; everything else is forwarded to the
//! table actor. A rejected action produces an `error` event on the
//! initiating socket only - broadcast events always reflect successful,
//! applied actions.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

use casino_war::{GameEvent, messages::ClientAction};

use super::AppState;

/// Upgrade the HTTP connection to the game WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one client connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = state.next_client_id.fetch_add(1, Ordering::Relaxed);
    let (mut sender, mut receiver) = socket.split();

    info!("client {client_id} connected");

    // Broadcast events from the table actor.
    let (event_tx, mut event_rx) = mpsc::channel::<GameEvent>(64);
    if state.table.subscribe(client_id, event_tx).await.is_err() {
        error!("client {client_id}: table is closed, dropping connection");
        return;
    }

    // Replies addressed to this client only (registration acks, errors).
    let (reply_tx, mut reply_rx) = mpsc::channel::<GameEvent>(32);

    // A fresh client starts from the canonical snapshot.
    match state.table.snapshot().await {
        Ok(game_state) => {
            let _ = reply_tx.send(GameEvent::GameStateUpdate { game_state }).await;
        }
        Err(e) => {
            error!("client {client_id}: failed to fetch snapshot: {e}");
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = event_rx.recv() => event,
                Some(event) = reply_rx.recv() => event,
                else => break,
            };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let action = match serde_json::from_str::<ClientAction>(&text) {
                    Ok(action) => action,
                    Err(e) => {
                        warn!("client {client_id}: unparseable message: {e}");
                        let _ = reply_tx
                            .send(GameEvent::Error {
                                message: format!("invalid message: {e}"),
                            })
                            .await;
                        continue;
                    }
                };
                debug!("client {client_id}: {action}");
                match action {
                    // Role registration is connection-level bookkeeping;
                    // it never touches the game state.
                    ClientAction::RegisterDealer => {
                        info!("client {client_id} registered as the dealer");
                        let _ = reply_tx.send(GameEvent::DealerRegistered).await;
                    }
                    ClientAction::RegisterPlayer { player_id } => {
                        info!("client {client_id} registered as seat {player_id}");
                        let _ = reply_tx
                            .send(GameEvent::PlayerRegistered { player_id })
                            .await;
                    }
                    other => match state.table.apply(other).await {
                        Ok(Ok(())) => {
                            // Success: the broadcast stream carries the
                            // resulting events.
                        }
                        Ok(Err(game_error)) => {
                            let _ = reply_tx
                                .send(GameEvent::Error {
                                    message: game_error.to_string(),
                                })
                                .await;
                        }
                        Err(e) => {
                            error!("client {client_id}: table unavailable: {e}");
                            break;
                        }
                    },
                }
            }
            Ok(Message::Close(_)) => {
                info!("client {client_id} closed the connection");
                break;
            }
            Err(e) => {
                warn!("client {client_id}: websocket error: {e}");
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let _ = state.table.unsubscribe(client_id).await;
    info!("client {client_id} disconnected");
}
