//! WebSocket upgrade handler

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaHandle, GameError, PlayerId};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Every connection gets a fresh id.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let connection_id = PlayerId::from(Uuid::new_v4());
    debug!(connection_id = %connection_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, connection_id: PlayerId, state: AppState) {
    info!(connection_id = %connection_id, "New WebSocket connection");
    state.sessions.fetch_add(1, Ordering::Relaxed);

    let (ws_sink, ws_stream) = socket.split();
    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);

    run_session(
        connection_id.clone(),
        ws_sink,
        ws_stream,
        state.arena.clone(),
        rate_limiter,
    )
    .await;

    // Removes the player and its AI opponent; harmless if they are already gone
    if let Err(e) = state.arena.disconnect(connection_id.clone()).await {
        error!(connection_id = %connection_id, error = %e, "Error handling disconnect");
    }

    state.sessions.fetch_sub(1, Ordering::Relaxed);
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: PlayerId,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    arena: ArenaHandle,
    rate_limiter: ConnectionRateLimiter,
) {
    let mut snapshot_rx = arena.subscribe();
    // Replies meant for this connection only (acks and errors)
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMsg>(16);

    // Spawn writer task: arena broadcasts and direct replies -> WebSocket
    let writer_id = connection_id.clone();
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                direct = direct_rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
                received = snapshot_rx.recv() => match received {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            connection_id = %writer_id,
                            lagged_count = n,
                            "Client lagged, skipping {} snapshots", n
                        );
                        // Continue - don't disconnect for lag
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(connection_id = %writer_id, "Snapshot channel closed");
                        break;
                    }
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(connection_id = %writer_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(connection_id = %connection_id, "Rate limited input message");
                    continue;
                }

                let outcome = match ClientMsg::parse(&text) {
                    Ok(msg) => dispatch(&arena, &connection_id, msg).await,
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                        Err(e)
                    }
                };

                let reply = match outcome {
                    Ok(reply) => reply,
                    Err(GameError::ArenaClosed) => {
                        debug!(connection_id = %connection_id, "Arena closed");
                        break;
                    }
                    Err(e) => Some(ServerMsg::from(&e)),
                };

                if let Some(reply) = reply {
                    if direct_tx.send(reply).await.is_err() {
                        debug!(connection_id = %connection_id, "Writer task gone");
                        break;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(connection_id = %connection_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(connection_id = %connection_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Forward a client message to the arena; returns the direct reply, if any
async fn dispatch(
    arena: &ArenaHandle,
    connection_id: &PlayerId,
    msg: ClientMsg,
) -> Result<Option<ServerMsg>, GameError> {
    match msg {
        ClientMsg::JoinGame { name } => {
            let player_id = arena.join(connection_id.clone(), name).await?;
            Ok(Some(ServerMsg::JoinAck { player_id }))
        }
        ClientMsg::PlayerMove { direction } => {
            arena.move_player(connection_id.clone(), direction).await?;
            Ok(None)
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::GameArena;
    use crate::ws::protocol::MoveDirection;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_join_acks_and_errors() {
        let (arena, handle) = GameArena::new(GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        });
        let task = tokio::spawn(arena.run());
        let conn = PlayerId::new("conn-1");

        let reply = dispatch(
            &handle,
            &conn,
            ClientMsg::JoinGame {
                name: "Kevin".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            reply,
            Some(ServerMsg::JoinAck {
                player_id: conn.clone()
            })
        );

        let err = assert_err!(
            dispatch(
                &handle,
                &conn,
                ClientMsg::JoinGame {
                    name: "Kevin".to_string(),
                },
            )
            .await
        );
        assert_eq!(
            ServerMsg::from(&err),
            ServerMsg::Error {
                code: "duplicate_join".to_string(),
                message: format!("Player {} has already joined", conn),
            }
        );

        let reply = dispatch(
            &handle,
            &conn,
            ClientMsg::PlayerMove {
                direction: MoveDirection::Left,
            },
        )
        .await
        .unwrap();
        assert_eq!(reply, None);

        handle.shutdown();
        assert_ok!(task.await);
    }
}
