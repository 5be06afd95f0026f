//! WebSocket peer handling.
//!
//! Peers declare their role once, in the upgrade query string; the role
//! never changes for the life of the connection. Each peer gets a
//! dedicated writer task draining an unbounded queue, so fanning a
//! frame out to many browsers never blocks on the slowest socket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chipstream_proto::RelayMessage;

use crate::state::{PeerRole, PeerTx, RelayState};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Upgrade handler for `GET /ws?role=game|browser`.
///
/// Any role other than `game` is treated as a browser client.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<RelayState>>,
) -> Response {
    let role = match params.get("role").map(String::as_str) {
        Some("game") => PeerRole::GameSource,
        _ => PeerRole::Browser,
    };
    ws.on_upgrade(move |socket| handle_peer(socket, role, state))
}

async fn handle_peer(socket: WebSocket, role: PeerRole, state: Arc<RelayState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let peer_id = state.register(role, tx.clone());
    info!(peer_id, ?role, "peer connected");

    // Writer task: the only place this socket is written.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Late joiners immediately learn the current sound state.
    if role == PeerRole::Browser {
        send_message(
            &tx,
            &RelayMessage::Sync {
                snd: state.sound_state(),
            },
        );
    }

    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(error) => {
                debug!(peer_id, %error, "socket error, awaiting close");
                break;
            }
        };
        match message {
            Message::Text(text) => match role {
                PeerRole::GameSource => handle_game_message(&state, text.as_str()),
                PeerRole::Browser => handle_browser_message(&state, &tx, text.as_str()),
            },
            Message::Close(_) => break,
            // Ping/pong control frames are answered by the protocol
            // layer; binary payloads are not part of the protocol.
            _ => {}
        }
    }

    state.unregister(role, peer_id);
    writer.abort();
    info!(peer_id, ?role, "peer disconnected");
}

/// Dispatch one message arriving from a game source.
fn handle_game_message(state: &RelayState, text: &str) {
    match RelayMessage::from_json(text) {
        Ok(RelayMessage::Frame(frame)) => {
            state.bump_frames_relayed();
            if let Some(update) = &frame.snd {
                state.apply_sound_update(update);
            }
            // Relay the original serialization untouched; the relay is
            // a transparent fan-out, not a re-encoder.
            state.broadcast_to_browsers(text);
        }
        Ok(RelayMessage::Register { game_type }) => {
            info!(%game_type, "game source registered");
            state.record_game_type(game_type);
        }
        Ok(other) => debug!(?other, "ignoring unexpected message from game source"),
        Err(error) => debug!(%error, "dropping malformed game-source payload"),
    }
}

/// Dispatch one message arriving from a browser client.
fn handle_browser_message(state: &RelayState, tx: &PeerTx, text: &str) {
    match RelayMessage::from_json(text) {
        Ok(RelayMessage::Input(_)) => {
            state.broadcast_to_game_sources(text);
        }
        Ok(RelayMessage::Ping { .. }) => {
            send_message(tx, &RelayMessage::Pong { ts: now_ms() });
        }
        Ok(other) => debug!(?other, "ignoring unexpected message from browser"),
        Err(error) => debug!(%error, "dropping malformed browser payload"),
    }
}

/// Serialize and queue a message for one peer.
pub fn send_message(tx: &PeerTx, message: &RelayMessage) {
    match message.to_json() {
        Ok(text) => {
            let _ = tx.send(Message::Text(Utf8Bytes::from(text)));
        }
        Err(error) => warn!(%error, "failed to encode outbound message"),
    }
}
