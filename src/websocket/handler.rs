use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::room::SessionHandle;
use crate::websocket::message::ClientMessage;
use crate::AppState;

/// WebSocket upgrade handler
/// This is the endpoint that clients connect to
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
/// Manages the lifecycle of one session, from upgrade to cleanup
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing messages, drained by the send task
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let session_id = Uuid::new_v4();
    let session = SessionHandle::new(session_id, tx);

    tracing::info!("session {} connected", session_id);

    // Forward queued messages to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming frames from this session
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text_message(&state, &session, &text).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("session {} sent close frame", session_id);
                break;
            }
            Ok(_) => {
                // Ping/pong is answered by axum, binary has no meaning here
            }
            Err(e) => {
                tracing::warn!("websocket error for session {}: {}", session_id, e);
                break;
            }
        }
    }

    // Cleanup runs however the connection ended
    if let Some(room_id) = state.registry.leave(session_id).await {
        tracing::info!("session {} left room {}", session_id, room_id);
    }

    send_task.abort();
    tracing::info!("session {} disconnected", session_id);
}

/// Route one text frame. A frame that does not parse is dropped and
/// logged; the connection itself stays up.
async fn handle_text_message(state: &AppState, session: &SessionHandle, text: &str) {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("dropping frame from session {}: {}", session.id(), e);
            return;
        }
    };

    match message {
        ClientMessage::JoinRoom { room_id } => {
            if let Some(previous) = state.registry.join(&room_id, session.clone()).await {
                tracing::info!(
                    "session {} moved from room {} to room {}",
                    session.id(),
                    previous,
                    room_id
                );
            } else {
                tracing::info!("session {} joined room {}", session.id(), room_id);
            }
        }
        message => {
            if let Some((room_id, event)) = message.into_relay() {
                let delivered = state.registry.relay(&room_id, session.id(), &event).await;
                tracing::debug!(
                    "relayed {:?} from session {} to {} members of room {}",
                    event,
                    session.id(),
                    delivered,
                    room_id
                );
            }
        }
    }
}
