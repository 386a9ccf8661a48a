//! WebSocket subscribe endpoint.
//!
//! A subscriber connects to `/ws/{user_id}` and is pushed a JSON-encoded
//! stored record for every create targeting that user id. The channel is
//! push-only: inbound frames are read and discarded, serving only as a
//! liveness signal.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{debug, info, instrument};

use crate::{AppState, api::models::processed_agent_data::SubscribePathParams, types::UserId};

/// GET /ws/{user_id} - upgrade to a live update channel for one user id.
#[instrument(skip_all, fields(user_id = params.user_id))]
pub async fn subscribe_handler(
    ws: WebSocketUpgrade,
    Path(params): Path<SubscribePathParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

/// Pump registry updates into the socket until either side goes away, then
/// deregister the handle.
async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: UserId) {
    let (subscriber_id, mut updates) = state.subscriptions.subscribe(user_id);
    info!(user_id, subscriber_id, "subscriber connected");

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Some(payload) => {
                        if let Err(err) = socket.send(Message::Text(payload)).await {
                            debug!(user_id, subscriber_id, error = %err, "failed to push update");
                            break;
                        }
                    }
                    // Registry dropped our sender
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // Read-and-discard: the channel carries no client protocol
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(user_id, subscriber_id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    state.subscriptions.unsubscribe(user_id, subscriber_id);
    info!(user_id, subscriber_id, "subscriber disconnected");
}
