use crate::app::AppState;
use crate::room::RoomCommand;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use telecall_core::{ConnectionId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    info!(connection = %connection_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_connection(connection_id, tx);
    state.signaling.send_signal(
        connection_id,
        SignalMessage::Welcome {
            connection_id,
            ice_servers: state.signaling.ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => route_signal(&state, connection_id, signal),
                        Err(e) => {
                            warn!(connection = %connection_id, "Invalid SignalMessage: {:?}", e)
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    for room_id in state.signaling.remove_connection(&connection_id) {
        state.rooms.leave(&room_id, connection_id);
    }
    info!(connection = %connection_id, "WebSocket disconnected");
}

fn route_signal(state: &AppState, connection_id: ConnectionId, signal: SignalMessage) {
    match signal {
        SignalMessage::JoinRoom {
            room_id,
            participant_identity,
        } => {
            info!(
                connection = %connection_id,
                room = %room_id,
                participant = %participant_identity,
                "Join requested"
            );
            state.signaling.track_room(&connection_id, room_id.clone());
            state
                .rooms
                .join(&room_id, connection_id, participant_identity);
        }

        SignalMessage::LeaveRoom { room_id } => {
            state.signaling.untrack_room(&connection_id, &room_id);
            state.rooms.leave(&room_id, connection_id);
        }

        message @ (SignalMessage::Description { .. } | SignalMessage::Candidate { .. }) => {
            let Some(room_id) = message.room_id().cloned() else {
                return;
            };
            state.rooms.dispatch(
                &room_id,
                RoomCommand::Relay {
                    from: connection_id,
                    message,
                },
            );
        }

        SignalMessage::Welcome { .. }
        | SignalMessage::PeerJoined {}
        | SignalMessage::Superseded { .. } => {
            warn!(connection = %connection_id, "Ignoring relay-only message from a client");
        }
    }
}
