use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use telecall_core::{ConnectionId, IceServerConfig, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error};

struct Connection {
    tx: mpsc::UnboundedSender<Message>,
    rooms: HashSet<RoomId>,
}

struct SignalingInner {
    connections: DashMap<ConnectionId, Connection>,
    ice_servers: Vec<IceServerConfig>,
}

/// Registry of live WebSocket connections and the rooms each one joined.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(
            connection_id,
            Connection {
                tx,
                rooms: HashSet::new(),
            },
        );
    }

    /// Forgets the connection and returns the rooms it still belonged to.
    pub fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.inner
            .connections
            .remove(connection_id)
            .map(|(_, connection)| connection.rooms.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn track_room(&self, connection_id: &ConnectionId, room_id: RoomId) {
        if let Some(mut connection) = self.inner.connections.get_mut(connection_id) {
            connection.rooms.insert(room_id);
        }
    }

    pub fn untrack_room(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        if let Some(mut connection) = self.inner.connections.get_mut(connection_id) {
            connection.rooms.remove(room_id);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn send_signal(&self, connection_id: ConnectionId, msg: SignalMessage) {
        let Some(connection) = self.inner.connections.get(&connection_id) else {
            debug!(connection = %connection_id, "Dropping signal for a closed connection");
            return;
        };

        match serde_json::to_string(&msg) {
            Ok(json) => {
                if connection.tx.send(Message::Text(json.into())).is_err() {
                    debug!(connection = %connection_id, "Outbound queue already closed");
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, connection_id: ConnectionId, message: SignalMessage) {
        self.send_signal(connection_id, message);
    }
}
