use telecall_core::{ConnectionId, ParticipantIdentity, SignalMessage};
use tokio::sync::oneshot;

/// Commands delivered to a room actor by the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection announced itself as `participant` in this room.
    Join {
        connection_id: ConnectionId,
        participant: ParticipantIdentity,
    },

    /// Forward `message` untouched to every other member.
    Relay {
        from: ConnectionId,
        message: SignalMessage,
    },

    /// Explicit leave or a closed WebSocket.
    Leave { connection_id: ConnectionId },

    /// Current membership, in no particular order.
    Snapshot {
        reply: oneshot::Sender<Vec<(ConnectionId, ParticipantIdentity)>>,
    },
}

impl RoomCommand {
    /// Only joins may bring a room into existence.
    pub fn creates_room(&self) -> bool {
        matches!(self, Self::Join { .. })
    }
}
