use crate::model::connection::ConnectionId;
use crate::model::description::{IceCandidate, SessionDescription};
use crate::model::participant::ParticipantIdentity;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Messages exchanged between clients and the relay.
///
/// `Description` and `Candidate` are forwarded by the relay untouched; their
/// payload contract belongs to the negotiating clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum SignalMessage {
    #[serde(rename_all = "camelCase")]
    Welcome {
        connection_id: ConnectionId,
        ice_servers: Vec<IceServerConfig>,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        participant_identity: ParticipantIdentity,
    },
    PeerJoined {},
    #[serde(rename_all = "camelCase")]
    Description {
        room_id: RoomId,
        description: SessionDescription,
    },
    #[serde(rename_all = "camelCase")]
    Candidate {
        room_id: RoomId,
        candidate: Option<IceCandidate>,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },
    /// Sent by the relay to a connection whose seat was taken by a newer
    /// connection with the same identity. Nothing more arrives for that room.
    #[serde(rename_all = "camelCase")]
    Superseded { room_id: RoomId },
}

impl SignalMessage {
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::Description { room_id, .. }
            | Self::Candidate { room_id, .. }
            | Self::LeaveRoom { room_id }
            | Self::Superseded { room_id } => Some(room_id),
            Self::Welcome { .. } | Self::PeerJoined {} => None,
        }
    }

    /// Whether the relay forwards this message verbatim to the rest of a room.
    pub fn is_relayed(&self) -> bool {
        matches!(self, Self::Description { .. } | Self::Candidate { .. })
    }
}
