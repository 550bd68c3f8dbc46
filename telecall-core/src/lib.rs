pub mod model;

pub use model::{
    ConnectionId, DescriptionKind, IceCandidate, IceServerConfig, ParticipantIdentity, RoomId,
    SessionDescription, SignalMessage,
};
