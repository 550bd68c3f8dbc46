mod connection;
mod description;
mod participant;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use description::{DescriptionKind, IceCandidate, SessionDescription};
pub use participant::ParticipantIdentity;
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalMessage};
