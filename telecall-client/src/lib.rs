mod config;
mod coordinator;
mod error;
pub mod media;
pub mod negotiation;
pub mod primitive;
pub mod role;
pub mod transport;

pub use config::{CallConfig, DEFAULT_RELAY_URL};
pub use coordinator::{CallHandle, CallParts, connect_call, start_call};
pub use error::{CallError, TransportError};
pub use media::{LocalMedia, MediaSource, SyntheticMedia};
pub use negotiation::{ConnectionStatus, NegotiationStats, PeerState, Role, SignalingPhase};
pub use primitive::{PeerPrimitive, PrimitiveEvent, PrimitiveView, RemoteTrack, WebrtcPeer};
pub use role::{CategoryOrder, PairwiseOrder, RoleError, RoleResolver};
pub use transport::{SignalingTransport, WsConnection, WsTransport};
