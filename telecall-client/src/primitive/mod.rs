mod webrtc_peer;

pub use crate::negotiation::PrimitiveView;
pub use webrtc_peer::WebrtcPeer;

use crate::media::{LocalMedia, MediaKind};
use crate::negotiation::{PeerState, SignalingPhase};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use telecall_core::{IceCandidate, SessionDescription};
use webrtc::track::track_remote::TrackRemote;

/// Callbacks of the primitive, delivered in order through an mpsc channel
/// handed out when the primitive is built.
#[derive(Debug, Clone)]
pub enum PrimitiveEvent {
    NegotiationNeeded,
    /// `None` marks the end of gathering.
    IceCandidate(Option<IceCandidate>),
    ConnectionState(PeerState),
    Track(RemoteTrack),
}

/// Media arriving from the other participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
    /// The RTP source, absent for primitives that carry no real media.
    pub handle: Option<Arc<TrackRemote>>,
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The underlying peer connection the coordinator negotiates on.
///
/// Mirrors the browser's `RTCPeerConnection` closely enough that rollback,
/// trickle candidates and ICE restarts behave the same way.
#[async_trait]
pub trait PeerPrimitive: Send + Sync {
    fn signaling_phase(&self) -> SignalingPhase;

    async fn has_remote_description(&self) -> bool;

    async fn add_local_media(&self, media: LocalMedia) -> Result<()>;

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    /// Discards a local offer that has not been answered.
    async fn rollback(&self) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;

    async fn view(&self) -> PrimitiveView {
        PrimitiveView {
            signaling: self.signaling_phase(),
            has_remote_description: self.has_remote_description().await,
        }
    }
}
