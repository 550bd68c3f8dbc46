use crate::negotiation::status::{ConnectionStatus, PeerState};
use telecall_core::{IceCandidate, SessionDescription};

/// Inputs of the negotiation state machine, in the order the coordinator
/// observed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    /// The room was joined and local media is attached.
    Joined,
    NegotiationNeeded,
    PeerJoined,
    /// An offer requested by [`Effect::CreateOffer`] finished, sent or not.
    OfferSettled { ice_restart: bool, sent: bool },
    RemoteDescription(SessionDescription),
    RemoteCandidate(Option<IceCandidate>),
    LocalCandidate(Option<IceCandidate>),
    ConnectionStateChanged(PeerState),
    TransportLost(String),
    /// The relay gave this seat to a newer connection with the same identity.
    Superseded,
    Teardown,
}

/// Work the coordinator performs against the primitive and the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create an offer, apply it locally and send it. Always answered with
    /// [`NegotiationEvent::OfferSettled`].
    CreateOffer { ice_restart: bool },
    Rollback,
    ApplyRemoteDescription(SessionDescription),
    ApplyCandidate(IceCandidate),
    /// Apply a candidate that may belong to an ignored offer. Failure is
    /// expected and not worth a warning.
    TryCandidate(IceCandidate),
    /// Create an answer, apply it locally and send it.
    CreateAnswer,
    SendCandidate(Option<IceCandidate>),
    ReportStatus(ConnectionStatus),
    LeaveRoom,
    ClosePeer,
}

impl Effect {
    /// Effects still executed once teardown has begun.
    pub fn survives_teardown(&self) -> bool {
        matches!(self, Self::ReportStatus(_) | Self::LeaveRoom | Self::ClosePeer)
    }

    /// Effects that only make sense after the preceding remote description
    /// was applied.
    pub fn depends_on_remote_description(&self) -> bool {
        matches!(
            self,
            Self::ApplyCandidate(_) | Self::TryCandidate(_) | Self::CreateAnswer
        )
    }
}
