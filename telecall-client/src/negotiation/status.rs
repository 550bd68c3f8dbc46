use std::fmt;

/// What the UI renders for a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    WaitingForPeer,
    Connected,
    Disconnected,
    /// `retrying` is set while the single automatic restart is in progress.
    Failed { reason: String, retrying: bool },
}

impl ConnectionStatus {
    /// No further transition will happen on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected
                | Self::Failed {
                    retrying: false,
                    ..
                }
        )
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("Connecting..."),
            Self::WaitingForPeer => f.write_str("Waiting for other user..."),
            Self::Connected => f.write_str("Connected"),
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Failed {
                reason,
                retrying: true,
            } => write!(f, "Reconnecting ({reason})"),
            Self::Failed {
                reason,
                retrying: false,
            } => write!(f, "Failed: {reason}"),
        }
    }
}

/// Connection state reported by the peer-connection primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingPhase {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
}

/// Snapshot of the primitive taken right before an event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveView {
    pub signaling: SignalingPhase,
    pub has_remote_description: bool,
}

impl PrimitiveView {
    pub fn stable(has_remote_description: bool) -> Self {
        Self {
            signaling: SignalingPhase::Stable,
            has_remote_description,
        }
    }
}

/// Counters describing how negotiation went, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiationStats {
    pub offers_created: u32,
    pub offers_ignored: u32,
    pub rollbacks: u32,
    pub stale_answers: u32,
    pub ice_restarts: u32,
}
