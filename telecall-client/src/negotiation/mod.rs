//! Perfect negotiation as a pure state machine.
//!
//! [`NegotiationState::handle`] takes one event plus a snapshot of the
//! primitive and returns the effects to run, in order. It never touches the
//! primitive or the transport itself, which keeps collision handling testable
//! without a network.

mod candidate_impl;
mod connection_state_impl;
mod description_impl;
mod event;
mod offer_impl;
mod status;
mod teardown_impl;


pub use event::{Effect, NegotiationEvent};
pub use status::{ConnectionStatus, NegotiationStats, PeerState, PrimitiveView, SignalingPhase};

use std::collections::VecDeque;
use telecall_core::IceCandidate;
use tracing::trace;

/// Which side yields when both sides offer at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Rolls back its own offer and accepts the remote one.
    Polite,
    /// Keeps its own offer and drops the remote one.
    Impolite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Idle,
    Restarting,
    Exhausted,
}

#[derive(Debug)]
pub struct NegotiationState {
    role: Role,
    making_offer: bool,
    ignore_offer: bool,
    offer_deferred: bool,
    /// Buffered remote candidates, flagged when they arrived during an
    /// ignored offer.
    pending_candidates: VecDeque<(IceCandidate, bool)>,
    status: ConnectionStatus,
    recovery: Recovery,
    stats: NegotiationStats,
    closed: bool,
}

impl NegotiationState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            making_offer: false,
            ignore_offer: false,
            offer_deferred: false,
            pending_candidates: VecDeque::new(),
            status: ConnectionStatus::Connecting,
            recovery: Recovery::Idle,
            stats: NegotiationStats::default(),
            closed: false,
        }
    }

    pub fn handle(&mut self, event: NegotiationEvent, view: PrimitiveView) -> Vec<Effect> {
        if self.closed {
            trace!(?event, "Call already closed, ignoring event");
            return Vec::new();
        }

        match event {
            NegotiationEvent::Joined => self.set_status(ConnectionStatus::WaitingForPeer),
            NegotiationEvent::NegotiationNeeded => self.on_negotiation_needed(view),
            NegotiationEvent::PeerJoined => self.on_peer_joined(),
            NegotiationEvent::OfferSettled { ice_restart, sent } => {
                self.on_offer_settled(ice_restart, sent)
            }
            NegotiationEvent::RemoteDescription(description) => {
                self.on_remote_description(description, view)
            }
            NegotiationEvent::RemoteCandidate(candidate) => {
                self.on_remote_candidate(candidate, view)
            }
            NegotiationEvent::LocalCandidate(candidate) => vec![Effect::SendCandidate(candidate)],
            NegotiationEvent::ConnectionStateChanged(state) => self.on_connection_state(state),
            NegotiationEvent::TransportLost(reason) => self.on_transport_lost(reason),
            NegotiationEvent::Superseded => self.on_superseded(),
            NegotiationEvent::Teardown => self.on_teardown(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn making_offer(&self) -> bool {
        self.making_offer
    }

    /// Whether the last incoming offer was dropped to resolve a collision.
    pub fn ignore_offer(&self) -> bool {
        self.ignore_offer
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn stats(&self) -> NegotiationStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn set_status(&mut self, status: ConnectionStatus) -> Vec<Effect> {
        if self.status == status {
            return Vec::new();
        }
        self.status = status.clone();
        vec![Effect::ReportStatus(status)]
    }

    fn start_offer(&mut self, ice_restart: bool) -> Vec<Effect> {
        self.making_offer = true;
        self.stats.offers_created += 1;
        vec![Effect::CreateOffer { ice_restart }]
    }
}
