use crate::negotiation::{Effect, NegotiationState, PrimitiveView, Role, SignalingPhase};
use tracing::{debug, warn};

impl NegotiationState {
    pub(super) fn on_negotiation_needed(&mut self, view: PrimitiveView) -> Vec<Effect> {
        if self.making_offer || view.signaling != SignalingPhase::Stable {
            debug!(phase = ?view.signaling, "Negotiation needed mid-exchange, deferring offer");
            self.offer_deferred = true;
            return Vec::new();
        }
        self.start_offer(false)
    }

    /// The caller (re)offers when someone arrives, since an offer sent into an
    /// empty room was never delivered.
    pub(super) fn on_peer_joined(&mut self) -> Vec<Effect> {
        match self.role {
            Role::Impolite => {
                self.offer_deferred = false;
                self.start_offer(false)
            }
            Role::Polite => {
                debug!("Peer joined, waiting for its offer");
                Vec::new()
            }
        }
    }

    pub(super) fn on_offer_settled(&mut self, ice_restart: bool, sent: bool) -> Vec<Effect> {
        self.making_offer = false;
        if sent {
            return Vec::new();
        }

        warn!(ice_restart, "Offer was not sent");
        if ice_restart {
            return self.fail("connectivity restart could not be started");
        }
        Vec::new()
    }
}
