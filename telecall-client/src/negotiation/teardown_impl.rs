use crate::negotiation::{ConnectionStatus, Effect, NegotiationState};
use tracing::warn;

const SUPERSEDED_REASON: &str = "joined from another connection";

impl NegotiationState {
    pub(super) fn on_teardown(&mut self) -> Vec<Effect> {
        self.closed = true;
        self.making_offer = false;
        self.pending_candidates.clear();

        let mut effects = vec![Effect::ClosePeer, Effect::LeaveRoom];
        effects.extend(self.set_status(ConnectionStatus::Disconnected));
        effects
    }

    /// The signaling channel is gone, so there is nobody to say goodbye to.
    pub(super) fn on_transport_lost(&mut self, reason: String) -> Vec<Effect> {
        warn!(%reason, "Signaling channel lost");
        self.abandon(reason)
    }

    /// The room already dropped this connection, so there is no seat to leave.
    pub(super) fn on_superseded(&mut self) -> Vec<Effect> {
        warn!("Seat taken over by another connection");
        self.abandon(SUPERSEDED_REASON.to_string())
    }

    fn abandon(&mut self, reason: String) -> Vec<Effect> {
        self.closed = true;
        self.making_offer = false;
        self.pending_candidates.clear();

        let mut effects = self.set_status(ConnectionStatus::Failed {
            reason,
            retrying: false,
        });
        effects.push(Effect::ClosePeer);
        effects
    }
}
