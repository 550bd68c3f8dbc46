use crate::negotiation::{Effect, NegotiationState, PrimitiveView, Role, SignalingPhase};
use telecall_core::{DescriptionKind, SessionDescription};
use tracing::{debug, warn};

impl NegotiationState {
    pub(super) fn on_remote_description(
        &mut self,
        description: SessionDescription,
        view: PrimitiveView,
    ) -> Vec<Effect> {
        match description.kind {
            DescriptionKind::Rollback => {
                warn!("Remote side sent a rollback, ignoring");
                return Vec::new();
            }
            // The offer this answers was rolled back or superseded.
            DescriptionKind::Answer if view.signaling != SignalingPhase::HaveLocalOffer => {
                debug!(phase = ?view.signaling, "Dropping stale answer");
                self.stats.stale_answers += 1;
                return Vec::new();
            }
            DescriptionKind::Answer | DescriptionKind::Offer => {}
        }

        let is_offer = description.is_offer();
        let offer_collision =
            is_offer && (self.making_offer || view.signaling != SignalingPhase::Stable);

        self.ignore_offer = self.role == Role::Impolite && offer_collision;
        if self.ignore_offer {
            debug!("Offer collision, keeping our own offer");
            self.stats.offers_ignored += 1;
            return Vec::new();
        }

        let mut effects = Vec::new();
        if offer_collision && view.signaling == SignalingPhase::HaveLocalOffer {
            debug!("Offer collision, rolling back our own offer");
            self.stats.rollbacks += 1;
            effects.push(Effect::Rollback);
        }

        effects.push(Effect::ApplyRemoteDescription(description));
        effects.extend(self.drain_candidates());

        if is_offer {
            effects.push(Effect::CreateAnswer);
        }

        // Both branches above end in a stable phase.
        if self.offer_deferred {
            self.offer_deferred = false;
            effects.extend(self.start_offer(false));
        }

        effects
    }
}
