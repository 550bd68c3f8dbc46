use crate::negotiation::{Effect, NegotiationState, PrimitiveView};
use telecall_core::IceCandidate;
use tracing::trace;

impl NegotiationState {
    pub(super) fn on_remote_candidate(
        &mut self,
        candidate: Option<IceCandidate>,
        view: PrimitiveView,
    ) -> Vec<Effect> {
        let Some(candidate) = candidate.filter(|c| !c.is_end_of_candidates()) else {
            trace!("End of remote candidates");
            return Vec::new();
        };

        // Candidates arriving while an offer is ignored belong to that offer.
        let stray = self.ignore_offer;
        if view.has_remote_description && self.pending_candidates.is_empty() {
            return vec![candidate_effect(candidate, stray)];
        }

        trace!(
            queued = self.pending_candidates.len() + 1,
            stray,
            "No remote description yet, buffering candidate"
        );
        self.pending_candidates.push_back((candidate, stray));
        Vec::new()
    }

    pub(super) fn drain_candidates(&mut self) -> impl Iterator<Item = Effect> + '_ {
        self.pending_candidates
            .drain(..)
            .map(|(candidate, stray)| candidate_effect(candidate, stray))
    }
}

fn candidate_effect(candidate: IceCandidate, stray: bool) -> Effect {
    if stray {
        Effect::TryCandidate(candidate)
    } else {
        Effect::ApplyCandidate(candidate)
    }
}
