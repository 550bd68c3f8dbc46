use crate::negotiation::{ConnectionStatus, Effect, NegotiationState, PeerState, Recovery};
use tracing::{debug, info, warn};

impl NegotiationState {
    pub(super) fn on_connection_state(&mut self, state: PeerState) -> Vec<Effect> {
        match state {
            PeerState::Connected => {
                self.recovery = Recovery::Idle;
                self.set_status(ConnectionStatus::Connected)
            }

            PeerState::Failed => match self.recovery {
                Recovery::Idle => {
                    info!("Connection failed, restarting ICE");
                    self.recovery = Recovery::Restarting;
                    self.stats.ice_restarts += 1;

                    let mut effects = self.set_status(ConnectionStatus::Failed {
                        reason: "connection lost".to_string(),
                        retrying: true,
                    });
                    effects.extend(self.start_offer(true));
                    effects
                }
                Recovery::Restarting => {
                    warn!("Connection failed again after an ICE restart");
                    self.fail("connection could not be restored")
                }
                Recovery::Exhausted => Vec::new(),
            },

            PeerState::Disconnected => {
                debug!("Connection interrupted, waiting for it to recover or fail");
                Vec::new()
            }

            PeerState::New | PeerState::Connecting | PeerState::Closed => Vec::new(),
        }
    }

    /// Terminal failure: report it and release everything.
    pub(super) fn fail(&mut self, reason: &str) -> Vec<Effect> {
        self.recovery = Recovery::Exhausted;
        self.closed = true;
        self.pending_candidates.clear();

        let mut effects = self.set_status(ConnectionStatus::Failed {
            reason: reason.to_string(),
            retrying: false,
        });
        effects.push(Effect::LeaveRoom);
        effects.push(Effect::ClosePeer);
        effects
    }
}
