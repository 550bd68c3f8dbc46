use crate::negotiation::{
    ConnectionStatus, Effect, NegotiationEvent, NegotiationState, NegotiationStats,
};
use crate::primitive::{PeerPrimitive, PrimitiveEvent, RemoteTrack};
use crate::transport::SignalingTransport;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use telecall_core::{RoomId, SignalMessage};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Serializes every event of one call: relay messages, primitive callbacks
/// and the hang-up request are handled one at a time, effects included.
pub(super) struct CallActor {
    pub(super) room_id: RoomId,
    pub(super) state: NegotiationState,
    pub(super) peer: Arc<dyn PeerPrimitive>,
    pub(super) peer_events: mpsc::UnboundedReceiver<PrimitiveEvent>,
    pub(super) peer_events_open: bool,
    pub(super) transport: Arc<dyn SignalingTransport>,
    pub(super) inbound: mpsc::UnboundedReceiver<SignalMessage>,
    pub(super) status_tx: watch::Sender<ConnectionStatus>,
    pub(super) stats_tx: watch::Sender<NegotiationStats>,
    pub(super) tracks_tx: mpsc::UnboundedSender<RemoteTrack>,
    pub(super) shutdown_rx: watch::Receiver<bool>,
}

impl CallActor {
    pub(super) async fn run(mut self) {
        info!(room = %self.room_id, role = ?self.state.role(), "Call event loop started");
        self.process(NegotiationEvent::Joined).await;

        while !self.state.is_closed() {
            let event = if self.teardown_requested() {
                NegotiationEvent::Teardown
            } else {
                tokio::select! {
                    biased;

                    // Also fires when the handle is dropped.
                    _ = self.shutdown_rx.changed() => NegotiationEvent::Teardown,

                    message = self.inbound.recv() => match message {
                        Some(message) => match self.translate(message) {
                            Some(event) => event,
                            None => continue,
                        },
                        None => NegotiationEvent::TransportLost(
                            "signaling channel closed".to_string(),
                        ),
                    },

                    event = self.peer_events.recv(), if self.peer_events_open => match event {
                        Some(PrimitiveEvent::Track(track)) => {
                            let _ = self.tracks_tx.send(track);
                            continue;
                        }
                        Some(PrimitiveEvent::NegotiationNeeded) => {
                            NegotiationEvent::NegotiationNeeded
                        }
                        Some(PrimitiveEvent::IceCandidate(candidate)) => {
                            NegotiationEvent::LocalCandidate(candidate)
                        }
                        Some(PrimitiveEvent::ConnectionState(state)) => {
                            NegotiationEvent::ConnectionStateChanged(state)
                        }
                        None => {
                            self.peer_events_open = false;
                            continue;
                        }
                    },
                }
            };

            self.process(event).await;
        }

        info!(room = %self.room_id, "Call event loop finished");
    }

    fn translate(&self, message: SignalMessage) -> Option<NegotiationEvent> {
        match message {
            SignalMessage::PeerJoined {} => Some(NegotiationEvent::PeerJoined),
            SignalMessage::Description {
                room_id,
                description,
            } if room_id == self.room_id => Some(NegotiationEvent::RemoteDescription(description)),
            SignalMessage::Candidate { room_id, candidate } if room_id == self.room_id => {
                Some(NegotiationEvent::RemoteCandidate(candidate))
            }
            SignalMessage::Superseded { room_id } if room_id == self.room_id => {
                Some(NegotiationEvent::Superseded)
            }
            other => {
                debug!(room = %self.room_id, ?other, "Ignoring signal");
                None
            }
        }
    }

    fn teardown_requested(&self) -> bool {
        hung_up(&self.shutdown_rx)
    }

    async fn process(&mut self, event: NegotiationEvent) {
        let view = self.peer.view().await;
        let effects = self.state.handle(event, view);
        self.execute(effects).await;
        self.stats_tx.send_replace(self.state.stats());
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);

        while let Some(effect) = queue.pop_front() {
            if (self.teardown_requested() || self.state.is_closed()) && !effect.survives_teardown()
            {
                debug!(?effect, "Call is ending, skipping");
                continue;
            }

            match effect {
                Effect::CreateOffer { ice_restart } => {
                    let sent = self.make_offer(ice_restart, &mut queue).await;
                    let view = self.peer.view().await;
                    let follow_up = self
                        .state
                        .handle(NegotiationEvent::OfferSettled { ice_restart, sent }, view);
                    prepend(&mut queue, follow_up);
                }

                Effect::Rollback => {
                    if let Err(e) = self.peer.rollback().await {
                        warn!(room = %self.room_id, "Rollback failed: {:#}", e);
                    }
                }

                Effect::ApplyRemoteDescription(description) => {
                    let peer = self.peer.clone();
                    let applied = cancellable(&mut self.shutdown_rx, async move {
                        peer.set_remote_description(description).await
                    })
                    .await;

                    if let Some(Err(e)) = applied {
                        warn!(room = %self.room_id, "Failed to apply remote description: {:#}", e);
                        queue.retain(|effect| !effect.depends_on_remote_description());
                    }
                }

                Effect::ApplyCandidate(candidate) => {
                    if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                        warn!(room = %self.room_id, "Failed to add candidate: {:#}", e);
                    }
                }

                Effect::TryCandidate(candidate) => {
                    if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                        debug!(room = %self.room_id, "Dropped candidate of an ignored offer: {:#}", e);
                    }
                }

                Effect::CreateAnswer => self.make_answer(&mut queue).await,

                Effect::SendCandidate(candidate) => {
                    let message = SignalMessage::Candidate {
                        room_id: self.room_id.clone(),
                        candidate,
                    };
                    self.send_signal(message, &mut queue).await;
                }

                Effect::ReportStatus(status) => {
                    info!(room = %self.room_id, %status, "Call status changed");
                    self.status_tx.send_replace(status);
                }

                Effect::LeaveRoom => {
                    let message = SignalMessage::LeaveRoom {
                        room_id: self.room_id.clone(),
                    };
                    if let Err(e) = self.transport.send(message).await {
                        debug!(room = %self.room_id, "Could not leave room: {}", e);
                    }
                }

                Effect::ClosePeer => {
                    if let Err(e) = self.peer.close().await {
                        warn!(room = %self.room_id, "Failed to close peer connection: {:#}", e);
                    }
                }
            }
        }
    }

    /// Returns whether the offer reached the transport.
    async fn make_offer(&mut self, ice_restart: bool, queue: &mut VecDeque<Effect>) -> bool {
        let peer = self.peer.clone();
        let created = cancellable(&mut self.shutdown_rx, async move {
            let offer = peer.create_offer(ice_restart).await?;
            peer.set_local_description(offer.clone()).await?;
            anyhow::Ok(offer)
        })
        .await;

        match created {
            Some(Ok(offer)) => {
                debug!(room = %self.room_id, ice_restart, "Sending offer");
                let message = SignalMessage::Description {
                    room_id: self.room_id.clone(),
                    description: offer,
                };
                self.send_signal(message, queue).await
            }
            Some(Err(e)) => {
                warn!(room = %self.room_id, "Failed to create offer: {:#}", e);
                false
            }
            None => {
                debug!(room = %self.room_id, "Offer abandoned by hang-up");
                false
            }
        }
    }

    async fn make_answer(&mut self, queue: &mut VecDeque<Effect>) {
        let peer = self.peer.clone();
        let created = cancellable(&mut self.shutdown_rx, async move {
            let answer = peer.create_answer().await?;
            peer.set_local_description(answer.clone()).await?;
            anyhow::Ok(answer)
        })
        .await;

        match created {
            Some(Ok(answer)) => {
                debug!(room = %self.room_id, "Sending answer");
                let message = SignalMessage::Description {
                    room_id: self.room_id.clone(),
                    description: answer,
                };
                self.send_signal(message, queue).await;
            }
            Some(Err(e)) => warn!(room = %self.room_id, "Failed to create answer: {:#}", e),
            None => debug!(room = %self.room_id, "Answer abandoned by hang-up"),
        }
    }

    /// A failed send means the relay is gone, which ends the call.
    async fn send_signal(
        &mut self,
        message: SignalMessage,
        queue: &mut VecDeque<Effect>,
    ) -> bool {
        match self.transport.send(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(room = %self.room_id, "Signaling send failed: {}", e);
                let view = self.peer.view().await;
                let follow_up = self
                    .state
                    .handle(NegotiationEvent::TransportLost(e.to_string()), view);
                prepend(queue, follow_up);
                false
            }
        }
    }
}

fn prepend(queue: &mut VecDeque<Effect>, effects: Vec<Effect>) {
    for effect in effects.into_iter().rev() {
        queue.push_front(effect);
    }
}

/// A dropped handle counts as a hang-up.
fn hung_up(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Runs `work` unless a hang-up arrives first.
async fn cancellable<F: Future>(
    shutdown: &mut watch::Receiver<bool>,
    work: F,
) -> Option<F::Output> {
    if hung_up(shutdown) {
        return None;
    }
    tokio::select! {
        biased;
        _ = shutdown.changed() => None,
        output = work => Some(output),
    }
}
