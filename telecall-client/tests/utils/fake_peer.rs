use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use telecall_client::media::MediaKind;
use telecall_client::{
    LocalMedia, PeerPrimitive, PeerState, PrimitiveEvent, RemoteTrack, SignalingPhase,
};
use telecall_core::{DescriptionKind, IceCandidate, SessionDescription};
use tokio::sync::mpsc;

struct FakeState {
    signaling: SignalingPhase,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    /// Local description to return to on rollback.
    stable_local: Option<SessionDescription>,
    tracks: usize,
    ice_generation: u32,
    reported_session: Option<(String, String)>,
    connectivity: bool,
    remote_track_announced: bool,
    applied_candidates: Vec<IceCandidate>,
    log: Vec<String>,
    closed: bool,
}

/// In-memory peer connection following the browser's signaling state rules.
///
/// Descriptions are derived from the peer's content rather than a counter, so
/// re-offering unchanged media produces the same description. A negotiation
/// that ends in `stable` reports `connected` once per distinct description
/// pair, or `failed` while connectivity is switched off.
pub struct FakePeer {
    name: String,
    auto_negotiate: bool,
    stall_offers: bool,
    events: mpsc::UnboundedSender<PrimitiveEvent>,
    state: Mutex<FakeState>,
}

pub struct FakePeerBuilder {
    name: String,
    auto_negotiate: bool,
    stall_offers: bool,
}

impl FakePeerBuilder {
    /// Attaching media will not fire negotiation-needed.
    pub fn without_auto_negotiation(mut self) -> Self {
        self.auto_negotiate = false;
        self
    }

    /// Offer creation never completes.
    pub fn stalling_offers(mut self) -> Self {
        self.stall_offers = true;
        self
    }

    pub fn build(self) -> (Arc<FakePeer>, mpsc::UnboundedReceiver<PrimitiveEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let peer = FakePeer {
            name: self.name,
            auto_negotiate: self.auto_negotiate,
            stall_offers: self.stall_offers,
            events,
            state: Mutex::new(FakeState {
                signaling: SignalingPhase::Stable,
                local: None,
                remote: None,
                stable_local: None,
                tracks: 0,
                ice_generation: 0,
                reported_session: None,
                connectivity: true,
                remote_track_announced: false,
                applied_candidates: Vec::new(),
                log: Vec::new(),
                closed: false,
            }),
        };
        (Arc::new(peer), events_rx)
    }
}

impl FakePeer {
    pub fn builder(name: &str) -> FakePeerBuilder {
        FakePeerBuilder {
            name: name.to_string(),
            auto_negotiate: true,
            stall_offers: false,
        }
    }

    pub fn new(name: &str) -> (Arc<FakePeer>, mpsc::UnboundedReceiver<PrimitiveEvent>) {
        Self::builder(name).build()
    }

    /// Injects a primitive callback as if the connection produced it.
    pub fn emit(&self, event: PrimitiveEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_connectivity(&self, ok: bool) {
        self.lock().connectivity = ok;
    }

    pub fn phase(&self) -> SignalingPhase {
        self.lock().signaling
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.lock().local.clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.lock().remote.clone()
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.lock().applied_candidates.clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.lock().log.iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn emit_local_candidate(&self, state: &FakeState) {
        let candidate = IceCandidate {
            candidate: format!(
                "candidate:{} 1 udp 2122260223 127.0.0.1 {} typ host",
                self.name,
                40000 + state.ice_generation
            ),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
            username_fragment: Some(format!("{}-{}", self.name, state.ice_generation)),
        };
        self.emit(PrimitiveEvent::IceCandidate(Some(candidate)));
    }

    fn settle(&self, state: &mut FakeState) {
        if state.signaling != SignalingPhase::Stable {
            return;
        }
        let (Some(local), Some(remote)) = (&state.local, &state.remote) else {
            return;
        };

        let session = (local.sdp.clone(), remote.sdp.clone());
        if state.reported_session.as_ref() == Some(&session) {
            return;
        }
        state.reported_session = Some(session);

        let outcome = if state.connectivity {
            PeerState::Connected
        } else {
            PeerState::Failed
        };
        self.emit(PrimitiveEvent::ConnectionState(outcome));
    }
}

#[async_trait]
impl PeerPrimitive for FakePeer {
    fn signaling_phase(&self) -> SignalingPhase {
        self.phase()
    }

    async fn has_remote_description(&self) -> bool {
        self.lock().remote.is_some()
    }

    async fn add_local_media(&self, media: LocalMedia) -> Result<()> {
        {
            let mut state = self.lock();
            state.tracks += media.len();
            state.log.push("add_local_media".to_string());
        }
        if self.auto_negotiate {
            self.emit(PrimitiveEvent::NegotiationNeeded);
        }
        Ok(())
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription> {
        if self.stall_offers {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        if state.closed {
            bail!("{} is closed", self.name);
        }
        if ice_restart {
            state.ice_generation += 1;
        }
        state.log.push(format!("create_offer restart={ice_restart}"));

        Ok(SessionDescription::offer(format!(
            "offer from {} tracks={} ice={}",
            self.name, state.tracks, state.ice_generation
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let mut state = self.lock();
        let Some(remote) = state.remote.clone() else {
            bail!("{} has no remote offer", self.name);
        };
        if state.signaling != SignalingPhase::HaveRemoteOffer {
            bail!("{} cannot answer in {:?}", self.name, state.signaling);
        }
        state.log.push("create_answer".to_string());

        Ok(SessionDescription::answer(format!(
            "answer from {} tracks={} to [{}]",
            self.name, state.tracks, remote.sdp
        )))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let mut state = self.lock();
        match (description.kind, state.signaling) {
            (DescriptionKind::Offer, SignalingPhase::Stable | SignalingPhase::HaveLocalOffer) => {
                state.signaling = SignalingPhase::HaveLocalOffer;
                state.local = Some(description);
                state.log.push("set_local offer".to_string());
            }
            (DescriptionKind::Answer, SignalingPhase::HaveRemoteOffer) => {
                state.signaling = SignalingPhase::Stable;
                state.local = Some(description);
                state.stable_local = state.local.clone();
                state.log.push("set_local answer".to_string());
            }
            (kind, phase) => bail!("{}: cannot apply local {:?} in {:?}", self.name, kind, phase),
        }

        self.emit_local_candidate(&state);
        self.settle(&mut state);
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let mut state = self.lock();
        match (description.kind, state.signaling) {
            (DescriptionKind::Offer, SignalingPhase::Stable | SignalingPhase::HaveRemoteOffer) => {
                state.signaling = SignalingPhase::HaveRemoteOffer;
                state.remote = Some(description);
                state.log.push("set_remote offer".to_string());
            }
            (DescriptionKind::Answer, SignalingPhase::HaveLocalOffer) => {
                state.signaling = SignalingPhase::Stable;
                state.remote = Some(description);
                state.stable_local = state.local.clone();
                state.log.push("set_remote answer".to_string());
            }
            (kind, phase) => bail!("{}: cannot apply remote {:?} in {:?}", self.name, kind, phase),
        }

        if !state.remote_track_announced {
            state.remote_track_announced = true;
            self.emit(PrimitiveEvent::Track(RemoteTrack {
                id: "remote-audio".to_string(),
                stream_id: "remote".to_string(),
                kind: MediaKind::Audio,
                handle: None,
            }));
        }
        self.settle(&mut state);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.lock();
        if state.signaling != SignalingPhase::HaveLocalOffer {
            bail!("{}: nothing to roll back in {:?}", self.name, state.signaling);
        }
        state.signaling = SignalingPhase::Stable;
        state.local = state.stable_local.clone();
        state.log.push("rollback".to_string());
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let mut state = self.lock();
        if state.remote.is_none() {
            bail!("{}: candidate before remote description", self.name);
        }
        state.log.push(format!("add_candidate {}", candidate.candidate));
        state.applied_candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.signaling = SignalingPhase::Closed;
            state.log.push("close".to_string());
        }
        Ok(())
    }
}
