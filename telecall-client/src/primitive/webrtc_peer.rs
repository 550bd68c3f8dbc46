use crate::config::CallConfig;
use crate::media::{LocalMedia, LocalTrack, MediaKind};
use crate::negotiation::{PeerState, SignalingPhase};
use crate::primitive::{PeerPrimitive, PrimitiveEvent, RemoteTrack};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use telecall_core::{DescriptionKind, IceCandidate, IceServerConfig, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use webrtc::api::{API, APIBuilder};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Callback target of one peer connection generation. Events from a
/// connection that has been replaced are dropped.
#[derive(Clone)]
struct EventSink {
    tx: mpsc::UnboundedSender<PrimitiveEvent>,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl EventSink {
    fn send(&self, event: PrimitiveEvent) {
        if self.current.load(Ordering::SeqCst) != self.generation {
            trace!(
                generation = self.generation,
                ?event,
                "Dropping event of a replaced connection"
            );
            return;
        }
        let _ = self.tx.send(event);
    }
}

/// [`PeerPrimitive`] backed by a webrtc-rs `RTCPeerConnection`.
///
/// webrtc-rs refuses a local rollback out of `have-local-offer`, so
/// [`PeerPrimitive::rollback`] swaps in a fresh connection carrying the same
/// local tracks. The replacement starts in `stable` with no descriptions.
pub struct WebrtcPeer {
    api: API,
    rtc_config: RTCConfiguration,
    events: mpsc::UnboundedSender<PrimitiveEvent>,
    generation: Arc<AtomicU64>,
    peer_connection: RwLock<Arc<RTCPeerConnection>>,
    local_tracks: Mutex<Vec<LocalTrack>>,
}

impl WebrtcPeer {
    /// Builds the peer connection and wires its callbacks into the returned
    /// event channel.
    pub async fn new(
        config: &CallConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PrimitiveEvent>)> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let sink = EventSink {
            tx: event_tx.clone(),
            generation: 0,
            current: generation.clone(),
        };
        let peer_connection = open_connection(&api, &rtc_config, sink).await?;

        let peer = Self {
            api,
            rtc_config,
            events: event_tx,
            generation,
            peer_connection: RwLock::new(peer_connection),
            local_tracks: Mutex::new(Vec::new()),
        };
        Ok((peer, event_rx))
    }

    pub async fn local_description(&self) -> Option<SessionDescription> {
        let description = self.current().local_description().await?;
        from_rtc_description(description).ok()
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        let description = self.current().remote_description().await?;
        from_rtc_description(description).ok()
    }

    fn current(&self) -> Arc<RTCPeerConnection> {
        self.peer_connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, fresh: Arc<RTCPeerConnection>) -> Arc<RTCPeerConnection> {
        let mut current = self
            .peer_connection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, fresh)
    }

    fn local_tracks(&self) -> Vec<LocalTrack> {
        self.local_tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn open_connection(
    api: &API,
    rtc_config: &RTCConfiguration,
    sink: EventSink,
) -> Result<Arc<RTCPeerConnection>> {
    let peer_connection = Arc::new(
        api.new_peer_connection(rtc_config.clone())
            .await
            .context("Failed to create peer connection")?,
    );

    let negotiation_sink = sink.clone();
    peer_connection.on_negotiation_needed(Box::new(move || {
        let sink = negotiation_sink.clone();
        Box::pin(async move {
            debug!(generation = sink.generation, "Negotiation needed");
            sink.send(PrimitiveEvent::NegotiationNeeded);
        })
    }));

    let ice_sink = sink.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let sink = ice_sink.clone();
        Box::pin(async move {
            let candidate = match c {
                Some(candidate) => match candidate.to_json() {
                    Ok(init) => Some(from_rtc_candidate(init)),
                    Err(e) => {
                        debug!("Failed to serialize local candidate: {}", e);
                        return;
                    }
                },
                None => None,
            };
            trace!(?candidate, "Local candidate");
            sink.send(PrimitiveEvent::IceCandidate(candidate));
        })
    }));

    let state_sink = sink.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let sink = state_sink.clone();
            Box::pin(async move {
                info!(generation = sink.generation, "Peer connection state changed: {}", s);
                let state = match s {
                    RTCPeerConnectionState::New => PeerState::New,
                    RTCPeerConnectionState::Connecting => PeerState::Connecting,
                    RTCPeerConnectionState::Connected => PeerState::Connected,
                    RTCPeerConnectionState::Disconnected => PeerState::Disconnected,
                    RTCPeerConnectionState::Failed => PeerState::Failed,
                    RTCPeerConnectionState::Closed => PeerState::Closed,
                    RTCPeerConnectionState::Unspecified => return,
                };
                sink.send(PrimitiveEvent::ConnectionState(state));
            })
        },
    ));

    let track_sink = sink;
    peer_connection.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let sink = track_sink.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => MediaKind::Audio,
                    RTPCodecType::Video => MediaKind::Video,
                    RTPCodecType::Unspecified => return,
                };
                info!(id = %track.id(), ?kind, "Remote track arrived");
                sink.send(PrimitiveEvent::Track(RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind,
                    handle: Some(track),
                }));
            })
        },
    ));

    Ok(peer_connection)
}

async fn attach_tracks(
    peer_connection: &RTCPeerConnection,
    tracks: Vec<LocalTrack>,
) -> Result<()> {
    for local in tracks {
        let sender = peer_connection
            .add_track(local.track as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .with_context(|| format!("Failed to add {:?} track", local.kind))?;

        // RTCP has to be read for the interceptors to do their work.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });
    }
    Ok(())
}

#[async_trait]
impl PeerPrimitive for WebrtcPeer {
    fn signaling_phase(&self) -> SignalingPhase {
        match self.current().signaling_state() {
            RTCSignalingState::Stable => SignalingPhase::Stable,
            RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveLocalPranswer => {
                SignalingPhase::HaveLocalOffer
            }
            RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveRemotePranswer => {
                SignalingPhase::HaveRemoteOffer
            }
            RTCSignalingState::Closed | RTCSignalingState::Unspecified => SignalingPhase::Closed,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.current().remote_description().await.is_some()
    }

    async fn add_local_media(&self, media: LocalMedia) -> Result<()> {
        self.local_tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(media.tracks.iter().cloned());
        attach_tracks(&self.current(), media.tracks).await
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription> {
        let offer = self
            .current()
            .create_offer(Some(RTCOfferOptions {
                ice_restart,
                ..Default::default()
            }))
            .await
            .context("Failed to create offer")?;
        from_rtc_description(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .current()
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        from_rtc_description(answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.current()
            .set_local_description(to_rtc_description(description)?)
            .await
            .context("Failed to apply local description")
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.current()
            .set_remote_description(to_rtc_description(description)?)
            .await
            .context("Failed to apply remote description")
    }

    async fn rollback(&self) -> Result<()> {
        let phase = self.signaling_phase();
        if phase != SignalingPhase::HaveLocalOffer {
            bail!("No local offer to roll back in {:?}", phase);
        }

        // Events of the replacement are dropped until it is installed.
        let generation = self.generation.load(Ordering::SeqCst) + 1;
        let sink = EventSink {
            tx: self.events.clone(),
            generation,
            current: self.generation.clone(),
        };
        let fresh = open_connection(&self.api, &self.rtc_config, sink).await?;
        attach_tracks(&fresh, self.local_tracks()).await?;

        self.generation.store(generation, Ordering::SeqCst);
        let stale = self.replace(fresh);
        if let Err(e) = stale.close().await {
            debug!("Failed to close replaced peer connection: {}", e);
        }

        info!(generation, "Local offer rolled back onto a fresh peer connection");
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.current()
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                username_fragment: candidate.username_fragment,
            })
            .await
            .context("Failed to add remote candidate")
    }

    async fn close(&self) -> Result<()> {
        self.current().close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_description(description: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match description.kind {
        DescriptionKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        DescriptionKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        DescriptionKind::Rollback => bail!("Rollback is not a description to apply"),
    };
    Ok(rtc)
}

fn from_rtc_description(description: RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match description.sdp_type {
        RTCSdpType::Offer => DescriptionKind::Offer,
        RTCSdpType::Answer | RTCSdpType::Pranswer => DescriptionKind::Answer,
        RTCSdpType::Rollback => DescriptionKind::Rollback,
        RTCSdpType::Unspecified => bail!("Description has no type"),
    };
    Ok(SessionDescription {
        kind,
        sdp: description.sdp,
    })
}
