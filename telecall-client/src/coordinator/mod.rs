mod call_actor;
mod handle;

pub use handle::CallHandle;

use crate::config::CallConfig;
use crate::error::CallError;
use crate::media::MediaSource;
use crate::negotiation::{ConnectionStatus, NegotiationState, NegotiationStats};
use crate::primitive::{PeerPrimitive, PrimitiveEvent, WebrtcPeer};
use crate::role::RoleResolver;
use crate::transport::{SignalingTransport, WsTransport};
use call_actor::CallActor;
use std::sync::Arc;
use telecall_core::{ParticipantIdentity, RoomId, SignalMessage};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// The collaborators a call runs on, each with its ordered event stream.
pub struct CallParts {
    pub peer: Arc<dyn PeerPrimitive>,
    pub peer_events: mpsc::UnboundedReceiver<PrimitiveEvent>,
    pub transport: Arc<dyn SignalingTransport>,
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

/// Starts negotiating a call in `room_id` as `identity`.
///
/// The role is resolved and local media acquired before anything reaches the
/// relay, so those failures leave no trace in the room.
pub async fn start_call(
    room_id: RoomId,
    identity: ParticipantIdentity,
    resolver: &dyn RoleResolver,
    media: &dyn MediaSource,
    parts: CallParts,
) -> Result<CallHandle, CallError> {
    let CallParts {
        peer,
        peer_events,
        transport,
        inbound,
    } = parts;

    let role = match resolver.resolve_role(&identity, &room_id) {
        Ok(role) => role,
        Err(e) => {
            release(peer.as_ref()).await;
            return Err(e.into());
        }
    };

    let local_media = match media.acquire().await {
        Ok(local_media) => local_media,
        Err(e) => {
            release(peer.as_ref()).await;
            return Err(CallError::MediaUnavailable(format!("{e:#}")));
        }
    };

    info!(room = %room_id, participant = %identity, ?role, "Joining room");
    let join = SignalMessage::JoinRoom {
        room_id: room_id.clone(),
        participant_identity: identity,
    };
    if let Err(e) = transport.send(join).await {
        release(peer.as_ref()).await;
        return Err(e.into());
    }

    if let Err(e) = peer.add_local_media(local_media).await {
        let _ = transport
            .send(SignalMessage::LeaveRoom {
                room_id: room_id.clone(),
            })
            .await;
        release(peer.as_ref()).await;
        return Err(CallError::Primitive(e));
    }

    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
    let (stats_tx, stats_rx) = watch::channel(NegotiationStats::default());
    let (tracks_tx, tracks_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let actor = CallActor {
        room_id: room_id.clone(),
        state: NegotiationState::new(role),
        peer,
        peer_events,
        peer_events_open: true,
        transport,
        inbound,
        status_tx,
        stats_tx,
        tracks_tx,
        shutdown_rx,
    };
    let task = tokio::spawn(actor.run());

    Ok(CallHandle::new(
        room_id,
        role,
        status_rx,
        stats_rx,
        tracks_rx,
        shutdown_tx,
        task,
    ))
}

/// Connects to the relay in `config` and starts a call on a webrtc-rs peer
/// connection.
pub async fn connect_call(
    config: CallConfig,
    room_id: RoomId,
    identity: ParticipantIdentity,
    resolver: &dyn RoleResolver,
    media: &dyn MediaSource,
) -> Result<CallHandle, CallError> {
    resolver.resolve_role(&identity, &room_id)?;

    let connection = WsTransport::connect(&config.relay_url).await?;

    let mut config = config;
    if !connection.ice_servers.is_empty() {
        config.ice_servers = connection.ice_servers;
    }
    let (peer, peer_events) = WebrtcPeer::new(&config)
        .await
        .map_err(CallError::Primitive)?;

    start_call(
        room_id,
        identity,
        resolver,
        media,
        CallParts {
            peer: Arc::new(peer),
            peer_events,
            transport: Arc::new(connection.transport),
            inbound: connection.inbound,
        },
    )
    .await
}

async fn release(peer: &dyn PeerPrimitive) {
    if let Err(e) = peer.close().await {
        warn!("Failed to close peer connection: {:#}", e);
    }
}
