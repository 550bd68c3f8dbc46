use crate::negotiation::{ConnectionStatus, NegotiationStats, Role};
use crate::primitive::RemoteTrack;
use telecall_core::RoomId;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// The UI's grip on a running call.
///
/// Dropping the handle ends the call the same way [`CallHandle::hang_up`]
/// does, without waiting for it.
pub struct CallHandle {
    room_id: RoomId,
    role: Role,
    status_rx: watch::Receiver<ConnectionStatus>,
    stats_rx: watch::Receiver<NegotiationStats>,
    tracks_rx: Option<mpsc::UnboundedReceiver<RemoteTrack>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CallHandle {
    pub(crate) fn new(
        room_id: RoomId,
        role: Role,
        status_rx: watch::Receiver<ConnectionStatus>,
        stats_rx: watch::Receiver<NegotiationStats>,
        tracks_rx: mpsc::UnboundedReceiver<RemoteTrack>,
        shutdown_tx: watch::Sender<bool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            room_id,
            role,
            status_rx,
            stats_rx,
            tracks_rx: Some(tracks_rx),
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Status updates; the current value is readable right away.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    pub fn stats(&self) -> NegotiationStats {
        *self.stats_rx.borrow()
    }

    pub fn is_active(&self) -> bool {
        !self.status_rx.borrow().is_terminal()
    }

    /// Remote media as it arrives. Only the first caller gets the stream.
    pub fn remote_tracks(&mut self) -> Option<mpsc::UnboundedReceiver<RemoteTrack>> {
        self.tracks_rx.take()
    }

    /// Ends the call and waits until the peer connection is closed and the
    /// room is left. Calling it again is a no-op.
    pub async fn hang_up(&self) {
        self.shutdown_tx.send_replace(true);

        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        if let Err(e) = task.await {
            debug!(room = %self.room_id, "Call task ended abnormally: {}", e);
        }
    }
}
