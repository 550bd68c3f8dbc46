use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use telecall_core::{ConnectionId, ParticipantIdentity, RoomId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

pub(crate) type RoomRegistry = Arc<DashMap<RoomId, mpsc::UnboundedSender<RoomCommand>>>;

/// Routes commands to room actors, spawning a room on its first join.
#[derive(Clone)]
pub struct RoomManager {
    rooms: RoomRegistry,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
        }
    }

    /// Hands `cmd` to the room's actor.
    ///
    /// The send happens under the registry entry, which is what lets an empty
    /// room retire itself without losing a concurrent join.
    pub fn dispatch(&self, room_id: &RoomId, cmd: RoomCommand) {
        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut entry) => {
                let Err(mpsc::error::SendError(cmd)) = entry.get().send(cmd) else {
                    return;
                };
                if cmd.creates_room() {
                    let tx = self.spawn_room(room_id.clone());
                    let _ = tx.send(cmd);
                    entry.insert(tx);
                } else {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if !cmd.creates_room() {
                    debug!(room = %room_id, "Dropping command for unknown room");
                    return;
                }
                let tx = self.spawn_room(room_id.clone());
                let _ = tx.send(cmd);
                entry.insert(tx);
            }
        }
    }

    pub fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        participant: ParticipantIdentity,
    ) {
        self.dispatch(
            room_id,
            RoomCommand::Join {
                connection_id,
                participant,
            },
        );
    }

    pub fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) {
        self.dispatch(room_id, RoomCommand::Leave { connection_id });
    }

    /// Current members of a room; empty for rooms that do not exist.
    pub async fn members(&self, room_id: &RoomId) -> Vec<(ConnectionId, ParticipantIdentity)> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(room_id, RoomCommand::Snapshot { reply });
        rx.await.unwrap_or_default()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn spawn_room(&self, room_id: RoomId) -> mpsc::UnboundedSender<RoomCommand> {
        info!(room = %room_id, "Creating new room");
        let (tx, rx) = mpsc::unbounded_channel();

        let room = Room::new(
            room_id,
            tx.clone(),
            rx,
            self.rooms.clone(),
            self.signaling.clone(),
        );
        tokio::spawn(room.run());

        tx
    }
}
