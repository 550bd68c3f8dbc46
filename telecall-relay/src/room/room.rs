use crate::room::room_command::RoomCommand;
use crate::room::room_manager::RoomRegistry;
use crate::signaling::SignalingOutput;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use telecall_core::{ConnectionId, ParticipantIdentity, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Actor owning the membership of one room.
///
/// All joins, leaves and fan-outs for a room go through its command queue, so
/// membership needs no lock. Rooms run independently of each other.
pub struct Room {
    id: RoomId,
    members: HashMap<ConnectionId, ParticipantIdentity>,
    command_tx: mpsc::UnboundedSender<RoomCommand>,
    command_rx: mpsc::UnboundedReceiver<RoomCommand>,
    registry: RoomRegistry,
    signaling: Arc<dyn SignalingOutput>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        command_tx: mpsc::UnboundedSender<RoomCommand>,
        command_rx: mpsc::UnboundedReceiver<RoomCommand>,
        registry: RoomRegistry,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            id,
            members: HashMap::new(),
            command_tx,
            command_rx,
            registry,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.members.is_empty() && self.try_retire() {
                break;
            }
        }

        info!(room = %self.id, "Room event loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                participant,
            } => self.join(connection_id, participant).await,

            RoomCommand::Relay { from, message } => {
                if !self.members.contains_key(&from) {
                    warn!(
                        room = %self.id,
                        connection = %from,
                        "Dropping message from a connection outside the room"
                    );
                    return;
                }
                self.broadcast_except(from, message).await;
            }

            RoomCommand::Leave { connection_id } => {
                if let Some(participant) = self.members.remove(&connection_id) {
                    info!(
                        room = %self.id,
                        connection = %connection_id,
                        %participant,
                        "Participant left"
                    );
                }
            }

            RoomCommand::Snapshot { reply } => {
                let members = self
                    .members
                    .iter()
                    .map(|(id, participant)| (*id, participant.clone()))
                    .collect();
                let _ = reply.send(members);
            }
        }
    }

    async fn join(&mut self, connection_id: ConnectionId, participant: ParticipantIdentity) {
        if self.members.contains_key(&connection_id) {
            debug!(room = %self.id, connection = %connection_id, "Already a member");
            return;
        }

        // One seat per identity: a second connection with the same identity is
        // a reconnect and takes over the seat.
        let stale: Vec<ConnectionId> = self
            .members
            .iter()
            .filter(|(_, p)| **p == participant)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            info!(
                room = %self.id,
                connection = %id,
                %participant,
                "Superseded by a newer connection"
            );
            self.members.remove(&id);
            self.signaling
                .deliver(
                    id,
                    SignalMessage::Superseded {
                        room_id: self.id.clone(),
                    },
                )
                .await;
        }

        info!(room = %self.id, connection = %connection_id, %participant, "Participant joined");
        self.members.insert(connection_id, participant);

        self.broadcast_except(connection_id, SignalMessage::PeerJoined {})
            .await;
    }

    async fn broadcast_except(&self, from: ConnectionId, message: SignalMessage) {
        let targets: Vec<ConnectionId> = self
            .members
            .keys()
            .filter(|id| **id != from)
            .copied()
            .collect();

        for target in targets {
            self.signaling.deliver(target, message.clone()).await;
        }
    }

    /// Removes this room from the registry if nothing is queued for it.
    ///
    /// Senders only enqueue while holding the registry entry, so checking the
    /// queue under the same entry guard cannot miss a late join.
    fn try_retire(&self) -> bool {
        match self.registry.entry(self.id.clone()) {
            Entry::Occupied(entry) if entry.get().same_channel(&self.command_tx) => {
                if !self.command_rx.is_empty() {
                    return false;
                }
                entry.remove();
                debug!(room = %self.id, "Room is empty, retiring");
                true
            }
            _ => true,
        }
    }
}
