use async_trait::async_trait;
use telecall_core::{ConnectionId, SignalMessage};

/// Outbound side of the relay: how a room reaches its members' connections.
///
/// Delivery is fire-and-forget. A connection that is already gone simply
/// misses the message.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn deliver(&self, connection_id: ConnectionId, message: SignalMessage);
}
