mod ws_transport;

pub use ws_transport::{WsConnection, WsTransport};

use crate::error::TransportError;
use async_trait::async_trait;
use telecall_core::SignalMessage;

/// Outbound half of the signaling channel. The inbound half is an ordered
/// `mpsc` stream handed out next to the transport.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn send(&self, message: SignalMessage) -> Result<(), TransportError>;
}
