use crate::error::TransportError;
use crate::transport::SignalingTransport;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use telecall_core::{ConnectionId, IceServerConfig, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Relay connection over a WebSocket.
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<String>,
}

/// Everything [`WsTransport::connect`] learns from the relay.
pub struct WsConnection {
    pub transport: WsTransport,
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
    pub connection_id: ConnectionId,
    pub ice_servers: Vec<IceServerConfig>,
}

impl WsTransport {
    /// Connects and waits for the relay's `welcome`.
    pub async fn connect(url: &str) -> Result<WsConnection, TransportError> {
        debug!(%url, "Connecting to relay");
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut write, mut read) = socket.split();

        let (connection_id, ice_servers) = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<SignalMessage>(text.as_str()) {
                        Ok(SignalMessage::Welcome {
                            connection_id,
                            ice_servers,
                        }) => break (connection_id, ice_servers),
                        Ok(other) => warn!(?other, "Expected welcome, skipping"),
                        Err(e) => {
                            return Err(TransportError::Connect(format!("invalid welcome: {e}")));
                        }
                    }
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Connect(e.to_string())),
                None => return Err(TransportError::Closed),
            }
        };
        info!(connection = %connection_id, "Connected to relay");

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(json) = outbound_rx.recv().await {
                if write.send(Message::text(json)).await.is_err() {
                    debug!("Relay socket closed while sending");
                    return;
                }
            }
            let _ = write.send(Message::Close(None)).await;
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(message) => {
                                if inbound_tx.send(message).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid SignalMessage: {:?}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Relay socket error: {}", e);
                        break;
                    }
                }
            }
            debug!("Relay connection closed");
        });

        Ok(WsConnection {
            transport: WsTransport {
                outbound: outbound_tx,
            },
            inbound: inbound_rx,
            connection_id,
            ice_servers,
        })
    }
}

#[async_trait]
impl SignalingTransport for WsTransport {
    async fn send(&self, message: SignalMessage) -> Result<(), TransportError> {
        let json = serde_json::to_string(&message)?;
        self.outbound
            .send(json)
            .map_err(|_| TransportError::Closed)
    }
}
