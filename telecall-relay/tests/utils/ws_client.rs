use anyhow::{Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use telecall_core::SignalMessage;
use telecall_relay::{AppState, RelayConfig, serve};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts a relay on an ephemeral local port.
pub async fn spawn_relay() -> Result<(SocketAddr, AppState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = AppState::new(&RelayConfig::default());

    tokio::spawn({
        let state = state.clone();
        async move {
            if let Err(e) = serve(listener, state).await {
                tracing::error!("[TestRelay] server error: {}", e);
            }
        }
    });

    Ok((addr, state))
}

/// Raw WebSocket client speaking the relay protocol.
pub struct WsTestClient {
    write: SplitSink<Socket, Message>,
    read: SplitStream<Socket>,
}

impl WsTestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .context("WebSocket handshake failed")?;
        let (write, read) = socket.split();
        Ok(Self { write, read })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.write.send(Message::text(json)).await?;
        Ok(())
    }

    pub async fn recv(&mut self, timeout_ms: u64) -> Result<SignalMessage> {
        loop {
            let next = tokio::time::timeout(Duration::from_millis(timeout_ms), self.read.next())
                .await
                .context("Timed out waiting for a signal")?;

            match next {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).context("Invalid signal JSON");
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => anyhow::bail!("WebSocket error: {e}"),
                None => anyhow::bail!("WebSocket closed"),
            }
        }
    }

    /// Asserts that nothing arrives within `window_ms`.
    pub async fn expect_silence(&mut self, window_ms: u64) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(window_ms), self.read.next()).await {
            Err(_) => Ok(()),
            Ok(other) => anyhow::bail!("Expected silence, got {:?}", other),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}

/// Polls `condition` every 20ms until it holds or `timeout_ms` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
