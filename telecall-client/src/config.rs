use telecall_core::IceServerConfig;

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:5002/ws";

/// Client side settings for one call.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// WebSocket endpoint of the relay.
    pub relay_url: String,
    /// Used when the relay does not push its own list in `welcome`.
    pub ice_servers: Vec<IceServerConfig>,
    /// Gather loopback candidates, so two clients on one host can connect
    /// without a network.
    pub include_loopback_candidates: bool,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            ice_servers: vec![
                IceServerConfig::stun("stun:stun.l.google.com:19302"),
                IceServerConfig::stun("stun:stun1.l.google.com:19302"),
            ],
            include_loopback_candidates: false,
        }
    }
}
