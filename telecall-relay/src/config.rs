use std::net::SocketAddr;
use telecall_core::IceServerConfig;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:5002";

/// Settings for one relay process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen: SocketAddr,
    /// Pushed to every client in its `welcome` message.
    pub ice_servers: Vec<IceServerConfig>,
}

impl RelayConfig {
    pub fn default_ice_servers() -> Vec<IceServerConfig> {
        vec![
            IceServerConfig::stun("stun:stun.l.google.com:19302"),
            IceServerConfig::stun("stun:stun1.l.google.com:19302"),
        ]
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5002)),
            ice_servers: Self::default_ice_servers(),
        }
    }
}
