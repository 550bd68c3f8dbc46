use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use telecall_core::IceServerConfig;
use telecall_relay::{AppState, RelayConfig, serve};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "telecall-relay", version, about = "Signaling relay for two-party calls")]
struct Args {
    #[arg(long, env = "TELECALL_LISTEN", default_value = telecall_relay::DEFAULT_LISTEN)]
    listen: SocketAddr,

    /// STUN/TURN urls handed to clients. Defaults to public STUN servers.
    #[arg(long = "ice-server", env = "TELECALL_ICE_SERVERS", value_delimiter = ',')]
    ice_servers: Vec<String>,

    #[arg(long, env = "TELECALL_TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "TELECALL_TURN_CREDENTIAL")]
    turn_credential: Option<String>,
}

impl Args {
    fn into_config(self) -> RelayConfig {
        let ice_servers = if self.ice_servers.is_empty() {
            RelayConfig::default_ice_servers()
        } else {
            vec![IceServerConfig {
                urls: self.ice_servers,
                username: self.turn_username,
                credential: self.turn_credential,
            }]
        };

        RelayConfig {
            listen: self.listen,
            ice_servers,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Args::parse().into_config();
    info!("Initializing signaling relay...");

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    serve(listener, AppState::new(&config)).await
}
