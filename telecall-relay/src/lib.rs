mod app;
mod config;
mod room;
mod signaling;

pub use app::{AppState, router, serve};
pub use config::{DEFAULT_LISTEN, RelayConfig};
pub use room::*;
pub use signaling::*;
