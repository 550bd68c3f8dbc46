use crate::role::RoleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to the relay: {0}")]
    Connect(String),
    #[error("signaling channel is closed")]
    Closed,
    #[error("failed to encode signal message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a call could not be started.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Role(#[from] RoleError),
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("peer connection error: {0:#}")]
    Primitive(anyhow::Error),
}
