
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use telecall_relay::RoomManager;

use crate::utils::{Delivery, MockSignalingOutput};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_manager() -> (
    RoomManager,
    mpsc::UnboundedReceiver<Delivery>,
    MockSignalingOutput,
) {
    let (signaling, delivery_rx) = MockSignalingOutput::new();
    let manager = RoomManager::new(Arc::new(signaling.clone()));

    (manager, delivery_rx, signaling)
}
