pub use telecall_core::{ParticipantIdentity, RoomId};

pub mod model {
    pub use telecall_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use telecall_relay::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use telecall_client::*;
}
