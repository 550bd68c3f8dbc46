use crate::integration::init_tracing;
use crate::utils::{
    LocalRelay, TestCall, start_test_call, wait_connected, wait_for_status, wait_until,
};
use telecall_client::{ConnectionStatus, PeerState, PrimitiveEvent};
use telecall_core::SignalMessage;

async fn connected_pair(relay: &LocalRelay) -> (TestCall, TestCall) {
    let patient = start_test_call(relay, "patient").await.unwrap();
    let doctor = start_test_call(relay, "doctor").await.unwrap();
    wait_connected(&doctor).await.unwrap();
    wait_connected(&patient).await.unwrap();
    (doctor, patient)
}

#[tokio::test]
async fn test_failure_is_healed_by_one_ice_restart() {
    init_tracing();
    let relay = LocalRelay::new();
    let (doctor, patient) = connected_pair(&relay).await;

    doctor
        .peer
        .emit(PrimitiveEvent::ConnectionState(PeerState::Failed));

    // The restart reports a retrying failure before it sends its offer.
    assert!(wait_until(|| doctor.handle.stats().ice_restarts == 1, 1000).await);
    wait_connected(&doctor).await.unwrap();

    assert_eq!(doctor.peer.count("create_offer restart=true"), 1);
    assert_eq!(doctor.peer.local_description(), patient.peer.remote_description());
    assert_eq!(doctor.peer.remote_description(), patient.peer.local_description());
    assert!(doctor.peer.local_description().unwrap().sdp.ends_with("ice=1"));
    assert!(doctor.handle.is_active());

    // Recovery gives the call a fresh restart.
    doctor
        .peer
        .emit(PrimitiveEvent::ConnectionState(PeerState::Failed));
    assert!(wait_until(|| doctor.peer.count("create_offer restart=true") == 2, 1000).await);
    wait_connected(&doctor).await.unwrap();

    doctor.handle.hang_up().await;
    patient.handle.hang_up().await;
}

#[tokio::test]
async fn test_failed_restart_is_terminal() {
    init_tracing();
    let relay = LocalRelay::new();
    let (doctor, patient) = connected_pair(&relay).await;

    doctor.peer.set_connectivity(false);
    doctor
        .peer
        .emit(PrimitiveEvent::ConnectionState(PeerState::Failed));

    wait_for_status(
        &doctor.handle,
        |s| {
            matches!(
                s,
                ConnectionStatus::Failed {
                    retrying: false,
                    ..
                }
            )
        },
        2000,
    )
    .await
    .unwrap();

    assert_eq!(doctor.peer.count("create_offer restart=true"), 1);
    assert_eq!(doctor.handle.stats().ice_restarts, 1);
    assert!(!doctor.handle.is_active());
    assert!(doctor.peer.is_closed());

    let leaves = |call: &TestCall| {
        call.transport
            .count_sent(|m| matches!(m, SignalMessage::LeaveRoom { .. }))
    };
    assert_eq!(leaves(&doctor), 1);

    // Nothing restarts it any more, and hanging up adds nothing.
    doctor
        .peer
        .emit(PrimitiveEvent::ConnectionState(PeerState::Failed));
    doctor.handle.hang_up().await;
    assert_eq!(doctor.peer.count("create_offer restart=true"), 1);
    assert_eq!(leaves(&doctor), 1);
    assert!(matches!(
        *doctor.handle.status().borrow(),
        ConnectionStatus::Failed {
            retrying: false,
            ..
        }
    ));

    patient.handle.hang_up().await;
}
