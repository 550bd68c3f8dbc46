use crate::integration::init_tracing;
use crate::utils::{LocalRelay, start_test_call, wait_connected, wait_for_status};
use telecall_client::ConnectionStatus;
use telecall_core::SignalMessage;

#[tokio::test]
async fn test_second_login_ends_the_first_call() {
    init_tracing();
    let relay = LocalRelay::new();
    let doctor = start_test_call(&relay, "doctor").await.unwrap();
    let first = start_test_call(&relay, "patient").await.unwrap();
    wait_connected(&first).await.unwrap();

    let second = start_test_call(&relay, "patient").await.unwrap();

    wait_for_status(
        &first.handle,
        |s| {
            *s == ConnectionStatus::Failed {
                reason: "joined from another connection".to_string(),
                retrying: false,
            }
        },
        1000,
    )
    .await
    .unwrap();
    assert!(first.peer.is_closed());
    assert!(!first.handle.is_active());

    // The seat is already gone, so there is nothing to leave.
    let leaves = first
        .transport
        .count_sent(|m| matches!(m, SignalMessage::LeaveRoom { .. }));
    assert_eq!(leaves, 0);

    wait_connected(&second).await.unwrap();

    first.handle.hang_up().await;
    second.handle.hang_up().await;
    doctor.handle.hang_up().await;
}
