use crate::integration::init_tracing;
use crate::utils::{LocalRelay, start_webrtc_call, wait_until};
use telecall_client::{PeerPrimitive, SignalingPhase};
use telecall_core::{DescriptionKind, SignalMessage};

fn is_description(kind: DescriptionKind) -> impl Fn(&SignalMessage) -> bool {
    move |message| {
        matches!(message, SignalMessage::Description { description, .. } if description.kind == kind)
    }
}

/// The patient's first offer goes into an empty room, so the doctor's offer
/// collides with it on a real peer connection.
#[tokio::test]
async fn test_webrtc_patient_rolls_back_for_the_doctor() {
    init_tracing();
    let relay = LocalRelay::new();

    let patient = start_webrtc_call(&relay, "patient").await.unwrap();
    let offered = wait_until(
        || patient.transport.count_sent(is_description(DescriptionKind::Offer)) >= 1,
        5000,
    )
    .await;
    assert!(offered, "patient never offered");
    assert_eq!(patient.peer.signaling_phase(), SignalingPhase::HaveLocalOffer);

    let doctor = start_webrtc_call(&relay, "doctor").await.unwrap();

    let answered = wait_until(
        || {
            patient.handle.stats().rollbacks >= 1
                && patient
                    .transport
                    .count_sent(is_description(DescriptionKind::Answer))
                    >= 1
        },
        5000,
    )
    .await;
    assert!(answered, "patient never answered the doctor");

    let settled = wait_until(
        || {
            doctor.peer.signaling_phase() == SignalingPhase::Stable
                && patient.peer.signaling_phase() == SignalingPhase::Stable
        },
        5000,
    )
    .await;
    assert!(settled, "negotiation did not settle");

    assert!(doctor.peer.remote_description().await.is_some());
    assert!(patient.peer.remote_description().await.is_some());
    assert_eq!(doctor.handle.stats().rollbacks, 0);

    doctor.handle.hang_up().await;
    patient.handle.hang_up().await;
}
