use crate::integration::init_tracing;
use crate::utils::{FakePeer, LocalRelay, ROOM, start_test_call_with, wait_until};
use std::time::Duration;
use telecall_core::{IceCandidate, SessionDescription, SignalMessage};

fn candidate(n: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 5000{n} typ host"),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
        username_fragment: Some("patient".to_string()),
    }
}

#[tokio::test]
async fn test_early_candidates_are_applied_in_order_after_the_offer() {
    init_tracing();
    let relay = LocalRelay::new();

    // A hand-driven patient already waiting in the room.
    let (patient, mut patient_inbox) = relay.connect();
    patient.send_join(ROOM, "patient").await;

    let doctor = start_test_call_with(
        &relay,
        FakePeer::builder("doctor").without_auto_negotiation(),
        "doctor",
    )
    .await
    .unwrap();

    let peer_joined = tokio::time::timeout(Duration::from_secs(1), patient_inbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(peer_joined, SignalMessage::PeerJoined {});

    for n in 1..=3 {
        patient.send_candidate(ROOM, candidate(n)).await;
    }
    patient
        .send_description(ROOM, SessionDescription::offer("offer from patient"))
        .await;
    patient.send_candidate(ROOM, candidate(4)).await;

    assert!(wait_until(|| doctor.peer.applied_candidates().len() == 4, 1000).await);
    assert_eq!(
        doctor.peer.applied_candidates(),
        vec![candidate(1), candidate(2), candidate(3), candidate(4)]
    );

    let log = doctor.peer.log();
    let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
    let offer_applied = position("set_remote offer");
    let first_candidate = position(&format!("add_candidate {}", candidate(1).candidate));
    let third_candidate = position(&format!("add_candidate {}", candidate(3).candidate));
    let answered = position("create_answer");
    assert!(offer_applied < first_candidate);
    assert!(third_candidate < answered);

    // The answer goes back to the patient.
    let answer = loop {
        let message = tokio::time::timeout(Duration::from_secs(1), patient_inbox.recv())
            .await
            .unwrap()
            .unwrap();
        if let SignalMessage::Description { description, .. } = message {
            break description;
        }
    };
    assert!(!answer.is_offer());
    assert!(answer.sdp.contains("to [offer from patient]"));

    doctor.handle.hang_up().await;
}
