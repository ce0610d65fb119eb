use sensor_ingest::engine::SessionShared;
use sensor_ingest::SessionState;

fn running() -> SessionState {
    SessionState::Running { start_time: None }
}

#[test]
fn test_session_state_transitions() {
    let shared = SessionShared::new();
    assert_eq!(shared.state().name(), "Idle");

    shared.transition_to(running()).unwrap();
    assert_eq!(shared.state().name(), "Running");

    shared
        .transition_to(SessionState::Stopped { total_frames: 3 })
        .unwrap();
    assert_eq!(shared.state(), SessionState::Stopped { total_frames: 3 });
    assert!(shared.state().is_terminal());
}

#[test]
fn test_invalid_state_transition() {
    let shared = SessionShared::new();

    // Idle -> Stopped skips Running
    let result = shared.transition_to(SessionState::Stopped { total_frames: 0 });
    assert!(result.is_err());
    assert_eq!(shared.state().name(), "Idle");
}

#[test]
fn test_terminal_states_are_final() {
    let shared = SessionShared::new();
    shared.transition_to(running()).unwrap();
    shared
        .transition_to(SessionState::Failed {
            reason: "link lost".into(),
            total_frames: 0,
        })
        .unwrap();

    assert!(shared.transition_to(running()).is_err());
    assert!(shared
        .transition_to(SessionState::Stopped { total_frames: 0 })
        .is_err());
    assert_eq!(shared.state().name(), "Failed");
}

#[test]
fn test_state_serializes_without_instant() {
    let json = serde_json::to_string(&SessionState::Running {
        start_time: Some(std::time::Instant::now()),
    })
    .unwrap();
    assert_eq!(json, r#"{"Running":{}}"#);
}
