use sensor_ingest::resilience::ReconnectPolicy;
use sensor_ingest::SessionConfig;
use std::time::Duration;

#[test]
fn test_default_policy() {
    let policy = ReconnectPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.retry_delay(), Duration::from_secs(2));
}

#[test]
fn test_delays_follow_budget() {
    let policy = ReconnectPolicy::new(3, Duration::from_millis(250));

    assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
    assert_eq!(policy.delay_before(2), Some(Duration::from_millis(250)));
    assert_eq!(policy.delay_before(3), Some(Duration::from_millis(250)));
    assert_eq!(policy.delay_before(4), None);
}

#[test]
fn test_never_allows_single_attempt() {
    let policy = ReconnectPolicy::never();
    assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
    assert_eq!(policy.delay_before(2), None);
}

#[test]
fn test_policy_from_config_json() {
    let config: SessionConfig = serde_json::from_str(
        r#"{ "reconnect": { "max_attempts": 5, "retry_delay_ms": 100 } }"#,
    )
    .unwrap();
    assert_eq!(config.reconnect, ReconnectPolicy::new(5, Duration::from_millis(100)));
}
