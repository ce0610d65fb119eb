use sensor_ingest::observability::SessionMetrics;
use std::sync::Arc;

#[test]
fn test_metrics_creation() {
    let stats = SessionMetrics::new().snapshot();
    assert_eq!(stats.frames_accepted, 0);
    assert_eq!(stats.decode_errors, 0);
    assert_eq!(stats.persist_errors, 0);
    assert_eq!(stats.reconnects, 0);
}

#[test]
fn test_metrics_increment_across_threads() {
    let metrics = Arc::new(SessionMetrics::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    metrics.record_frame_accepted();
                }
                metrics.record_decode_error();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    metrics.record_reconnect();

    let stats = metrics.snapshot();
    assert_eq!(stats.frames_accepted, 1000);
    assert_eq!(stats.decode_errors, 4);
    assert_eq!(stats.reconnects, 1);
}

#[tokio::test]
async fn test_uptime_advances() {
    let metrics = SessionMetrics::new();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    assert!(metrics.snapshot().uptime_ms >= 10);
}

#[test]
fn test_summary_text() {
    let metrics = SessionMetrics::new();
    metrics.record_frame_accepted();
    metrics.record_persist_error();

    assert_eq!(
        metrics.snapshot().summary(),
        "1 frames, 0 decode errors, 1 write error, 0 reconnects"
    );
}
