use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters updated by the ingestion loop, readable from any task
pub struct SessionMetrics {
    frames_accepted: AtomicU64,
    decode_errors: AtomicU64,
    persist_errors: AtomicU64,
    reconnects: AtomicU64,
    started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames_accepted: u64,
    pub decode_errors: u64,
    pub persist_errors: u64,
    pub reconnects: u64,
    pub uptime_ms: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            frames_accepted: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            persist_errors: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_frame_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_error(&self) {
        self.persist_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_accepted: self.frames_accepted(),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            persist_errors: self.persist_errors.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            uptime_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    /// One-line summary for status displays
    pub fn summary(&self) -> String {
        format!(
            "{} frames, {} decode error{}, {} write error{}, {} reconnect{}",
            self.frames_accepted,
            self.decode_errors,
            if self.decode_errors == 1 { "" } else { "s" },
            self.persist_errors,
            if self.persist_errors == 1 { "" } else { "s" },
            self.reconnects,
            if self.reconnects == 1 { "" } else { "s" },
        )
    }
}
