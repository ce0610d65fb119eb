pub mod metrics;

pub use metrics::{SessionMetrics, SessionStats};
