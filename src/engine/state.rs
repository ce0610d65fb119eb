use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Ingestion session lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running {
        #[serde(skip)]
        start_time: Option<Instant>,
    },
    Stopped {
        total_frames: u64,
    },
    Failed {
        reason: String,
        total_frames: u64,
    },
}

impl SessionState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Idle, Running { .. }) |
            (Running { .. }, Stopped { .. }) |
            (Running { .. }, Failed { .. })
        )
    }

    /// Stopped and Failed are final for a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped { .. } | Self::Failed { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Running { .. } => "Running",
            Self::Stopped { .. } => "Stopped",
            Self::Failed { .. } => "Failed",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
