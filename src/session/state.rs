//! Session lifecycle states.

use serde::Serialize;

/// Where a recording session is in its capture-to-result cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing captured, ready to start.
    #[default]
    Idle,
    /// Capture source is feeding the buffer.
    Capturing,
    /// Buffer frozen, classification running.
    Processing,
    /// Classification produced a result.
    Completed,
    /// Capture or classification failed.
    Failed,
}

impl SessionState {
    /// Whether the session holds a result or a failure.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Capturing => write!(f, "capturing"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
