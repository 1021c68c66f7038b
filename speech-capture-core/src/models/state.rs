use std::time::Instant;

use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle ──start──→ active ──stop/deadline──→ stopping ──→ finalized
///   │                                                       │
///   └──acquisition error──→ failed ←──forced teardown───────┘ (from active)
/// ```
///
/// `Finalized` and `Failed` accept a new `start()`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Active { started_at: Instant },
    Stopping,
    Finalized,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed(_))
    }

    /// Whether a device handle is held in this state.
    pub fn holds_device(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Stopping)
    }

    /// Whether `start()` may begin a new session from this state.
    pub fn can_start(&self) -> bool {
        !self.holds_device()
    }

    /// Elapsed time for an active session.
    pub fn elapsed_secs(&self) -> Option<f64> {
        match self {
            Self::Active { started_at } => Some(started_at.elapsed().as_secs_f64()),
            _ => None,
        }
    }

    /// Short lowercase label, suitable for UI events and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active { .. } => "active",
            Self::Stopping => "stopping",
            Self::Finalized => "finalized",
            Self::Failed(_) => "failed",
        }
    }
}
