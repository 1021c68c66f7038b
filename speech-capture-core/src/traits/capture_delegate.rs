use crate::models::encoded_audio::SessionOutcome;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Called from whichever thread drove the transition (caller, device
/// callback or auto-stop timer), never while session locks are held.
/// Implementations should marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called once per session with its single outcome.
    fn on_session_finished(&self, outcome: &SessionOutcome);
}
