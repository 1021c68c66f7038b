use std::thread;
use std::time::Instant;

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::models::error::CaptureError;

/// One-shot auto-stop timer running on its own thread.
///
/// Fires `on_expire` once `deadline` passes unless disarmed first. Disarming
/// drops the channel sender, which wakes the thread immediately.
pub(crate) struct DeadlineTimer {
    disarm: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeadlineTimer {
    pub(crate) fn arm<F>(deadline: Instant, on_expire: F) -> Result<Self, CaptureError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (disarm, disarmed) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("capture-deadline".into())
            .spawn(move || {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match disarmed.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => on_expire(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
                }
            })
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to spawn deadline thread: {}", e)))?;

        Ok(Self {
            disarm: Some(disarm),
            handle: Some(handle),
        })
    }

    /// Cancel the timer and wait for its thread, unless called from that
    /// thread (the expiry path tears the session down itself).
    pub(crate) fn disarm(mut self) {
        self.disarm.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.disarm.take();
    }
}
