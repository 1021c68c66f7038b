use crate::traits::capture_provider::DeviceHandle;

/// Scoped ownership of an acquired input device.
///
/// The device is released exactly once: either through [`DeviceLease::release`],
/// which consumes the lease, or when the lease is dropped on any other exit
/// path. `DeviceHandle::release` takes the handle by value, so there is no
/// handle left to release twice or to use afterwards.
pub struct DeviceLease {
    handle: Option<Box<dyn DeviceHandle>>,
    session_id: String,
}

impl DeviceLease {
    pub fn new(handle: Box<dyn DeviceHandle>, session_id: impl Into<String>) -> Self {
        Self {
            handle: Some(handle),
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Release the device. Returns once no further frame can be delivered.
    pub fn release(mut self) {
        self.release_handle();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Releasing input device for session {}", self.session_id);
            handle.release();
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        if self.handle.is_some() {
            log::warn!("Device lease for session {} dropped without release", self.session_id);
        }
        self.release_handle();
    }
}

impl std::fmt::Debug for DeviceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLease")
            .field("session_id", &self.session_id)
            .field("held", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandle(Arc<AtomicUsize>);

    impl DeviceHandle for CountingHandle {
        fn release(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn explicit_release_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let lease = DeviceLease::new(Box::new(CountingHandle(count.clone())), "s1");
        lease.release();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_held_device() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _lease = DeviceLease::new(Box::new(CountingHandle(count.clone())), "s2");
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_during_unwind() {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let result = std::panic::catch_unwind(move || {
            let _lease = DeviceLease::new(Box::new(CountingHandle(inner)), "s3");
            panic!("session thread failed");
        });
        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
