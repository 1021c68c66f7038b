use thiserror::Error;

/// Errors surfaced by a capture session.
///
/// Every session ends with exactly one outcome; acquisition failures are
/// terminal for their session and are never retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("a capture session is already active")]
    AlreadyActive,

    #[error("session aborted before completion")]
    Aborted,
}

impl CaptureError {
    /// Whether this error means no usable input device could be acquired.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable | Self::PermissionDenied)
    }
}
