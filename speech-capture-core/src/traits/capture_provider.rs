use std::sync::Arc;

use crate::models::audio_models::AudioSource;
use crate::models::error::CaptureError;

/// Callback invoked for every frame the device delivers.
///
/// Receives mono f32 samples at the sample rate requested in
/// [`StreamFormat`]. Fires on the device's own thread; keep work minimal.
pub type FrameCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// The format a caller asks the device to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub device_id: Option<String>,
}

/// A platform audio input that can be acquired for one session.
///
/// Implemented by:
/// - `CpalMicCapture` (speech-capture-cpal)
pub trait CaptureProvider: Send + Sync {
    /// Whether an input device is currently present.
    fn is_available(&self) -> bool;

    /// Acquire exclusive access to an input and begin delivering frames.
    ///
    /// Blocks until the device is either streaming or has failed. On error
    /// nothing may remain held.
    fn acquire(&self, format: &StreamFormat, callback: FrameCallback) -> Result<Box<dyn DeviceHandle>, CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}

/// An acquired input device together with whatever processing graph sits
/// between it and the frame callback.
///
/// `release` consumes the handle: once it returns, the callback never fires
/// again and the device is free for other users.
pub trait DeviceHandle: Send {
    fn release(self: Box<Self>);
}
