//! # speech-capture-cpal
//!
//! Cross-platform microphone backend for speech-capture, built on cpal.
//!
//! Provides:
//! - `CpalMicCapture` — `CaptureProvider` over the default cpal host
//! - `DeviceEnumerator` — input device listing and lookup
//! - `FrameConverter` — downmix + resample from the device's native format
//!
//! The cpal-backed parts are compiled with the `cpal` feature; the converter
//! is always available.
//!
//! ## Usage
//! ```ignore
//! use speech_capture_core::CaptureController;
//! use speech_capture_cpal::CpalMicCapture;
//!
//! let controller = CaptureController::new(CpalMicCapture::default_device());
//! controller.start()?;
//! ```

pub mod converter;
#[cfg(feature = "cpal")]
pub mod cpal_mic;
#[cfg(feature = "cpal")]
pub mod device_enumerator;

pub use converter::FrameConverter;
#[cfg(feature = "cpal")]
pub use cpal_mic::CpalMicCapture;
#[cfg(feature = "cpal")]
pub use device_enumerator::DeviceEnumerator;
