//! # speech-capture-core
//!
//! Platform-agnostic speech capture core.
//!
//! Runs one bounded microphone session at a time: frames pushed by a
//! platform backend are buffered while the session is active, the session
//! ends on request or after a fixed ceiling, and the buffer is packaged as a
//! 16 kHz mono 16-bit WAV payload ready for upload. Backends implement the
//! `CaptureProvider` trait and plug into the generic `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! speech-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, DeviceHandle, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, AudioFrame, EncodedAudio
//! ├── processing/   ← SampleBuffer, WAV encoding/decoding, payload validation
//! └── session/      ← CaptureController, DeviceLease
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioFrame, AudioSource, CaptureSessionDiagnostics};
pub use models::config::{CaptureConfiguration, DEFAULT_SAMPLE_RATE, MAX_SESSION_DURATION};
pub use models::encoded_audio::{EncodedAudio, RecordingMetadata, SessionOutcome};
pub use models::error::CaptureError;
pub use models::requirements::AudioRequirements;
pub use models::state::CaptureState;
pub use processing::payload::{validate_payload, PayloadError};
pub use processing::sample_buffer::SampleBuffer;
pub use processing::wav_format::{encode_wav, WavInfo, WavParseError};
pub use session::controller::CaptureController;
pub use session::lease::DeviceLease;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_provider::{CaptureProvider, DeviceHandle, FrameCallback, StreamFormat};
