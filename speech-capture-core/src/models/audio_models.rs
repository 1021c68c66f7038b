use std::sync::Arc;

/// One delivery of mono samples from the input device.
///
/// Samples are normalized f32 in `[-1.0, 1.0]`. The storage is shared and
/// immutable, so handing a frame to the live view never copies it and can
/// never alter what the session buffered.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Arc<[f32]>,
}

impl AudioFrame {
    pub fn new(samples: &[f32]) -> Self {
        Self {
            samples: Arc::from(samples),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// RMS level of the frame (0.0–1.0 for normalized audio).
    pub fn rms_level(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// Peak absolute level of the frame.
    pub fn peak_level(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }
}

impl From<Vec<f32>> for AudioFrame {
    fn from(samples: Vec<f32>) -> Self {
        Self {
            samples: Arc::from(samples),
        }
    }
}

/// An input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Counters for debugging a capture session. Reset on every `start()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSessionDiagnostics {
    /// Frames the device delivered to the callback, in any state.
    pub frames_delivered: u64,
    /// Frames appended to the sample buffer.
    pub frames_buffered: u64,
    /// Samples appended to the sample buffer.
    pub samples_buffered: u64,
    /// Frames discarded because no matching session was active: before the
    /// session went active, after teardown began, or late deliveries from an
    /// earlier session's device.
    pub frames_dropped_inactive: u64,
    /// Live frames evicted because the live view fell behind.
    pub live_frames_dropped: u64,
}
