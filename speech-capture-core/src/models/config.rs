use std::time::Duration;

/// Sample rate expected by the downstream speech service.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Hard ceiling on a single session. Bounds payload size and guarantees the
/// session ends even if the caller never calls `stop()`.
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(3);

/// Default depth of the live-frame fan-out channel.
pub const DEFAULT_LIVE_FRAME_CAPACITY: usize = 32;

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Target sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Bit depth for PCM output. Only 16 is supported.
    pub bit_depth: u16,

    /// Number of output channels. Only mono is supported.
    pub channels: u16,

    /// Auto-stop deadline measured from a successful `start()`.
    /// Must not exceed `MAX_SESSION_DURATION`.
    pub max_duration: Duration,

    /// Number of live frames that may queue for the visualizer before new
    /// ones are dropped.
    pub live_frame_capacity: usize,

    /// Specific input device ID, or None for the system default.
    pub device_id: Option<String>,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.bit_depth != 16 {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.channels != 1 {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.max_duration.is_zero() {
            return Err("max duration must be positive".into());
        }
        if self.max_duration > MAX_SESSION_DURATION {
            return Err(format!(
                "max duration {:?} exceeds the {:?} ceiling",
                self.max_duration, MAX_SESSION_DURATION
            ));
        }
        if self.live_frame_capacity == 0 {
            return Err("live frame capacity must be positive".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: 16,
            channels: 1,
            max_duration: MAX_SESSION_DURATION,
            live_frame_capacity: DEFAULT_LIVE_FRAME_CAPACITY,
            device_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CaptureConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_stereo_and_other_depths() {
        let stereo = CaptureConfiguration { channels: 2, ..Default::default() };
        assert!(stereo.validate().is_err());

        let wide = CaptureConfiguration { bit_depth: 24, ..Default::default() };
        assert!(wide.validate().is_err());
    }

    #[test]
    fn max_duration_is_capped() {
        let long = CaptureConfiguration {
            max_duration: MAX_SESSION_DURATION + Duration::from_millis(1),
            ..Default::default()
        };
        assert!(long.validate().is_err());

        let short = CaptureConfiguration {
            max_duration: Duration::from_millis(50),
            ..Default::default()
        };
        assert!(short.validate().is_ok());

        let zero = CaptureConfiguration { max_duration: Duration::ZERO, ..Default::default() };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn zero_live_capacity_rejected() {
        let config = CaptureConfiguration { live_frame_capacity: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
