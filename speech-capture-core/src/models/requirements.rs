use serde::{Deserialize, Serialize};

use super::config::{CaptureConfiguration, DEFAULT_SAMPLE_RATE, MAX_SESSION_DURATION};

/// Payload size accepted by the speech service upload endpoint.
pub const MAX_PAYLOAD_BYTES: u64 = 1_048_576;

/// What the downstream speech service accepts for a single upload.
///
/// Serialized field names match the service's requirements document, so the
/// same value can be fetched from or published to it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRequirements {
    pub format: String,
    pub sample_rate: u32,
    pub max_duration_seconds: u32,
    pub max_size_bytes: u64,
    pub channels: u16,
    pub bit_depth: u16,
}

impl AudioRequirements {
    /// Requirements implied by a capture configuration.
    pub fn for_config(config: &CaptureConfiguration) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            bit_depth: config.bit_depth,
            max_duration_seconds: config.max_duration.as_secs_f64().ceil() as u32,
            ..Self::default()
        }
    }
}

impl Default for AudioRequirements {
    fn default() -> Self {
        Self {
            format: "wav".into(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_duration_seconds: MAX_SESSION_DURATION.as_secs() as u32,
            max_size_bytes: MAX_PAYLOAD_BYTES,
            channels: 1,
            bit_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_match_service_contract() {
        let req = AudioRequirements::default();
        assert_eq!(req.format, "wav");
        assert_eq!(req.sample_rate, 16000);
        assert_eq!(req.max_duration_seconds, 3);
        assert_eq!(req.max_size_bytes, 1_048_576);
        assert_eq!(req.channels, 1);
        assert_eq!(req.bit_depth, 16);
    }

    #[test]
    fn parses_service_json() {
        let json = r#"{"format":"wav","sample_rate":16000,"max_duration_seconds":3,
            "max_size_bytes":1048576,"channels":1,"bit_depth":16}"#;
        let req: AudioRequirements = serde_json::from_str(json).unwrap();
        assert_eq!(req, AudioRequirements::default());
    }

    #[test]
    fn for_config_rounds_duration_up() {
        let config = CaptureConfiguration {
            max_duration: Duration::from_millis(1500),
            ..Default::default()
        };
        assert_eq!(AudioRequirements::for_config(&config).max_duration_seconds, 2);
    }
}
