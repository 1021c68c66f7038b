use thiserror::Error;

use crate::models::requirements::AudioRequirements;
use crate::processing::wav_format::{WavInfo, WavParseError};

/// Reasons a payload would be refused by the speech service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PayloadError {
    #[error("audio payload is empty")]
    Empty,

    #[error("audio payload is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("malformed WAV payload: {0}")]
    Malformed(#[from] WavParseError),

    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    #[error("audio is {duration_secs:.2}s, limit is {limit_secs}s")]
    TooLong { duration_secs: f64, limit_secs: u32 },
}

/// Check a WAV payload against the upload requirements before handing it to
/// transport. Returns the decoded header on success.
pub fn validate_payload(bytes: &[u8], requirements: &AudioRequirements) -> Result<WavInfo, PayloadError> {
    if bytes.is_empty() {
        return Err(PayloadError::Empty);
    }

    let size = bytes.len() as u64;
    if size > requirements.max_size_bytes {
        return Err(PayloadError::TooLarge {
            size,
            limit: requirements.max_size_bytes,
        });
    }

    let info = WavInfo::parse(bytes)?;

    if info.sample_rate != requirements.sample_rate {
        return Err(PayloadError::FormatMismatch(format!(
            "sample rate {} Hz, expected {} Hz",
            info.sample_rate, requirements.sample_rate
        )));
    }
    if info.channels != requirements.channels {
        return Err(PayloadError::FormatMismatch(format!(
            "{} channels, expected {}",
            info.channels, requirements.channels
        )));
    }
    if info.bits_per_sample != requirements.bit_depth {
        return Err(PayloadError::FormatMismatch(format!(
            "{}-bit samples, expected {}-bit",
            info.bits_per_sample, requirements.bit_depth
        )));
    }

    let duration_secs = info.duration_secs();
    if duration_secs > requirements.max_duration_seconds as f64 {
        return Err(PayloadError::TooLong {
            duration_secs,
            limit_secs: requirements.max_duration_seconds,
        });
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::{encode_wav, generate_wav_header};

    fn silence(samples: usize, rate: u32) -> Vec<u8> {
        encode_wav(std::iter::repeat(0.0f32), samples, rate)
    }

    #[test]
    fn accepts_a_full_length_session() {
        let req = AudioRequirements::default();
        let info = validate_payload(&silence(48_000, 16_000), &req).unwrap();
        assert_eq!(info.sample_count(), 48_000);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            validate_payload(&[], &AudioRequirements::default()),
            Err(PayloadError::Empty)
        );
    }

    #[test]
    fn rejects_oversized() {
        let req = AudioRequirements {
            max_size_bytes: 100,
            ..Default::default()
        };
        assert!(matches!(
            validate_payload(&silence(100, 16_000), &req),
            Err(PayloadError::TooLarge { size: 244, limit: 100 })
        ));
    }

    #[test]
    fn rejects_wrong_rate() {
        let result = validate_payload(&silence(10, 44_100), &AudioRequirements::default());
        assert!(matches!(result, Err(PayloadError::FormatMismatch(_))));
    }

    #[test]
    fn rejects_stereo_header() {
        let mut wav = generate_wav_header(16_000, 16, 2, 4).to_vec();
        wav.extend_from_slice(&[0u8; 4]);
        let result = validate_payload(&wav, &AudioRequirements::default());
        assert!(matches!(result, Err(PayloadError::FormatMismatch(_))));
    }

    #[test]
    fn rejects_over_duration() {
        let result = validate_payload(&silence(48_001, 16_000), &AudioRequirements::default());
        assert!(matches!(result, Err(PayloadError::TooLong { limit_secs: 3, .. })));
    }

    #[test]
    fn malformed_header_is_reported() {
        let result = validate_payload(b"not a wav file at all", &AudioRequirements::default());
        assert!(matches!(result, Err(PayloadError::Malformed(WavParseError::Truncated(21)))));
    }
}
