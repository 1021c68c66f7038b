use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::CaptureError;

/// A finished recording: a complete WAV container plus its declared format.
///
/// Produced once per session; ownership moves to whoever receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub metadata: RecordingMetadata,
}

impl EncodedAudio {
    /// Consume the recording and return the payload for transport.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Descriptive metadata for a recording.
///
/// Serializable for JSON export alongside the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub sample_count: u64,
    pub byte_len: u64,
    pub checksum: String,
    pub created_at: String,
}

impl RecordingMetadata {
    /// Build metadata for an encoded mono payload.
    pub fn for_payload(session_id: &str, bytes: &[u8], sample_count: u64, sample_rate: u32) -> Self {
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            sample_count as f64 / sample_rate as f64
        };
        Self {
            id: session_id.to_string(),
            duration_secs,
            sample_count,
            byte_len: bytes.len() as u64,
            checksum: sha256_hex(bytes),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The single result of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(EncodedAudio),
    Failed(CaptureError),
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_result(self) -> Result<EncodedAudio, CaptureError> {
        match self {
            Self::Completed(audio) => Ok(audio),
            Self::Failed(err) => Err(err),
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
