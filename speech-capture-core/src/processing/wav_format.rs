//! WAV container encoding and header decoding.
//!
//! Produces standard 44-byte RIFF/WAVE headers followed by mono 16-bit
//! little-endian PCM.

use thiserror::Error;

use crate::processing::sample_buffer::SampleBuffer;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Only mono 16-bit PCM is ever produced.
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

const PCM_FORMAT_CODE: u16 = 1;
const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Quantize a normalized sample to signed 16-bit PCM.
///
/// Clamps to `[-1.0, 1.0]`, then scales negative values by 32768 and
/// non-negative values by 32767, truncating toward zero. The asymmetric
/// step keeps both full-scale ends reachable: 1.0 → 32767, -1.0 → -32768.
/// Decoders of this service's uploads assume exactly this mapping.
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Encode mono samples into a complete WAV container.
///
/// Empty input yields a valid 44-byte container with a zero-length `data`
/// chunk.
///
/// # Panics
///
/// If the PCM data exceeds the 32-bit RIFF size field. Sessions are capped
/// at a few seconds, so this is an invariant violation rather than an
/// input error.
pub fn encode_wav<I>(samples: I, sample_count: usize, sample_rate: u32) -> Vec<u8>
where
    I: IntoIterator<Item = f32>,
{
    let data_size = sample_count * BYTES_PER_SAMPLE;
    assert!(
        data_size <= (u32::MAX - 36) as usize,
        "PCM data of {} bytes exceeds the RIFF size limit",
        data_size
    );

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + data_size);
    out.extend_from_slice(&generate_wav_header(
        sample_rate,
        BITS_PER_SAMPLE,
        CHANNELS,
        data_size as u32,
    ));

    let mut written = 0usize;
    for sample in samples.into_iter().take(sample_count) {
        out.extend_from_slice(&quantize_sample(sample).to_le_bytes());
        written += 1;
    }
    assert_eq!(written, sample_count, "sample iterator shorter than declared count");

    out
}

/// Encode a finalized session buffer.
pub fn encode_buffer(buffer: &SampleBuffer, sample_rate: u32) -> Vec<u8> {
    encode_wav(buffer.samples(), buffer.sample_count(), sample_rate)
}

/// Errors from reading a WAV header back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WavParseError {
    #[error("payload is {0} bytes, shorter than a WAV header")]
    Truncated(usize),

    #[error("missing {0} tag")]
    BadMagic(&'static str),

    #[error("unsupported format code {0}, expected PCM")]
    NotPcm(u16),

    #[error("data chunk declares {declared} bytes but {actual} follow the header")]
    DataSizeMismatch { declared: u32, actual: usize },

    #[error("RIFF size {declared} disagrees with payload length {actual}")]
    RiffSizeMismatch { declared: u32, actual: usize },
}

/// Header fields decoded from a canonical 44-byte WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
}

impl WavInfo {
    /// Decode and cross-check the header of a canonical WAV payload.
    pub fn parse(bytes: &[u8]) -> Result<Self, WavParseError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(WavParseError::Truncated(bytes.len()));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(WavParseError::BadMagic("RIFF"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavParseError::BadMagic("WAVE"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(WavParseError::BadMagic("fmt "));
        }
        if &bytes[36..40] != b"data" {
            return Err(WavParseError::BadMagic("data"));
        }

        let format = read_u16(bytes, 20);
        if format != PCM_FORMAT_CODE {
            return Err(WavParseError::NotPcm(format));
        }

        let riff_size = read_u32(bytes, 4);
        if riff_size as usize != bytes.len() - 8 {
            return Err(WavParseError::RiffSizeMismatch {
                declared: riff_size,
                actual: bytes.len(),
            });
        }

        let data_size = read_u32(bytes, 40);
        let actual = bytes.len() - WAV_HEADER_SIZE;
        if data_size as usize != actual {
            return Err(WavParseError::DataSizeMismatch {
                declared: data_size,
                actual,
            });
        }

        Ok(Self {
            sample_rate: read_u32(bytes, 24),
            channels: read_u16(bytes, 22),
            bits_per_sample: read_u16(bytes, 34),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            data_size,
        })
    }

    /// Number of samples per channel.
    pub fn sample_count(&self) -> u64 {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as u64 / self.block_align as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::AudioFrame;

    fn pcm_at(bytes: &[u8], index: usize) -> i16 {
        let at = WAV_HEADER_SIZE + index * 2;
        i16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(16000, 16, 1, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_16khz_mono_16bit() {
        let header = generate_wav_header(16000, 16, 1, 3200);

        assert_eq!(read_u16(&header, 20), 1);
        assert_eq!(read_u32(&header, 16), 16);
        assert_eq!(read_u16(&header, 22), 1);
        assert_eq!(read_u32(&header, 24), 16000);
        assert_eq!(read_u32(&header, 28), 32000); // 16000 * 1 * 16/8
        assert_eq!(read_u16(&header, 32), 2);
        assert_eq!(read_u16(&header, 34), 16);
        assert_eq!(read_u32(&header, 40), 3200);
        assert_eq!(read_u32(&header, 4), 36 + 3200);
    }

    #[test]
    fn empty_input_is_bare_header() {
        let wav = encode_wav(std::iter::empty::<f32>(), 0, 16000);
        assert_eq!(wav.len(), 44);
        assert_eq!(read_u32(&wav, 40), 0);
        assert_eq!(read_u32(&wav, 4), 36);
    }

    #[test]
    fn length_is_header_plus_two_bytes_per_sample() {
        let mut buf = SampleBuffer::new();
        buf.append(AudioFrame::new(&[0.1; 160]));
        buf.append(AudioFrame::new(&[-0.1; 37]));

        let wav = encode_buffer(&buf, 16000);
        assert_eq!(wav.len(), 44 + 2 * 197);
        assert_eq!(read_u32(&wav, 40), 2 * 197);
        assert_eq!(read_u32(&wav, 4), 36 + 2 * 197);
    }

    #[test]
    fn quantization_boundaries() {
        assert_eq!(quantize_sample(1.0), 32767);
        assert_eq!(quantize_sample(-1.0), -32768);
        assert_eq!(quantize_sample(0.0), 0);
        assert_eq!(quantize_sample(-0.0), 0);
    }

    #[test]
    fn quantization_clamps_out_of_range() {
        assert_eq!(quantize_sample(2.5), 32767);
        assert_eq!(quantize_sample(-7.0), -32768);
    }

    #[test]
    fn quantization_truncates_toward_zero() {
        // 0.5 * 32767 = 16383.5, -0.5 * 32768 = -16384 exactly
        assert_eq!(quantize_sample(0.5), 16383);
        assert_eq!(quantize_sample(-0.5), -16384);
        // -0.25 * 32768 = -8192, 0.25 * 32767 = 8191.75
        assert_eq!(quantize_sample(0.25), 8191);
        assert_eq!(quantize_sample(-0.25), -8192);
    }

    #[test]
    fn samples_are_little_endian_in_buffer_order() {
        let mut buf = SampleBuffer::new();
        buf.append(AudioFrame::new(&[1.0, -1.0]));
        buf.append(AudioFrame::new(&[0.0]));

        let wav = encode_buffer(&buf, 16000);
        assert_eq!(&wav[44..46], &[0xFF, 0x7F]);
        assert_eq!(&wav[46..48], &[0x00, 0x80]);
        assert_eq!(pcm_at(&wav, 2), 0);
    }

    #[test]
    fn header_decodes_back() {
        let samples = vec![0.2f32; 1600];
        let wav = encode_wav(samples.iter().copied(), samples.len(), 16000);

        let info = WavInfo::parse(&wav).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.sample_count(), 1600);
        assert!((info.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn parse_rejects_truncated_and_bad_magic() {
        assert_eq!(WavInfo::parse(&[0u8; 10]), Err(WavParseError::Truncated(10)));

        let mut wav = encode_wav(std::iter::empty::<f32>(), 0, 16000);
        wav[0..4].copy_from_slice(b"RIFX");
        assert_eq!(WavInfo::parse(&wav), Err(WavParseError::BadMagic("RIFF")));
    }

    #[test]
    fn parse_rejects_size_disagreement() {
        let mut wav = encode_wav([0.0f32; 4], 4, 16000);
        wav.push(0);
        wav.push(0);
        assert!(matches!(
            WavInfo::parse(&wav),
            Err(WavParseError::RiffSizeMismatch { .. })
        ));
    }

    #[test]
    fn parse_rejects_non_pcm() {
        let mut wav = encode_wav(std::iter::empty::<f32>(), 0, 16000);
        wav[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(WavInfo::parse(&wav), Err(WavParseError::NotPcm(3)));
    }
}
