/// Converts native device buffers into the mono frames the core expects.
///
/// Devices rarely offer 16 kHz mono directly, so each delivery is downmixed
/// by averaging channels and then resampled with linear interpolation.
/// The resampler keeps its fractional read position and the last sample of
/// the previous buffer between calls, so consecutive buffers form one
/// continuous signal regardless of buffer size. Use one converter per stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConverter {
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,
    /// Next read position in source samples, relative to the start of the
    /// next buffer. `-1.0 <= position`; negative values fall between
    /// `previous` and the next buffer's first sample.
    position: f64,
    previous: Option<f32>,
}

impl FrameConverter {
    pub fn new(source_rate: u32, source_channels: u16, target_rate: u32) -> Self {
        Self {
            source_rate,
            source_channels: source_channels.max(1),
            target_rate,
            position: 0.0,
            previous: None,
        }
    }

    /// Whether buffers pass through untouched.
    pub fn is_passthrough(&self) -> bool {
        self.source_channels == 1 && self.source_rate == self.target_rate
    }

    /// Convert one interleaved device buffer to mono at the target rate.
    pub fn convert(&mut self, interleaved: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return interleaved.to_vec();
        }
        let mono = downmix_to_mono(interleaved, self.source_channels as usize);
        if self.source_rate == self.target_rate || self.source_rate == 0 || self.target_rate == 0 {
            return mono;
        }
        self.resample(&mono)
    }

    /// Linear interpolation over the stream seen so far. Output for the
    /// tail of a buffer is produced once the next buffer supplies the right
    /// neighbour.
    fn resample(&mut self, samples: &[f32]) -> Vec<f32> {
        let Some(&last) = samples.last() else {
            return Vec::new();
        };
        let step = self.source_rate as f64 / self.target_rate as f64;
        let len = samples.len() as f64;
        let previous = self.previous.unwrap_or(samples[0]);

        let mut output = Vec::with_capacity((len / step) as usize + 1);
        let mut position = self.position;
        while position < len - 1.0 {
            let base = position.floor();
            let fraction = (position - base) as f32;
            let index = base as isize;
            let left = if index < 0 { previous } else { samples[index as usize] };
            let right = samples[(index + 1) as usize];
            output.push(left * (1.0 - fraction) + right * fraction);
            position += step;
        }

        self.position = position - len;
        self.previous = Some(last);
        output
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn downmix_stereo_to_mono() {
        let mono = downmix_to_mono(&[0.2, 0.8, 0.4, 0.6], 2);
        assert_eq!(mono.len(), 2);
        assert_abs_diff_eq!(mono[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(mono[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn downmix_drops_incomplete_trailing_frame() {
        let mono = downmix_to_mono(&[0.2, 0.4, 0.9], 2);
        assert_eq!(mono.len(), 1);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn stereo_at_target_rate_is_only_downmixed() {
        let mut conv = FrameConverter::new(16000, 2, 16000);
        assert!(!conv.is_passthrough());
        assert_eq!(conv.convert(&[0.2, 0.4, -0.5, -0.5]).len(), 2);
    }

    #[test]
    fn resample_48k_to_16k() {
        let samples: Vec<f32> = (0..480).map(|i| i as f32 / 480.0).collect();
        let mut conv = FrameConverter::new(48000, 1, 16000);
        let result = conv.convert(&samples);

        // 10 ms at 48 kHz → 10 ms at 16 kHz
        assert_eq!(result.len(), 160);
        assert_abs_diff_eq!(result[1], samples[3], epsilon = 1e-6);
    }

    #[test]
    fn upsampling_interpolates_across_buffers() {
        let mut conv = FrameConverter::new(8000, 1, 16000);
        let first = conv.convert(&[0.0, 1.0]);
        let second = conv.convert(&[2.0, 3.0]);

        assert_eq!(first, vec![0.0, 0.5]);
        assert_eq!(second.len(), 4);
        for (got, want) in second.iter().zip([1.0, 1.5, 2.0, 2.5]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn odd_sized_buffers_keep_total_length() {
        // 3 s at 44.1 kHz in 512-sample device buffers.
        let mut conv = FrameConverter::new(44100, 1, 16000);
        let buffers = 258;
        let input = buffers * 512;
        let produced: usize = (0..buffers).map(|_| conv.convert(&[0.25; 512]).len()).sum();

        let expected = input as u64 * 16000 / 44100;
        assert!(
            produced as u64 >= expected && produced as u64 <= expected + 1,
            "produced {} samples, expected about {}",
            produced,
            expected
        );
    }

    #[test]
    fn ramp_stays_continuous_over_buffer_boundaries() {
        let total = 64 * 512;
        let ramp: Vec<f32> = (0..total).map(|n| n as f32 / total as f32).collect();
        let mut conv = FrameConverter::new(44100, 1, 16000);
        let output: Vec<f32> = ramp.chunks(512).flat_map(|chunk| conv.convert(chunk)).collect();

        let step = 44100.0 / 16000.0;
        for (k, &sample) in output.iter().enumerate() {
            let want = (k as f64 * step / total as f64) as f32;
            assert_abs_diff_eq!(sample, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn converter_handles_stereo_44k1() {
        let mut conv = FrameConverter::new(44100, 2, 16000);
        assert!(!conv.is_passthrough());

        let stereo = vec![0.5f32; 441 * 2];
        let out = conv.convert(&stereo);
        assert_eq!(out.len(), 160);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn converter_passthrough_for_native_16k_mono() {
        let mut conv = FrameConverter::new(16000, 1, 16000);
        assert!(conv.is_passthrough());
        assert_eq!(conv.convert(&[0.1, -0.1]), vec![0.1, -0.1]);
    }
}
