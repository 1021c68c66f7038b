use crate::models::audio_models::AudioFrame;

/// Append-only, ordered store of the frames captured in one session.
///
/// Insertion order is temporal order. The buffer is cleared when a session
/// starts and consumed exactly once when it ends; wrap in
/// `parking_lot::Mutex` for cross-thread access.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    frames: Vec<AudioFrame>,
    sample_count: usize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for a session of `expected_samples` in frames of
    /// `typical_frame_len`.
    pub fn with_capacity(expected_samples: usize, typical_frame_len: usize) -> Self {
        let frames = expected_samples / typical_frame_len.max(1) + 1;
        Self {
            frames: Vec::with_capacity(frames),
            sample_count: 0,
        }
    }

    pub fn append(&mut self, frame: AudioFrame) {
        self.sample_count += frame.len();
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[AudioFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total samples across all frames.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.sample_count = 0;
    }

    /// Flatten every frame, in order, into one sample sequence.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.frames.iter().flat_map(|f| f.samples().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut buf = SampleBuffer::new();
        buf.append(AudioFrame::new(&[1.0, 2.0]));
        buf.append(AudioFrame::new(&[3.0]));
        buf.append(AudioFrame::new(&[4.0, 5.0, 6.0]));

        assert_eq!(buf.frame_count(), 3);
        assert_eq!(buf.sample_count(), 6);
        assert_eq!(buf.samples().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_frames_are_kept_but_add_no_samples() {
        let mut buf = SampleBuffer::new();
        buf.append(AudioFrame::new(&[]));
        assert_eq!(buf.frame_count(), 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn clear_resets_counts() {
        let mut buf = SampleBuffer::with_capacity(48000, 480);
        buf.append(AudioFrame::new(&[0.5; 480]));
        buf.clear();

        assert!(buf.is_empty());
        assert_eq!(buf.frame_count(), 0);
        assert_eq!(buf.samples().count(), 0);
    }
}
