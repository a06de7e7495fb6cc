//! Capture buffer and frozen raw audio.

use crate::constants::full_scale;
use crate::error::{Error, Result};
use tracing::warn;

/// A PCM sample type the pipeline can normalize.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Magnitude that maps to 1.0 after normalization.
    const FULL_SCALE: f32;

    /// Widen to `f32` without rescaling.
    fn to_f32(self) -> f32;
}

impl Sample for i16 {
    const FULL_SCALE: f32 = full_scale::I16;

    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for i32 {
    const FULL_SCALE: f32 = full_scale::I32;

    #[allow(clippy::cast_precision_loss)]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Sample for f32 {
    const FULL_SCALE: f32 = 1.0;

    fn to_f32(self) -> f32 {
        self
    }
}

/// Audio captured during one capture window, frozen once capture stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio<S = f32> {
    samples: Vec<S>,
    sample_rate: u32,
}

impl<S: Sample> RawAudio<S> {
    /// Wrap already-captured samples.
    pub fn new(samples: Vec<S>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Captured samples.
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples were captured.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Accumulates samples for one capture window.
///
/// The buffer never grows past `max_samples`; anything appended beyond the
/// cap is dropped and counted.
#[derive(Debug)]
pub struct AudioBuffer<S = f32> {
    samples: Vec<S>,
    sample_rate: u32,
    max_samples: usize,
    dropped: usize,
}

impl<S: Sample> AudioBuffer<S> {
    /// Create an empty buffer for audio at `sample_rate`, capped at `max_samples`.
    pub fn new(sample_rate: u32, max_samples: usize) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            max_samples,
            dropped: 0,
        }
    }

    /// Create a buffer capped at `max_duration_secs` of audio.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn with_max_duration(sample_rate: u32, max_duration_secs: f32) -> Self {
        let max_samples = (max_duration_secs.max(0.0) * sample_rate as f32) as usize;
        Self::new(sample_rate, max_samples)
    }

    /// Append a chunk, returning how many samples were kept.
    pub fn append(&mut self, chunk: &[S]) -> usize {
        let room = self.max_samples.saturating_sub(self.samples.len());
        let kept = chunk.len().min(room);
        self.samples.extend_from_slice(&chunk[..kept]);

        let overflow = chunk.len() - kept;
        if overflow > 0 {
            if self.dropped == 0 {
                warn!(
                    "Capture reached its limit of {} samples, further audio is dropped",
                    self.max_samples
                );
            }
            self.dropped += overflow;
        }
        kept
    }

    /// Samples held so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been kept yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the cap has been reached.
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.max_samples
    }

    /// Samples discarded because the cap was reached.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Sample rate of the captured audio.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Freeze the buffer into [`RawAudio`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBuffer`] if nothing was ever kept.
    pub fn finalize(self) -> Result<RawAudio<S>> {
        if self.samples.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        Ok(RawAudio::new(self.samples, self.sample_rate))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_append_accumulates_in_order() {
        let mut buffer = AudioBuffer::<i16>::new(16_000, 100);
        assert_eq!(buffer.append(&[1, 2, 3]), 3);
        assert_eq!(buffer.append(&[4, 5]), 2);

        let raw = buffer.finalize().unwrap();
        assert_eq!(raw.samples(), &[1, 2, 3, 4, 5]);
        assert_eq!(raw.sample_rate(), 16_000);
    }

    #[test]
    fn test_append_truncates_at_cap() {
        let mut buffer = AudioBuffer::<f32>::new(8_000, 4);
        assert_eq!(buffer.append(&[0.1, 0.2, 0.3]), 3);
        assert_eq!(buffer.append(&[0.4, 0.5, 0.6]), 1);
        assert!(buffer.is_full());
        assert_eq!(buffer.append(&[0.7]), 0);
        assert_eq!(buffer.dropped(), 3);

        let raw = buffer.finalize().unwrap();
        assert_eq!(raw.samples(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_finalize_empty_buffer_fails() {
        let buffer = AudioBuffer::<f32>::new(16_000, 10);
        assert!(matches!(buffer.finalize(), Err(Error::EmptyBuffer)));
    }

    #[test]
    fn test_finalize_after_empty_chunks_fails() {
        let mut buffer = AudioBuffer::<f32>::new(16_000, 10);
        buffer.append(&[]);
        assert!(matches!(buffer.finalize(), Err(Error::EmptyBuffer)));
    }

    #[test]
    fn test_with_max_duration() {
        let mut buffer = AudioBuffer::<f32>::with_max_duration(16_000, 2.5);
        let chunk = vec![0.0; 50_000];
        assert_eq!(buffer.append(&chunk), 40_000);
    }

    #[test]
    fn test_raw_audio_duration() {
        let raw = RawAudio::new(vec![0.0f32; 24_000], 16_000);
        assert_eq!(raw.duration_secs(), 1.5);
        assert_eq!(RawAudio::new(vec![0.0f32; 10], 0).duration_secs(), 0.0);
    }
}
