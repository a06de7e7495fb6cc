//! Fixed-length tensor preparation.

use crate::audio::{RawAudio, Sample};
use crate::error::{Error, Result};

/// Normalized model input of exactly the model's input size.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    values: Vec<f32>,
}

impl FeatureTensor {
    /// Tensor values, each within [-1, 1].
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tensor holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take ownership of the values.
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

/// Turns captured audio of any length into a [`FeatureTensor`].
///
/// Shorter audio is padded with silence, longer audio keeps its first
/// `input_size` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureShaper {
    input_size: usize,
}

impl FeatureShaper {
    /// Create a shaper producing tensors of `input_size` values.
    pub fn new(input_size: usize) -> Self {
        Self { input_size }
    }

    /// Length of every tensor this shaper produces.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Shape `raw` into a tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAudio`] if the audio is empty, has no sample
    /// rate, or contains a non-finite sample.
    pub fn shape<S: Sample>(&self, raw: &RawAudio<S>) -> Result<FeatureTensor> {
        if raw.sample_rate() == 0 {
            return Err(Error::InvalidAudio {
                reason: "sample rate is zero".to_string(),
            });
        }
        if raw.is_empty() {
            return Err(Error::InvalidAudio {
                reason: "no samples".to_string(),
            });
        }

        let mut values = Vec::with_capacity(self.input_size);
        for (index, &sample) in raw.samples().iter().take(self.input_size).enumerate() {
            let value = sample.to_f32();
            if !value.is_finite() {
                return Err(Error::InvalidAudio {
                    reason: format!("non-finite sample at index {index}"),
                });
            }
            values.push((value / S::FULL_SCALE).clamp(-1.0, 1.0));
        }

        // Pad with silence
        values.resize(self.input_size, 0.0);

        Ok(FeatureTensor { values })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_short_audio_is_zero_padded() {
        let shaper = FeatureShaper::new(8);
        let raw = RawAudio::new(vec![16_384i16, -16_384, 32_767], 16_000);

        let tensor = shaper.shape(&raw).unwrap();
        assert_eq!(tensor.len(), 8);
        assert_eq!(tensor.as_slice()[0], 0.5);
        assert_eq!(tensor.as_slice()[1], -0.5);
        assert!(tensor.as_slice()[2] > 0.999);
        assert!(tensor.as_slice()[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_long_audio_keeps_first_samples() {
        let shaper = FeatureShaper::new(4);
        let samples: Vec<f32> = (0..10u8).map(|i| f32::from(i) / 10.0).collect();
        let raw = RawAudio::new(samples, 16_000);

        let tensor = shaper.shape(&raw).unwrap();
        assert_eq!(tensor.as_slice(), &[0.0, 0.1, 0.2, 0.3]);
        assert_eq!(shaper.shape(&raw).unwrap(), tensor);
    }

    #[test]
    fn test_exact_length_passes_through() {
        let shaper = FeatureShaper::new(3);
        let raw = RawAudio::new(vec![0.25f32, -0.25, 0.0], 22_050);
        assert_eq!(shaper.shape(&raw).unwrap().as_slice(), &[0.25, -0.25, 0.0]);
    }

    #[test]
    fn test_float_samples_are_clamped() {
        let shaper = FeatureShaper::new(3);
        let raw = RawAudio::new(vec![1.5f32, -2.0, 0.5], 16_000);
        assert_eq!(shaper.shape(&raw).unwrap().as_slice(), &[1.0, -1.0, 0.5]);
    }

    #[test]
    fn test_i32_and_min_i16_normalize_into_range() {
        let shaper = FeatureShaper::new(2);
        let raw = RawAudio::new(vec![i32::MIN, 1 << 30], 48_000);
        assert_eq!(shaper.shape(&raw).unwrap().as_slice(), &[-1.0, 0.5]);

        let raw = RawAudio::new(vec![i16::MIN], 48_000);
        assert_eq!(shaper.shape(&raw).unwrap().as_slice(), &[-1.0, 0.0]);
    }

    #[test]
    fn test_empty_audio_is_invalid() {
        let shaper = FeatureShaper::new(4);
        let raw = RawAudio::<f32>::new(Vec::new(), 16_000);
        assert!(matches!(shaper.shape(&raw), Err(Error::InvalidAudio { .. })));
    }

    #[test]
    fn test_zero_sample_rate_is_invalid() {
        let shaper = FeatureShaper::new(4);
        let raw = RawAudio::new(vec![0.1f32], 0);
        assert!(matches!(shaper.shape(&raw), Err(Error::InvalidAudio { .. })));
    }

    #[test]
    fn test_nan_sample_is_invalid() {
        let shaper = FeatureShaper::new(4);
        let raw = RawAudio::new(vec![0.1, f32::NAN], 16_000);
        assert!(matches!(shaper.shape(&raw), Err(Error::InvalidAudio { .. })));
    }

    #[test]
    fn test_nan_past_input_size_is_ignored() {
        let shaper = FeatureShaper::new(1);
        let raw = RawAudio::new(vec![0.1, f32::NAN], 16_000);
        assert_eq!(shaper.shape(&raw).unwrap().as_slice(), &[0.1]);
    }

    #[test]
    fn test_twenty_thousand_zeros_become_input_size_zeros() {
        let shaper = FeatureShaper::new(15_600);
        let raw = RawAudio::new(vec![0i16; 20_000], 16_000);
        let tensor = shaper.shape(&raw).unwrap();
        assert_eq!(tensor.len(), 15_600);
        assert!(tensor.as_slice().iter().all(|&v| v == 0.0));
    }
}
