//! Audio capture and tensor preparation.

mod buffer;
mod capture;
mod decode;
mod resample;
mod shaper;

pub use buffer::{AudioBuffer, RawAudio, Sample};
pub use capture::{CaptureSender, CaptureSource, FileCapture};
pub use decode::decode_audio_file;
pub use resample::resample;
pub use shaper::{FeatureShaper, FeatureTensor};
