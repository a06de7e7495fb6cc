//! WAV clips of identified recordings.

use crate::audio::RawAudio;
use crate::error::{Error, Result};
use crate::inference::ClassificationResult;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `audio` into `dir` as a 16-bit mono WAV named after the result.
///
/// Names are `<timestamp>_<label>.wav`; a numeric suffix is added when that
/// file already exists.
pub fn write_clip(
    dir: &Path,
    result: &ClassificationResult,
    audio: &RawAudio<f32>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let stem = format!(
        "{}_{}",
        result.timestamp().format("%Y%m%dT%H%M%S%3f"),
        sanitize_filename(result.label())
    );
    let path = unused_path(dir, &stem);
    write_wav_file(&path, audio)?;
    Ok(path)
}

fn unused_path(dir: &Path, stem: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}.wav"));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{stem}_{n}.wav"));
        n += 1;
    }
    path
}

/// Replace characters that are invalid in filenames and prevent traversal.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect();

    sanitized.replace("..", "__")
}

fn write_wav_file(path: &Path, audio: &RawAudio<f32>) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let wav_err = |e| Error::WavWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_err)?;
    for &sample in audio.samples() {
        #[allow(clippy::cast_possible_truncation)]
        let sample_i16 = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(sample_i16).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Blue Jay"), "Blue_Jay");
        assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
        assert_eq!(sanitize_filename("../etc"), "___etc");
    }

    #[test]
    fn test_existing_clip_gets_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_Robin.wav"), b"").unwrap();
        fs::write(dir.path().join("a_Robin_2.wav"), b"").unwrap();
        assert_eq!(
            unused_path(dir.path(), "a_Robin"),
            dir.path().join("a_Robin_3.wav")
        );
    }

    #[test]
    fn test_write_clip_round_trips_samples() {
        let dir = TempDir::new().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap();
        let result = ClassificationResult::new("Robin", 0.9, ts);
        let audio = RawAudio::new(vec![0.0, 0.5, -0.5, 1.0], 16_000);

        let path = write_clip(dir.path(), &result, &audio).unwrap();
        assert!(path.ends_with("20240501T063000000_Robin.wav"));

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -16383, 32767]);
    }
}
