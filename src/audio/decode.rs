//! Audio file decoding using symphonia.

use crate::audio::RawAudio;
use crate::constants::full_scale;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer as SymphoniaBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample as SymphoniaSample;
use tracing::debug;

/// Decode an audio file (WAV, FLAC, MP3, AAC) to mono f32 samples in [-1, 1].
pub fn decode_audio_file(path: &Path) -> Result<RawAudio<f32>> {
    let open_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::AudioOpen {
        path: path.to_path_buf(),
        source: e,
    };
    let decode_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::AudioDecode {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(|e| open_err(Box::new(e)))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| open_err(Box::new(e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::NoAudioTracks {
            path: path.to_path_buf(),
        })?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err("missing sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(Box::new(e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(Box::new(e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| decode_err(Box::new(e)))?;
        append_mono(&decoded, &mut samples);
    }

    debug!(
        "Decoded {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    Ok(RawAudio::new(samples, sample_rate))
}

/// Downmix a decoded packet to mono and append it.
fn append_mono(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::F32(buf) => mix_into(buf, output, |s| s),
        AudioBufferRef::S16(buf) => mix_into(buf, output, |s| f32::from(s) / full_scale::I16),
        #[allow(clippy::cast_precision_loss)]
        AudioBufferRef::S32(buf) => mix_into(buf, output, |s| s as f32 / full_scale::I32),
        _ => {
            debug!("Skipping packet with unsupported sample format");
        }
    }
}

fn mix_into<S, F>(buf: &SymphoniaBuffer<S>, output: &mut Vec<f32>, convert: F)
where
    S: SymphoniaSample,
    F: Fn(S) -> f32,
{
    let channels = buf.spec().channels.count().max(1);
    if channels == 1 {
        output.extend(buf.chan(0).iter().map(|&s| convert(s)));
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / channels as f32;
    for frame in 0..buf.frames() {
        let sum: f32 = (0..channels).map(|ch| convert(buf.chan(ch)[frame])).sum();
        output.push(sum * scale);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, frames: &[[i16; 2]]) {
        let spec = WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in &frame[..usize::from(channels)] {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_mono_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[[16_384, 0], [-16_384, 0], [0, 0]]);

        let raw = decode_audio_file(&path).unwrap();
        assert_eq!(raw.sample_rate(), 16_000);
        assert_eq!(raw.len(), 3);
        assert!((raw.samples()[0] - 0.5).abs() < 1e-6);
        assert!((raw.samples()[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_stereo_wav_downmixes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[[16_384, 0], [16_384, 16_384]]);

        let raw = decode_audio_file(&path).unwrap();
        assert_eq!(raw.len(), 2);
        assert!((raw.samples()[0] - 0.25).abs() < 1e-6);
        assert!((raw.samples()[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_audio_file(Path::new("/nonexistent/recording.wav"));
        assert!(matches!(result, Err(Error::AudioOpen { .. })));
    }
}
