//! Audio resampling using rubato.

use crate::audio::RawAudio;
use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};
use tracing::debug;

const CHUNK_SIZE: usize = 1024;
const CHANNELS: usize = 1;

/// Resample mono audio to `to_rate`.
///
/// Returns the input unchanged if it is already at the target rate.
pub fn resample(audio: RawAudio<f32>, to_rate: u32) -> Result<RawAudio<f32>> {
    let from_rate = audio.sample_rate();
    if from_rate == to_rate || audio.is_empty() {
        return Ok(audio);
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Resample {
            reason: format!("cannot resample from {from_rate} Hz to {to_rate} Hz"),
        });
    }

    debug!("Resampling {} samples from {from_rate} Hz to {to_rate} Hz", audio.len());

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        1,
        CHANNELS,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let block = resampler.input_frames_next();
    let samples = audio.samples();
    let expected = scaled_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(expected + CHUNK_SIZE);

    let mut blocks = samples.chunks_exact(block);
    for chunk in blocks.by_ref() {
        output.extend(process_block(&mut resampler, chunk, block)?);
    }

    // Pad the tail block and keep only the proportional share of its output
    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut padded = tail.to_vec();
        padded.resize(block, 0.0);
        let resampled = process_block(&mut resampler, &padded, block)?;
        let take = scaled_len(tail.len(), from_rate, to_rate).min(resampled.len());
        output.extend_from_slice(&resampled[..take]);
    }

    Ok(RawAudio::new(output, to_rate))
}

fn process_block(resampler: &mut Fft<f32>, chunk: &[f32], frames: usize) -> Result<Vec<f32>> {
    let input = SequentialSlice::new(chunk, CHANNELS, frames).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&input, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;
    Ok(resampled.take_data())
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    (len as f64 * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize
}
