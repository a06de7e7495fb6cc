//! Capture delivery.
//!
//! A capture source pushes sample chunks through a bounded channel; the
//! receiving end belongs to the active recording session, which appends them
//! to its [`AudioBuffer`](crate::audio::AudioBuffer). Delivery cadence is
//! decoupled from buffer mutation: a full channel makes [`CaptureSender::push`]
//! wait and makes [`CaptureSender::try_push`] drop the chunk.

use crate::audio::{decode_audio_file, resample};
use crate::error::{Error, Result};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Push handle given to a capture source for one capture window.
#[derive(Debug, Clone)]
pub struct CaptureSender {
    tx: mpsc::Sender<Vec<f32>>,
    sample_rate: u32,
}

impl CaptureSender {
    pub(crate) fn new(tx: mpsc::Sender<Vec<f32>>, sample_rate: u32) -> Self {
        Self { tx, sample_rate }
    }

    /// Sample rate the session expects chunks to be in.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Push a chunk, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureClosed`] once the session has stopped capturing.
    pub async fn push(&self, chunk: Vec<f32>) -> Result<()> {
        self.tx.send(chunk).await.map_err(|_| Error::CaptureClosed)
    }

    /// Push a chunk without waiting.
    ///
    /// Returns `Ok(false)` when the channel is full and the chunk was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureClosed`] once the session has stopped capturing.
    pub fn try_push(&self, chunk: Vec<f32>) -> Result<bool> {
        match self.tx.try_send(chunk) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::CaptureClosed),
        }
    }

    /// Whether the session has stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Something that produces audio for a capture window.
///
/// `run` returns when the source is exhausted or the session stops
/// listening; dropping the sender signals teardown.
pub trait CaptureSource: Send + 'static {
    /// Stream audio into `sender`, returning the number of samples delivered.
    fn run(self, sender: CaptureSender) -> impl Future<Output = Result<usize>> + Send;
}

/// Capture source that replays a recording from disk.
///
/// The file is decoded, downmixed to mono and resampled to the session's
/// sample rate before being pushed in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
    chunk_size: usize,
    realtime: bool,
}

impl FileCapture {
    /// Replay `path` in chunks of `chunk_size` samples.
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size: chunk_size.max(1),
            realtime: false,
        }
    }

    /// Pace chunks at the recording's own speed instead of as fast as possible.
    #[must_use]
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }
}

impl CaptureSource for FileCapture {
    async fn run(self, sender: CaptureSender) -> Result<usize> {
        let target_rate = sender.sample_rate();
        let path = self.path.clone();

        let audio = tokio::task::spawn_blocking(move || {
            let decoded = decode_audio_file(&path)?;
            resample(decoded, target_rate)
        })
        .await
        .map_err(|e| Error::Internal {
            message: format!("decode task failed: {e}"),
        })??;

        info!(
            "Replaying {} ({:.1}s)",
            self.path.display(),
            audio.duration_secs()
        );

        #[allow(clippy::cast_precision_loss)]
        let pace = Duration::from_secs_f64(self.chunk_size as f64 / f64::from(target_rate.max(1)));

        let mut delivered = 0;
        for chunk in audio.samples().chunks(self.chunk_size) {
            if sender.push(chunk.to_vec()).await.is_err() {
                debug!("Session stopped listening after {delivered} samples");
                break;
            }
            delivered += chunk.len();
            if self.realtime {
                tokio::time::sleep(pace).await;
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_push_reports_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = CaptureSender::new(tx, 16_000);

        assert!(sender.try_push(vec![0.1]).unwrap());
        assert!(!sender.try_push(vec![0.2]).unwrap());
        assert_eq!(rx.recv().await.unwrap(), vec![0.1]);
    }

    #[tokio::test]
    async fn test_push_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::channel(4);
        let sender = CaptureSender::new(tx, 16_000);
        drop(rx);

        assert!(sender.is_closed());
        assert!(matches!(
            sender.push(vec![0.0]).await,
            Err(Error::CaptureClosed)
        ));
        assert!(matches!(
            sender.try_push(vec![0.0]),
            Err(Error::CaptureClosed)
        ));
    }

    #[tokio::test]
    async fn test_file_capture_missing_file_fails() {
        let (tx, _rx) = mpsc::channel(4);
        let sender = CaptureSender::new(tx, 16_000);
        let source = FileCapture::new("/nonexistent/clip.wav", 256);
        assert!(matches!(
            source.run(sender).await,
            Err(Error::AudioOpen { .. })
        ));
    }
}
