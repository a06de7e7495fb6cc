//! One capture-to-result cycle.
//!
//! A [`RecordingSession`] moves through
//! `Idle -> Capturing -> Processing -> Completed | Failed -> Idle`.
//! While capturing, a collector task owns the [`AudioBuffer`] and appends
//! whatever the capture source pushes through the bounded channel. Stopping
//! signals the collector, drains what is still queued, freezes the buffer and
//! classifies it on the blocking pool.

mod state;

pub use state::SessionState;

use crate::audio::{AudioBuffer, CaptureSender, RawAudio};
use crate::config::CaptureConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::inference::{ClassificationEngine, ClassificationResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

/// What a finished processing task hands back.
type Outcome = Result<(ClassificationResult, RawAudio<f32>)>;

/// Collector task for the current capture window.
struct ActiveCapture {
    stop_tx: oneshot::Sender<()>,
    collector: JoinHandle<AudioBuffer<f32>>,
}

/// State machine owning one capture-to-result cycle at a time.
pub struct RecordingSession {
    engine: Arc<ClassificationEngine>,
    capture_config: CaptureConfig,
    state_tx: watch::Sender<SessionState>,
    active: Option<ActiveCapture>,
    processing: Option<JoinHandle<Outcome>>,
    result: Option<ClassificationResult>,
    failure: Option<Error>,
    audio: Option<RawAudio<f32>>,
}

impl RecordingSession {
    /// Create an idle session.
    pub fn new(engine: Arc<ClassificationEngine>, capture_config: CaptureConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            engine,
            capture_config,
            state_tx,
            active: None,
            processing: None,
            result: None,
            failure: None,
            audio: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Result of the last cycle, if it completed.
    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    /// Error of the last cycle, if it failed.
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Kind of the last failure.
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(Error::kind)
    }

    /// Audio frozen by the last `stop`, kept until `reset`.
    pub fn captured_audio(&self) -> Option<&RawAudio<f32>> {
        self.audio.as_ref()
    }

    /// Engine used for classification.
    pub fn engine(&self) -> &Arc<ClassificationEngine> {
        &self.engine
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state_tx.send_replace(state);
        debug!("Session {previous} -> {state}");
    }

    /// Begin capturing into a fresh buffer.
    ///
    /// Returns the push handle for the capture source. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRecording`] unless the session is idle.
    pub fn start(&mut self) -> Result<CaptureSender> {
        if self.state() != SessionState::Idle {
            return Err(Error::AlreadyRecording);
        }

        let sample_rate = self.engine.sample_rate();
        let buffer = AudioBuffer::with_max_duration(sample_rate, self.capture_config.max_duration_secs);
        let (tx, rx) = mpsc::channel(self.capture_config.channel_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();

        let collector = tokio::spawn(collect(buffer, rx, stop_rx));
        self.active = Some(ActiveCapture { stop_tx, collector });
        self.set_state(SessionState::Capturing);
        info!("Capture started at {sample_rate} Hz");

        Ok(CaptureSender::new(tx, sample_rate))
    }

    /// Stop capturing and classify what was captured.
    ///
    /// Capture and classification failures do not make this call fail: they
    /// move the session to [`SessionState::Failed`] and are available from
    /// [`failure`](Self::failure).
    ///
    /// The work runs in its own task. If this future is dropped before it
    /// resolves, the session stays in [`SessionState::Processing`] until
    /// [`settle`](Self::settle) collects the outcome or [`reset`](Self::reset)
    /// is called after the task has finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRecording`] unless the session is capturing.
    pub async fn stop(&mut self) -> Result<SessionState> {
        if self.state() != SessionState::Capturing {
            return Err(Error::NotRecording);
        }
        let Some(active) = self.active.take() else {
            return Err(Error::NotRecording);
        };

        self.set_state(SessionState::Processing);
        self.processing = Some(tokio::spawn(finish_capture(
            active,
            Arc::clone(&self.engine),
        )));

        Ok(self.settle().await)
    }

    /// Wait for classification started by [`stop`](Self::stop) and return
    /// the resulting state.
    ///
    /// Returns the current state right away when nothing is processing.
    /// Dropping this future leaves the task pending for a later call.
    pub async fn settle(&mut self) -> SessionState {
        let Some(handle) = self.processing.as_mut() else {
            return self.state();
        };
        let joined = handle.await;
        self.processing = None;
        self.conclude(joined)
    }

    fn conclude(&mut self, joined: std::result::Result<Outcome, JoinError>) -> SessionState {
        let outcome = joined.unwrap_or_else(|e| {
            Err(Error::Internal {
                message: format!("processing task failed: {e}"),
            })
        });

        let state = match outcome {
            Ok((result, audio)) => {
                info!(
                    "Identified {} ({:.1}%)",
                    result.label(),
                    result.confidence() * 100.0
                );
                self.result = Some(result);
                self.audio = Some(audio);
                SessionState::Completed
            }
            Err(e) => {
                error!("Identification failed: {e}");
                self.failure = Some(e);
                SessionState::Failed
            }
        };

        self.set_state(state);
        state
    }

    /// Return to idle.
    ///
    /// Discards the last result or failure. An ongoing capture is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionBusy`] while classification is running.
    pub fn reset(&mut self) -> Result<()> {
        match self.state() {
            SessionState::Idle => return Ok(()),
            SessionState::Processing => {
                if self
                    .processing
                    .as_ref()
                    .is_some_and(|handle| !handle.is_finished())
                {
                    return Err(Error::SessionBusy);
                }
                self.processing = None;
            }
            SessionState::Capturing => {
                if let Some(active) = self.active.take() {
                    active.collector.abort();
                }
                info!("Capture abandoned");
            }
            SessionState::Completed | SessionState::Failed => {}
        }

        self.result = None;
        self.failure = None;
        self.audio = None;
        self.set_state(SessionState::Idle);
        Ok(())
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("state", &self.state())
            .field("result", &self.result)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

/// Stop the collector, freeze its buffer and classify it on the blocking pool.
async fn finish_capture(active: ActiveCapture, engine: Arc<ClassificationEngine>) -> Outcome {
    // The collector may already have exited if every sender was dropped
    let _ = active.stop_tx.send(());
    let buffer = active.collector.await.map_err(|e| Error::Internal {
        message: format!("capture task failed: {e}"),
    })?;

    if buffer.dropped() > 0 {
        warn!(
            "{} samples beyond the capture limit were discarded",
            buffer.dropped()
        );
    }
    let raw = buffer.finalize()?;
    debug!("Captured {:.2}s of audio", raw.duration_secs());

    let start = Instant::now();
    let (result, raw) = tokio::task::spawn_blocking(move || {
        let result = engine.classify(&raw);
        (result, raw)
    })
    .await
    .map_err(|e| Error::Internal {
        message: format!("classification task failed: {e}"),
    })?;
    debug!("Classification took {:?}", start.elapsed());

    Ok((result?, raw))
}

/// Append pushed chunks until told to stop, then drain the queue.
async fn collect(
    mut buffer: AudioBuffer<f32>,
    mut rx: mpsc::Receiver<Vec<f32>>,
    mut stop_rx: oneshot::Receiver<()>,
) -> AudioBuffer<f32> {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            chunk = rx.recv() => match chunk {
                Some(chunk) => {
                    buffer.append(&chunk);
                }
                None => {
                    debug!("Capture source finished");
                    let _ = stop_rx.await;
                    return buffer;
                }
            },
        }
    }

    rx.close();
    while let Ok(chunk) = rx.try_recv() {
        buffer.append(&chunk);
    }
    buffer
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::inference::{LabelTable, ModelHandle, ScoringModel};
    use std::time::Duration;

    struct Fixed(Vec<f32>);

    impl ScoringModel for Fixed {
        fn input_size(&self) -> usize {
            16
        }

        fn score(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct Slow(Duration);

    impl ScoringModel for Slow {
        fn input_size(&self) -> usize {
            16
        }

        fn score(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
            std::thread::sleep(self.0);
            Ok(vec![0.1, 0.7, 0.05, 0.15])
        }
    }

    fn slow_session(delay: Duration) -> RecordingSession {
        let model = ModelHandle::from_model(Box::new(Slow(delay)));
        let engine = ClassificationEngine::new(Arc::new(model), LabelTable::default(), 16, 16_000);
        RecordingSession::new(Arc::new(engine), CaptureConfig::default())
    }

    fn session() -> RecordingSession {
        let model = ModelHandle::from_model(Box::new(Fixed(vec![0.1, 0.7, 0.05, 0.15])));
        let engine = ClassificationEngine::new(Arc::new(model), LabelTable::default(), 16, 16_000);
        RecordingSession::new(Arc::new(engine), CaptureConfig::default())
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.result().is_none());
        assert!(session.failure().is_none());
    }

    #[tokio::test]
    async fn test_start_stop_completes() {
        let mut session = session();
        let sender = session.start().unwrap();
        sender.push(vec![0.0; 64]).await.unwrap();

        assert_eq!(session.stop().await.unwrap(), SessionState::Completed);
        assert_eq!(session.result().unwrap().label(), "Sparrow");
        assert_eq!(session.captured_audio().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_stop_drains_queued_chunks() {
        let mut session = session();
        let sender = session.start().unwrap();
        for _ in 0..10 {
            assert!(sender.try_push(vec![0.5; 8]).unwrap());
        }

        session.stop().await.unwrap();
        assert_eq!(session.captured_audio().unwrap().len(), 80);
    }

    #[tokio::test]
    async fn test_stop_without_samples_fails_with_empty_buffer() {
        let mut session = session();
        let _sender = session.start().unwrap();

        assert_eq!(session.stop().await.unwrap(), SessionState::Failed);
        assert_eq!(session.failure_kind(), Some(ErrorKind::EmptyBuffer));
    }

    #[tokio::test]
    async fn test_capture_is_capped() {
        let model = ModelHandle::from_model(Box::new(Fixed(vec![0.1, 0.7, 0.05, 0.15])));
        let engine = ClassificationEngine::new(Arc::new(model), LabelTable::default(), 16, 100);
        let config = CaptureConfig {
            max_duration_secs: 1.0,
            ..CaptureConfig::default()
        };
        let mut session = RecordingSession::new(Arc::new(engine), config);

        let sender = session.start().unwrap();
        sender.push(vec![0.1; 80]).await.unwrap();
        sender.push(vec![0.1; 80]).await.unwrap();
        session.stop().await.unwrap();

        assert_eq!(session.captured_audio().unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_reset_while_capturing_abandons_capture() {
        let mut session = session();
        let sender = session.start().unwrap();
        sender.push(vec![0.0; 32]).await.unwrap();

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.captured_audio().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let mut session = session();
        let mut rx = session.subscribe();

        let sender = session.start().unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Capturing);

        sender.push(vec![0.0; 16]).await.unwrap();
        session.stop().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Completed);

        session.reset().unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Idle);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Processing.to_string(), "processing");
        assert!(SessionState::Failed.is_finished());
        assert!(!SessionState::Capturing.is_finished());
    }

    #[tokio::test]
    async fn test_cancelled_stop_can_be_reset_once_processing_ends() {
        let mut session = slow_session(Duration::from_millis(200));
        let sender = session.start().unwrap();
        sender.push(vec![0.0; 32]).await.unwrap();

        let cancelled = tokio::time::timeout(Duration::from_millis(20), session.stop()).await;
        assert!(cancelled.is_err());
        assert_eq!(session.state(), SessionState::Processing);
        assert!(matches!(session.reset(), Err(Error::SessionBusy)));

        let mut reset = session.reset();
        for _ in 0..100 {
            if reset.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            reset = session.reset();
        }
        reset.unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.start().is_ok());
    }

    #[tokio::test]
    async fn test_settle_collects_result_of_cancelled_stop() {
        let mut session = slow_session(Duration::from_millis(100));
        let sender = session.start().unwrap();
        sender.push(vec![0.0; 32]).await.unwrap();

        let cancelled = tokio::time::timeout(Duration::from_millis(10), session.stop()).await;
        assert!(cancelled.is_err());

        assert_eq!(session.settle().await, SessionState::Completed);
        assert_eq!(session.result().unwrap().label(), "Sparrow");
        assert!(matches!(session.stop().await, Err(Error::NotRecording)));
    }

    #[tokio::test]
    async fn test_settle_without_processing_returns_state() {
        let mut session = session();
        assert_eq!(session.settle().await, SessionState::Idle);
    }
}
