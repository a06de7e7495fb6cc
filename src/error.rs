//! Error types for birdlog.

use std::path::PathBuf;

/// Result type alias for birdlog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for birdlog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Data directory could not be determined.
    #[error("could not determine data directory for this platform")]
    DataDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Capture finished without a single sample.
    #[error("capture buffer is empty")]
    EmptyBuffer,

    /// Audio cannot be shaped into a model tensor.
    #[error("invalid audio: {reason}")]
    InvalidAudio {
        /// Why the audio was rejected.
        reason: String,
    },

    /// Model could not be loaded.
    #[error("failed to load model from '{path}': {reason}")]
    ModelLoad {
        /// Model source path.
        path: PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Tensor or score vector has the wrong length.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// No model is loaded in the handle.
    #[error("no classification model is loaded")]
    ModelUnavailable,

    /// `start` was called while a session was not idle.
    #[error("a recording session is already active")]
    AlreadyRecording,

    /// `stop` was called while no capture was running.
    #[error("no recording in progress")]
    NotRecording,

    /// `reset` was called while classification was still running.
    #[error("classification in progress, wait for it to finish")]
    SessionBusy,

    /// Capture channel receiver is gone.
    #[error("capture channel closed")]
    CaptureClosed,

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: PathBuf,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Labels file contained no labels.
    #[error("labels file '{path}' contains no labels")]
    LabelsEmpty {
        /// Path to the labels file.
        path: PathBuf,
    },

    /// Failed to read the observation log.
    #[error("failed to read observation log '{path}'")]
    JournalRead {
        /// Path to the log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Observation log is not valid JSON.
    #[error("failed to parse observation log '{path}'")]
    JournalParse {
        /// Path to the log file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the observation log.
    #[error("failed to write observation log '{path}'")]
    JournalWrite {
        /// Path to the log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize observations.
    #[error("failed to serialize observations")]
    JournalSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Log file is locked by another process.
    #[error("observation log is locked by another process: {path}")]
    FileLocked {
        /// Path to the lock file.
        path: PathBuf,
    },

    /// Failed to create lock file.
    #[error("failed to create lock file '{path}'")]
    LockCreate {
        /// Path to the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove a stale lock file.
    #[error("failed to remove stale lock file '{path}'")]
    LockRemove {
        /// Path to the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWrite {
        /// Path to the WAV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to write CSV export.
    #[error("failed to write CSV output")]
    CsvWrite {
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// Identification session ended in failure.
    #[error("identification failed ({kind})")]
    IdentificationFailed {
        /// Kind of the underlying failure.
        kind: ErrorKind,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

/// Coarse error category, kept for diagnostics after the error itself is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Capture produced no samples.
    EmptyBuffer,
    /// Audio rejected by the shaper.
    InvalidAudio,
    /// Model load failure.
    ModelLoad,
    /// Tensor or score length mismatch.
    ShapeMismatch,
    /// Scoring failure.
    Inference,
    /// No model loaded.
    ModelUnavailable,
    /// Session already active.
    AlreadyRecording,
    /// No capture running.
    NotRecording,
    /// Everything else (I/O, config, persistence).
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EmptyBuffer => "empty buffer",
            Self::InvalidAudio => "invalid audio",
            Self::ModelLoad => "model load",
            Self::ShapeMismatch => "shape mismatch",
            Self::Inference => "inference",
            Self::ModelUnavailable => "model unavailable",
            Self::AlreadyRecording => "already recording",
            Self::NotRecording => "not recording",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyBuffer => ErrorKind::EmptyBuffer,
            Self::InvalidAudio { .. } => ErrorKind::InvalidAudio,
            Self::ModelLoad { .. } => ErrorKind::ModelLoad,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::Inference { .. } => ErrorKind::Inference,
            Self::ModelUnavailable => ErrorKind::ModelUnavailable,
            Self::AlreadyRecording => ErrorKind::AlreadyRecording,
            Self::NotRecording => ErrorKind::NotRecording,
            Self::IdentificationFailed { kind } => *kind,
            _ => ErrorKind::Other,
        }
    }
}
