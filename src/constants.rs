//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdlog";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "BIRDLOG_CONFIG";

/// Species table used when no labels file is configured.
///
/// Index order matches the classifier's output order.
pub const DEFAULT_LABELS: [&str; 4] = ["Robin", "Sparrow", "Blue Jay", "Cardinal"];

/// Default number of ranked alternatives kept with a result.
pub const DEFAULT_TOP_K: usize = 3;

/// Location string recorded when the caller supplies none.
pub const DEFAULT_LOCATION: &str = "Current Location";

/// Model input defaults.
pub mod model {
    /// Number of samples the classifier consumes (0.975 s at 16 kHz).
    pub const DEFAULT_INPUT_SIZE: usize = 15_600;

    /// Sample rate the classifier was trained on.
    pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
}

/// Capture defaults.
pub mod capture {
    /// Longest capture kept in memory, in seconds.
    ///
    /// Samples beyond this are dropped.
    pub const DEFAULT_MAX_DURATION_SECS: f32 = 30.0;

    /// Number of chunks the capture channel holds before producers wait.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

    /// Samples per chunk pushed by file capture.
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;
}

/// Full-scale magnitudes for integer PCM formats.
pub mod full_scale {
    /// 16-bit signed PCM.
    pub const I16: f32 = 32_768.0;
    /// 32-bit signed PCM.
    pub const I32: f32 = 2_147_483_648.0;
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for confidence formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Observation log file names.
pub mod journal {
    /// Default log file name inside the data directory.
    pub const FILE_NAME: &str = "observations.json";

    /// Directory (next to the log) that holds saved clips.
    pub const CLIPS_DIR: &str = "clips";

    /// Lock file extension.
    pub const LOCK_FILE_EXTENSION: &str = ".lock";

    /// Age after which a leftover lock file is treated as abandoned.
    ///
    /// An append holds the lock for milliseconds.
    pub const STALE_LOCK_SECS: u64 = 60;
}
