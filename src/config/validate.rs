//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    let model = &config.model;
    if model.input_size == 0 {
        return Err(invalid("model.input_size must be at least 1"));
    }
    if model.sample_rate == 0 {
        return Err(invalid("model.sample_rate must be at least 1"));
    }
    if model.intra_threads == Some(0) {
        return Err(invalid("model.intra_threads must be at least 1"));
    }

    if config.classification.top_k == 0 {
        return Err(invalid("classification.top_k must be at least 1"));
    }

    let capture = &config.capture;
    if !capture.max_duration_secs.is_finite() || capture.max_duration_secs <= 0.0 {
        return Err(invalid(format!(
            "capture.max_duration_secs must be positive, got {}",
            capture.max_duration_secs
        )));
    }
    if capture.channel_capacity == 0 {
        return Err(invalid("capture.channel_capacity must be at least 1"));
    }
    if capture.chunk_size == 0 {
        return Err(invalid("capture.chunk_size must be at least 1"));
    }

    if config.journal.location.trim().is_empty() {
        return Err(invalid("journal.location must not be empty"));
    }

    Ok(())
}
