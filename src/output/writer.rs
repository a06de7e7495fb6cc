//! Output writer trait definition.

use crate::error::Result;
use crate::journal::Observation;

/// Trait for writing observation history.
pub trait OutputWriter {
    /// Write the header (if applicable).
    fn write_header(&mut self) -> Result<()>;

    /// Write a single observation.
    fn write_observation(&mut self, observation: &Observation) -> Result<()>;

    /// Finalize the output (flush, close, etc.).
    fn finalize(&mut self) -> Result<()>;
}
