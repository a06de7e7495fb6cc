//! CSV output format writer.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::error::{Error, Result};
use crate::journal::Observation;
use crate::output::OutputWriter;
use std::io::Write;

/// CSV format output writer.
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Create a new CSV writer.
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
        }
    }
}

fn csv_err(e: csv::Error) -> Error {
    Error::CsvWrite { source: e }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record(["Timestamp", "Species", "Confidence", "Location", "Clip"])
            .map_err(csv_err)
    }

    fn write_observation(&mut self, observation: &Observation) -> Result<()> {
        let confidence = observation
            .confidence
            .map(|c| format!("{c:.decimal$}", decimal = DECIMAL_PLACES))
            .unwrap_or_default();
        let clip = observation
            .clip
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        self.writer
            .write_record([
                observation.timestamp.to_rfc3339().as_str(),
                observation.label.as_str(),
                confidence.as_str(),
                observation.location.as_str(),
                clip.as_str(),
            ])
            .map_err(csv_err)
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
