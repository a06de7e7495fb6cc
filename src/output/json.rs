//! JSON output format writer.

use crate::error::{Error, Result};
use crate::journal::Observation;
use crate::output::OutputWriter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

/// History document structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonHistory {
    /// Observations, oldest first.
    pub observations: Vec<Observation>,
    /// Summary statistics.
    pub summary: JsonSummary,
}

/// Summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of observations.
    pub total_observations: usize,
    /// Number of unique species.
    pub unique_species: usize,
}

/// Writer for the JSON history document.
///
/// Observations are collected and written at finalize.
pub struct JsonWriter<W: Write> {
    out: W,
    observations: Vec<Observation>,
}

impl<W: Write> JsonWriter<W> {
    /// Create a new JSON writer.
    pub fn new(out: W) -> Self {
        Self {
            out,
            observations: Vec::new(),
        }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_observation(&mut self, observation: &Observation) -> Result<()> {
        self.observations.push(observation.clone());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let unique_species = self
            .observations
            .iter()
            .map(|o| o.label.as_str())
            .collect::<HashSet<_>>()
            .len();
        let history = JsonHistory {
            summary: JsonSummary {
                total_observations: self.observations.len(),
                unique_species,
            },
            observations: std::mem::take(&mut self.observations),
        };

        serde_json::to_writer_pretty(&mut self.out, &history)
            .map_err(|e| Error::JournalSerialize { source: e })?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
