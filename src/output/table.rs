//! Terminal table writer.

use crate::error::Result;
use crate::journal::Observation;
use crate::output::OutputWriter;
use std::io::Write;

const LABEL_WIDTH: usize = 20;

/// Aligned plain-text table.
pub struct TableWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> TableWriter<W> {
    /// Create a new table writer.
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }
}

impl<W: Write> OutputWriter for TableWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "{:<19}  {:<width$}  {:>10}  Location",
            "Time",
            "Species",
            "Confidence",
            width = LABEL_WIDTH
        )?;
        Ok(())
    }

    fn write_observation(&mut self, observation: &Observation) -> Result<()> {
        let confidence = observation
            .confidence
            .map_or_else(|| "-".to_string(), |c| format!("{:.1}%", c * 100.0));
        writeln!(
            self.out,
            "{:<19}  {:<width$}  {:>10}  {}",
            observation
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            observation.label,
            confidence,
            observation.location,
            width = LABEL_WIDTH
        )?;
        self.rows += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.rows == 0 {
            writeln!(self.out, "No observations recorded yet")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_empty_table_says_so() {
        let mut out = Vec::new();
        {
            let mut writer = TableWriter::new(&mut out);
            writer.write_header().unwrap();
            writer.finalize().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No observations recorded yet"));
    }

    #[test]
    fn test_row_shows_percentage() {
        let observation = Observation {
            label: "Sparrow".to_string(),
            timestamp: Utc::now(),
            location: "Current Location".to_string(),
            confidence: Some(0.7),
            clip: None,
        };
        let mut out = Vec::new();
        {
            let mut writer = TableWriter::new(&mut out);
            writer.write_observation(&observation).unwrap();
            writer.finalize().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Sparrow"));
        assert!(text.contains("70.0%"));
        assert!(text.trim_end().ends_with("Current Location"));
    }
}
