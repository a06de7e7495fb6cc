//! Output format writers.

mod csv;
mod json;
pub mod progress;
mod table;
mod types;
mod writer;

pub use csv::CsvWriter;
pub use json::{JsonHistory, JsonSummary, JsonWriter};
pub use table::TableWriter;
pub use types::HistoryFormat;
pub use writer::OutputWriter;

use crate::error::Result;
use crate::journal::Observation;
use std::io::Write;

/// Create a writer for `format` over `out`.
pub fn create_writer<'a, W: Write + 'a>(
    format: HistoryFormat,
    out: W,
) -> Box<dyn OutputWriter + 'a> {
    match format {
        HistoryFormat::Table => Box::new(TableWriter::new(out)),
        HistoryFormat::Csv => Box::new(CsvWriter::new(out)),
        HistoryFormat::Json => Box::new(JsonWriter::new(out)),
    }
}

/// Write `observations` to `out` in `format`.
pub fn write_history<W: Write>(
    observations: &[Observation],
    format: HistoryFormat,
    out: W,
) -> Result<()> {
    let mut writer = create_writer(format, out);
    writer.write_header()?;
    for observation in observations {
        writer.write_observation(observation)?;
    }
    writer.finalize()
}
