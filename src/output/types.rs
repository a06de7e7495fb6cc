//! Output type definitions.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Format for printing the observation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFormat {
    /// Aligned columns for the terminal.
    #[default]
    Table,
    /// Comma-separated values with a header row.
    Csv,
    /// JSON document with a summary.
    Json,
}

impl std::fmt::Display for HistoryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}
