//! Index to species label table.

use crate::constants::DEFAULT_LABELS;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Fixed mapping from classifier output index to species name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS.iter().map(ToString::to_string).collect())
    }
}

impl LabelTable {
    /// Build a table from labels in model output order.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Read labels from a file.
    ///
    /// # File Format
    /// - One label per line, in model output order
    /// - Surrounding whitespace is trimmed, blank lines are ignored
    ///
    /// # Errors
    /// - Returns error if the file cannot be read
    /// - Returns error if the file holds no labels
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut labels = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::LabelsRead {
                path: path.to_path_buf(),
                source: e,
            })?;

            let trimmed = line.trim();
            if !trimmed.is_empty() {
                labels.push(trimmed.to_string());
            }
        }

        if labels.is_empty() {
            return Err(Error::LabelsEmpty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self::new(labels))
    }

    /// Label at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in output order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_table_order() {
        let table = LabelTable::default();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some("Robin"));
        assert_eq!(table.get(1), Some("Sparrow"));
        assert_eq!(table.get(3), Some("Cardinal"));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Turdus migratorius_American Robin").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Cardinalis cardinalis_Northern Cardinal  ").unwrap();

        let table = LabelTable::from_file(file.path()).unwrap();
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![
                "Turdus migratorius_American Robin",
                "Cardinalis cardinalis_Northern Cardinal"
            ]
        );
    }

    #[test]
    fn test_from_file_empty_fails() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            LabelTable::from_file(file.path()),
            Err(Error::LabelsEmpty { .. })
        ));
    }

    #[test]
    fn test_from_file_not_found() {
        let result = LabelTable::from_file(Path::new("nonexistent-labels.txt"));
        assert!(matches!(result, Err(Error::LabelsRead { .. })));
    }
}
