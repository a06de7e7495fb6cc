//! Observation log.
//!
//! Observations are kept as an ordered JSON array in a single file. Every
//! append takes a lock file next to the log, reads the whole list, pushes the
//! new entry and writes the list back through a temporary file.

mod clip;
mod observation;

pub use clip::write_clip;
pub use observation::Observation;

use crate::audio::RawAudio;
use crate::config::{JournalConfig, default_journal_path};
use crate::constants::journal::{CLIPS_DIR, STALE_LOCK_SECS};
use crate::error::{Error, Result};
use crate::inference::ClassificationResult;
use crate::locking::FileLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Append-only list of observations on disk.
#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    /// Open the log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the log configured in `config`, or the one in the data directory.
    pub fn from_config(config: &JournalConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => default_journal_path()?,
        };
        Ok(Self::new(path))
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding saved clips.
    pub fn clips_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map_or_else(|| PathBuf::from(CLIPS_DIR), |dir| dir.join(CLIPS_DIR))
    }

    /// Read every observation, oldest first.
    ///
    /// A missing log reads as empty.
    pub fn entries(&self) -> Result<Vec<Observation>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| Error::JournalRead {
            path: self.path.clone(),
            source: e,
        })?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| Error::JournalParse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Append an observation, returning the new entry count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileLocked`] if another process is writing the log.
    pub fn append(&self, observation: Observation) -> Result<usize> {
        let _lock = self.lock()?;
        self.push(observation)
    }

    /// Record a classification result, saving `audio` as a clip when given.
    ///
    /// The log is locked before the clip is written. A clip that cannot be
    /// written is logged and the observation is kept without it.
    pub fn record(
        &self,
        result: &ClassificationResult,
        location: &str,
        audio: Option<&RawAudio<f32>>,
    ) -> Result<Observation> {
        let mut observation = Observation::from_result(result, location);
        let _lock = self.lock()?;

        if let Some(audio) = audio {
            match write_clip(&self.clips_dir(), result, audio) {
                Ok(path) => observation.clip = Some(path),
                Err(e) => warn!("Clip not saved: {e}"),
            }
        }

        if let Err(e) = self.push(observation.clone()) {
            if let Some(clip) = &observation.clip {
                let _ = fs::remove_file(clip);
            }
            return Err(e);
        }

        info!(
            "Recorded {} at {} in {}",
            observation.label,
            observation.location,
            self.path.display()
        );
        Ok(observation)
    }

    /// Lock the log, clearing a lock abandoned by a crashed process.
    fn lock(&self) -> Result<FileLock> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::JournalWrite {
                path: self.path.clone(),
                source: e,
            })?;
        }

        if FileLock::is_stale(&self.path, Duration::from_secs(STALE_LOCK_SECS)) {
            warn!("Removing stale lock for {}", self.path.display());
            FileLock::remove_stale(&self.path)?;
        }
        FileLock::acquire(&self.path)
    }

    /// Append while holding the lock.
    fn push(&self, observation: Observation) -> Result<usize> {
        let mut entries = self.entries()?;
        entries.push(observation);
        self.write_all(&entries)?;

        debug!("Observation log now holds {} entries", entries.len());
        Ok(entries.len())
    }

    fn write_all(&self, entries: &[Observation]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::JournalSerialize { source: e })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let write_err = |e| Error::JournalWrite {
            path: self.path.clone(),
            source: e,
        };
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)
    }
}
