//! Lock file guarding the observation log against concurrent writers.

use crate::constants::journal::LOCK_FILE_EXTENSION;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lock file content for debugging.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockInfo {
    /// Process ID that holds the lock.
    pub pid: u32,
    /// When the lock was acquired.
    pub started: DateTime<Utc>,
    /// File the lock protects.
    pub target: PathBuf,
}

/// RAII guard for file locks.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Attempt to lock `target`.
    ///
    /// The lock file is created next to the target.
    pub fn acquire(target: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(target);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path);

        match file {
            Ok(mut f) => {
                let info = LockInfo {
                    pid: std::process::id(),
                    started: Utc::now(),
                    target: target.to_path_buf(),
                };

                let json = serde_json::to_string_pretty(&info).unwrap_or_else(|_| "{}".to_string());
                let _ = f.write_all(json.as_bytes());

                // Register for cleanup on signal
                register_lock(&lock_path);

                Ok(Self { lock_path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::FileLocked { path: lock_path })
            }
            Err(e) => Err(Error::LockCreate {
                path: lock_path,
                source: e,
            }),
        }
    }

    /// Get the lock file path for a target file.
    pub fn lock_path_for(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "unknown".into());
        name.push(LOCK_FILE_EXTENSION);
        target.with_file_name(name)
    }

    /// Check if a lock file exists.
    pub fn is_locked(target: &Path) -> bool {
        Self::lock_path_for(target).exists()
    }

    /// Check if a lock is stale (older than `max_age`).
    pub fn is_stale(target: &Path, max_age: Duration) -> bool {
        let lock_path = Self::lock_path_for(target);

        if let Ok(metadata) = fs::metadata(&lock_path)
            && let Ok(modified) = metadata.modified()
        {
            return modified.elapsed().unwrap_or_default() > max_age;
        }
        false
    }

    /// Remove a stale lock.
    pub fn remove_stale(target: &Path) -> Result<()> {
        let lock_path = Self::lock_path_for(target);
        fs::remove_file(&lock_path).map_err(|e| Error::LockRemove {
            path: lock_path,
            source: e,
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        unregister_lock(&self.lock_path);
    }
}

/// Global registry of active lock paths for cleanup on signal.
static ACTIVE_LOCKS: std::sync::LazyLock<std::sync::Mutex<Vec<PathBuf>>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(Vec::new()));

/// Register a lock path for cleanup on signal.
pub fn register_lock(path: &Path) {
    if let Ok(mut locks) = ACTIVE_LOCKS.lock() {
        locks.push(path.to_path_buf());
    }
}

/// Unregister a lock path after normal cleanup.
pub fn unregister_lock(path: &Path) {
    if let Ok(mut locks) = ACTIVE_LOCKS.lock() {
        locks.retain(|p| p != path);
    }
}

/// Clean up all registered locks. Called on signal.
pub fn cleanup_all_locks() {
    if let Ok(locks) = ACTIVE_LOCKS.lock() {
        for lock_path in locks.iter() {
            let _ = fs::remove_file(lock_path);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release_lock() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("observations.json");

        let lock = FileLock::acquire(&target);
        assert!(lock.is_ok());
        assert!(FileLock::is_locked(&target));

        drop(lock);
        assert!(!FileLock::is_locked(&target));
    }

    #[test]
    fn test_double_lock_fails() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("observations.json");

        let _lock = FileLock::acquire(&target).unwrap();
        assert!(matches!(
            FileLock::acquire(&target),
            Err(Error::FileLocked { .. })
        ));
    }

    #[test]
    fn test_fresh_lock_is_not_stale() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("observations.json");

        let _lock = FileLock::acquire(&target).unwrap();
        assert!(!FileLock::is_stale(&target, Duration::from_secs(60)));
    }

    #[test]
    fn test_old_lock_is_stale_and_removable() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("observations.json");
        let lock_path = FileLock::lock_path_for(&target);

        let file = fs::File::create(&lock_path).unwrap();
        file.set_modified(std::time::SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        drop(file);

        assert!(FileLock::is_stale(&target, Duration::from_secs(60)));
        FileLock::remove_stale(&target).unwrap();
        assert!(!FileLock::is_locked(&target));
    }

    #[test]
    fn test_missing_lock_is_not_stale() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("observations.json");
        assert!(!FileLock::is_stale(&target, Duration::ZERO));
    }

    #[test]
    fn test_lock_path_format() {
        let path = FileLock::lock_path_for(Path::new("/data/observations.json"));
        assert_eq!(path, PathBuf::from("/data/observations.json.lock"));
    }

    #[test]
    fn test_lock_in_missing_directory_fails() {
        let result = FileLock::acquire(Path::new("/nonexistent/dir/observations.json"));
        assert!(matches!(result, Err(Error::LockCreate { .. })));
    }
}
