//! Platform-specific configuration and data paths.

use crate::constants::{APP_NAME, journal};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory for the current platform.
///
/// - Linux: `~/.config/birdlog/`
/// - macOS: `~/Library/Application Support/birdlog/`
/// - Windows: `%APPDATA%\birdlog\config\`
pub fn config_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the config file, honoring an explicit override.
pub fn config_file_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

/// Get the data directory for the current platform.
///
/// - Linux: `~/.local/share/birdlog/`
/// - macOS: `~/Library/Application Support/birdlog/`
/// - Windows: `%APPDATA%\birdlog\data\`
pub fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(Error::DataDirNotFound)
}

/// Default observation log path.
pub fn default_journal_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(journal::FILE_NAME))
}
