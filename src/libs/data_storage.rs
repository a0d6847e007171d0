use anyhow::Result;
use std::env::consts::OS;
use std::env::var;
use std::fs;
use std::path::{Path, PathBuf};

pub const VENDOR_NAME: &str = "floorlog";
pub const APP_NAME: &str = "floorlog";

/// Overrides the platform data directory when set.
pub const DATA_DIR_ENV: &str = "FLOORLOG_DATA_DIR";

/// Directory holding floorlog's local files (currently only `config.json`).
///
/// Resolution order: `FLOORLOG_DATA_DIR`, then the platform location
/// (`%LOCALAPPDATA%`, `~/Library/Application Support`, `~/.local/share`) with
/// `floorlog/floorlog` appended.
#[derive(Clone, Debug)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStorage {
    pub fn new() -> Self {
        if let Ok(dir) = var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Self::at(dir);
            }
        }

        let platform_dir = match OS {
            "windows" => var("LOCALAPPDATA").map(PathBuf::from),
            "macos" => var("HOME").map(|home| Path::new(&home).join("Library").join("Application Support")),
            _ => var("HOME").map(|home| Path::new(&home).join(".local").join("share")),
        }
        .unwrap_or_else(|_| PathBuf::from("."));

        Self::at(platform_dir.join(VENDOR_NAME).join(APP_NAME))
    }

    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of `file_name` inside the data directory, creating the directory on demand.
    pub fn get_path(&self, file_name: &str) -> Result<PathBuf> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)?;
        }
        Ok(self.base_path.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_path_creates_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = DataStorage::at(temp_dir.path().join("nested").join("dir"));

        let path = storage.get_path("config.json").unwrap();
        assert!(storage.base_path().is_dir());
        assert_eq!(path, storage.base_path().join("config.json"));
        assert!(!path.exists());
    }
}
