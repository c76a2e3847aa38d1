//! Persisted learner progress (`progress.toml`) and the session lock guarding it

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Completion record that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_exercise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Exercise name -> completed
    #[serde(default)]
    pub exercises: BTreeMap<String, bool>,
}

impl Progress {
    /// Load progress from disk; a missing file means a fresh start
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read progress file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse progress file: {}", path.display()))
    }

    /// Write progress atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize progress")?;

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    pub fn is_completed(&self, name: &str) -> bool {
        self.exercises.get(name).copied().unwrap_or(false)
    }

    /// Mark an exercise completed; returns false if it already was
    pub fn set_completed(&mut self, name: &str) -> bool {
        if self.is_completed(name) {
            return false;
        }
        self.exercises.insert(name.to_string(), true);
        self.last_updated = Some(Utc::now());
        true
    }

    /// Move the current-exercise pointer; returns false if unchanged
    pub fn set_current(&mut self, name: &str) -> bool {
        if self.current_exercise.as_deref() == Some(name) {
            return false;
        }
        self.current_exercise = Some(name.to_string());
        self.last_updated = Some(Utc::now());
        true
    }
}

/// Exclusive lock held for the lifetime of an interactive session
///
/// Two sessions writing the same progress store would overwrite each other's
/// completions, so the second one refuses to start.
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            bail!(
                "Another kata session is already running (lock held on {})",
                path.display()
            );
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let progress = Progress::load(&temp_dir.path().join("progress.toml")).unwrap();
        assert_eq!(progress, Progress::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("progress.toml");

        let mut progress = Progress::default();
        assert!(progress.set_completed("hello"));
        assert!(progress.set_current("variables"));
        progress.save(&path).unwrap();

        let reloaded = Progress::load(&path).unwrap();
        assert_eq!(reloaded, progress);
        assert!(reloaded.is_completed("hello"));
        assert!(!reloaded.is_completed("variables"));
        assert_eq!(reloaded.current_exercise.as_deref(), Some("variables"));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_set_completed_is_idempotent() {
        let mut progress = Progress::default();
        assert!(progress.set_completed("hello"));
        let snapshot = progress.clone();

        assert!(!progress.set_completed("hello"));
        assert_eq!(progress, snapshot);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("progress.toml");
        fs::write(&path, "exercises = [not valid").unwrap();

        assert!(Progress::load(&path).is_err());
    }

    #[test]
    fn test_session_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.lock");

        let lock = SessionLock::acquire(&path).unwrap();
        assert!(SessionLock::acquire(&path).is_err());

        drop(lock);
        assert!(SessionLock::acquire(&path).is_ok());
    }
}
