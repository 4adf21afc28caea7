//! Rotation history persistence

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::RotationHistory;
use crate::error::{Error, Result};

/// Durable home for a [`RotationHistory`]
pub trait HistoryStore: Send + Sync {
    /// Load the last saved history; an absent history is empty, not an error
    fn load(&self) -> Result<RotationHistory>;

    /// Replace the saved history
    fn save(&self, history: &RotationHistory) -> Result<()>;
}

/// JSON file written atomically through a temp file and rename
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "rotation.json".to_string());
        self.path
            .with_file_name(format!("{name}.corrupted.{}", Utc::now().timestamp()))
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<RotationHistory> {
        if !self.path.exists() {
            return Ok(RotationHistory::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(history) => Ok(history),
            Err(e) => {
                let backup = self.backup_path();
                fs::rename(&self.path, &backup)?;
                warn!(
                    "Rotation history corrupted, backed up to {}: {}",
                    backup.display(),
                    e
                );
                Ok(RotationHistory::default())
            }
        }
    }

    fn save(&self, history: &RotationHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path).map_err(|e| {
            Error::Storage(format!(
                "Failed to move {} into place: {}",
                temp.display(),
                e
            ))
        })?;

        debug!(
            records = history.records.len(),
            "Saved rotation history to {}",
            self.path.display()
        );
        Ok(())
    }
}

/// In-process store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<RotationHistory>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: RotationHistory) -> Self {
        Self {
            history: Mutex::new(history),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> RotationHistory {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<RotationHistory> {
        Ok(self.snapshot())
    }

    fn save(&self, history: &RotationHistory) -> Result<()> {
        *self.history.lock().unwrap_or_else(|p| p.into_inner()) = history.clone();
        *self.saves.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::UsageRecord;
    use tempfile::TempDir;

    fn sample() -> RotationHistory {
        let mut history = RotationHistory::default();
        history.records.insert(
            "intro:a".to_string(),
            UsageRecord {
                usage_count: 3,
                last_used: Some(Utc::now()),
                successes: 1,
                total: 2,
            },
        );
        history.fragments.insert("a".to_string(), 3);
        history.sequence.insert("intro".to_string(), 1);
        history
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("rotation.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("nested").join("rotation.json"));
        let history = sample();
        store.save(&history).unwrap();
        assert_eq!(store.load().unwrap(), history);
        assert!(!temp.path().join("nested").join("rotation.json.tmp").exists());
    }

    #[test]
    fn test_corrupted_file_is_backed_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rotation.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
        assert!(!path.exists());

        let backups: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupted."))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap().fragments["a"], 3);
    }
}
