//! Persisted scalar layout state.
//!
//! Layout values (divider ratio, split flag, last view per session, drawer
//! width) are plain strings stored by key. The store never interprets them;
//! parsing and clamping happen at the call site.
//!
//! State is stored in `~/.config/panemux/state.yaml`

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Well-known state keys
pub mod keys {
    /// Divider position as a fraction of the viewport width
    pub const DIVIDER_RATIO: &str = "divider_ratio";
    /// `"true"` while the layout is split
    pub const SPLIT_MODE: &str = "split_mode";
    /// Width of the pinned side drawer in pixels
    pub const DRAWER_WIDTH: &str = "drawer_width";

    /// Key holding the last view mode shown for `session`
    pub fn last_view(session: &str) -> String {
        format!("last_view:{session}")
    }
}

/// Key-value store for persisted scalar state
pub trait StateStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value
    fn set(&self, key: &str, value: &str);
    /// Delete a value
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}

/// YAML-file-backed store; every write is flushed to disk
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStateStore {
    /// Open the store at `path`, loading existing values if the file exists
    ///
    /// A missing or empty file yields an empty store. A corrupt file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {:?}", path))?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml_ng::from_str(&contents)
                    .with_context(|| format!("Failed to parse state from {:?}", path))?
            }
        } else {
            BTreeMap::new()
        };

        log::info!("Loaded {} state values from {:?}", values.len(), path);
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {:?}", parent))?;
        }
        let contents = serde_yaml_ng::to_string(values).context("Failed to serialize state")?;
        let temp_path = self.path.with_extension("yaml.tmp");
        std::fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write state to {:?}", temp_path))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to move state into {:?}", self.path))?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock();
        if values.get(key).map(String::as_str) == Some(value) {
            return;
        }
        values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&values) {
            log::warn!("Failed to persist state key {key}: {e:#}");
        }
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock();
        if values.remove(key).is_some()
            && let Err(e) = self.flush(&values)
        {
            log::warn!("Failed to persist removal of state key {key}: {e:#}");
        }
    }
}
