//! Position store - resumable playback positions keyed by video id.
//!
//! All positions live in one record under a fixed storage key, as a flat
//! JSON object `{ "<video_id>": seconds }`. The record is read whole and
//! written whole on every save.
//!
//! Failures never reach callers: a missing or corrupt record reads as
//! "no saved position", and a failed write is logged and dropped.

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Default storage key for the position record
pub const DEFAULT_POSITIONS_KEY: &str = "video_positions";

/// Durable string key/value storage (a browser-profile-like record store).
pub trait KeyValueStorage: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` (no error if absent)
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage, for hosts without a filesystem and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory: {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Durable `video_id -> last known time` map.
pub struct PositionStore {
    storage: Box<dyn KeyValueStorage>,
    key: String,
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore").field("key", &self.key).finish()
    }
}

impl PositionStore {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, DEFAULT_POSITIONS_KEY)
    }

    pub fn with_key(storage: Box<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Position store without persistence (lost at exit)
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Saved position for `video_id`, if any
    pub fn load(&self, video_id: &str) -> Option<f64> {
        let secs = self.read_map().get(video_id).copied();
        trace!("PositionStore: load {} -> {:?}", video_id, secs);
        secs
    }

    /// Overwrite the saved position for `video_id`
    pub fn save(&self, video_id: &str, secs: f64) {
        if !secs.is_finite() || secs < 0.0 {
            debug!("PositionStore: ignoring invalid position {} for {}", secs, video_id);
            return;
        }
        let mut map = self.read_map();
        map.insert(video_id.to_string(), secs);
        if let Err(e) = self.write_map(&map) {
            warn!("PositionStore: failed to save position for {}: {:#}", video_id, e);
        } else {
            trace!("PositionStore: saved {} = {:.3}", video_id, secs);
        }
    }

    /// Forget the position of one video
    pub fn remove(&self, video_id: &str) -> bool {
        let mut map = self.read_map();
        if map.remove(video_id).is_none() {
            return false;
        }
        if let Err(e) = self.write_map(&map) {
            warn!("PositionStore: failed to remove {}: {:#}", video_id, e);
            return false;
        }
        true
    }

    /// Forget every saved position
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            warn!("PositionStore: failed to clear positions: {:#}", e);
        }
    }

    /// All saved positions, sorted by video id
    pub fn entries(&self) -> BTreeMap<String, f64> {
        self.read_map()
    }

    fn read_map(&self) -> BTreeMap<String, f64> {
        match self.try_read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!("PositionStore: treating record as empty: {:#}", e);
                BTreeMap::new()
            }
        }
    }

    fn try_read_map(&self) -> Result<BTreeMap<String, f64>> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(BTreeMap::new());
        };

        // Values are parsed loosely so one bad entry does not drop the rest
        let parsed: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt position record under '{}'", self.key))?;

        Ok(parsed
            .into_iter()
            .filter_map(|(id, value)| {
                value
                    .as_f64()
                    .filter(|secs| secs.is_finite() && *secs >= 0.0)
                    .map(|secs| (id, secs))
            })
            .collect())
    }

    fn write_map(&self, map: &BTreeMap<String, f64>) -> Result<()> {
        let raw = serde_json::to_string(map).context("Failed to serialize positions")?;
        self.storage.set(&self.key, &raw)
    }
}
