//! Player preferences (`pipsync.json`).

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::time::Duration;

use crate::adapter::DEFAULT_EMBED_SCRIPT_URL;
use crate::core::positions::DEFAULT_POSITIONS_KEY;
use crate::core::session::{PipPosition, PipSize};
use crate::core::store::{DEFAULT_CHECKPOINT_INTERVAL_SECS, StoreOptions};

pub use crate::paths::{PathConfig, config_file, data_file, ensure_dirs};

/// Preferences file name inside the config directory
pub const PREFS_FILE: &str = "pipsync.json";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PlayerPrefs {
    // Persistence
    pub checkpoint_interval_secs: u32, // 0 = only on exit/switch
    pub positions_key: String,

    // Playback
    pub default_volume: f64,
    pub embed_poll_interval_ms: u64,
    pub embed_script_url: String,

    // Overlay
    pub pip_position: PipPosition,
    pub pip_size: PipSize,
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
            positions_key: DEFAULT_POSITIONS_KEY.to_string(),
            default_volume: 1.0,
            embed_poll_interval_ms: 250,
            embed_script_url: DEFAULT_EMBED_SCRIPT_URL.to_string(),
            pip_position: PipPosition::default(),
            pip_size: PipSize::default(),
        }
    }
}

impl PlayerPrefs {
    /// Read preferences; a missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(prefs) => {
                info!("Loaded preferences from {}", path.display());
                prefs
            }
            Err(e) => {
                warn!("Using default preferences: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid preferences in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.embed_poll_interval_ms.max(1))
    }

    pub fn to_store_options(&self) -> StoreOptions {
        StoreOptions {
            checkpoint_interval_secs: self.checkpoint_interval_secs,
            default_volume: self.default_volume.clamp(0.0, 1.0),
            pip_position: self.pip_position,
            pip_size: self.pip_size,
        }
    }
}
