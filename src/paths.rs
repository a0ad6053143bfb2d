use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config/data roots
const APP_DIR: &str = "pipsync";

/// Files whose presence in the working directory makes it the config root
const LOCAL_MARKERS: [&str; 3] = ["pipsync.json", "video_positions.json", "pipsync.log"];

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (PIPSYNC_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var("PIPSYNC_CONFIG_DIR").ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. PIPSYNC_CONFIG_DIR environment variable
/// 3. Local folder IF any pipsync files exist (pipsync.json, video_positions.json, pipsync.log)
/// 4. Platform-specific config directory from dirs-next (default)
///
/// Platform paths:
/// - Linux: ~/.config/pipsync/{name}
/// - macOS: ~/Library/Application Support/pipsync/{name}
/// - Windows: %APPDATA%\pipsync\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

/// Get path to a data file (saved positions, logs)
///
/// Same priority as [`config_file`], falling back to the platform data
/// directory (`~/.local/share/pipsync` on Linux).
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    data_dir(config).join(name)
}

/// Ensure that configuration and data directories exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = config_dir(config);
    let data_dir = data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }

    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

/// Directory of the position records and logs
pub fn data_dir(config: &PathConfig) -> PathBuf {
    resolve(config, dirs_next::data_dir)
}

pub fn config_dir(config: &PathConfig) -> PathBuf {
    resolve(config, dirs_next::config_dir)
}

fn resolve(config: &PathConfig, platform_root: fn() -> Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = platform_root() {
        return dir.join(APP_DIR);
    }

    PathBuf::from(".")
}
