//! Application path management
//!
//! Resolves the per-user data directory holding the persisted config, the
//! fader profile documents, and log files. An explicit `--data-dir` override
//! takes precedence; otherwise data lives in the platform config directory
//! (`%APPDATA%\eos-gw`, `~/.config/eos-gw`, ...).

use std::path::{Path, PathBuf};

/// Application name used for the data directory
const APP_NAME: &str = "eos-gw";

/// Resolved application paths for config, profiles, and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the persisted Config document
    pub config: PathBuf,
    /// Directory holding one JSON document per fader profile
    pub profiles_dir: PathBuf,
    /// Directory for rolling log files
    pub logs_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths, honoring an optional base-directory override.
    pub fn detect(override_dir: Option<&Path>) -> Self {
        let base = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME),
        };

        Self {
            config: base.join("config.json"),
            profiles_dir: base.join("faderProfiles"),
            logs_dir: base.join("logs"),
        }
    }
}
