//! Persistence of config and fader profiles as JSON documents
//!
//! Storage is an external collaborator to the core: documents are read once at
//! startup and written on shutdown. Every loaded document is validated
//! against its typed shape before acceptance; a structurally invalid document
//! is skipped with a logged error, never partially applied.

use super::types::FaderProfile;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, LogCategory};
use crate::paths::AppPaths;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Opaque read/write access to the persisted Config and profile documents.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the persisted Config, `Ok(None)` when no document exists yet.
    async fn load_config(&self) -> Result<Option<AppConfig>>;
    /// Persist the Config document.
    async fn save_config(&self, config: &AppConfig) -> Result<()>;
    /// Load every structurally valid profile document.
    async fn load_profiles(&self) -> Result<Vec<FaderProfile>>;
    /// Persist one document per profile, keyed by profile id.
    async fn save_profiles(&self, profiles: &[FaderProfile]) -> Result<()>;
}

/// JSON-file storage in the app data directory: one `config.json` plus one
/// `faderProfiles/{id}.json` per profile.
pub struct JsonStorage {
    config_path: PathBuf,
    profiles_dir: PathBuf,
    events: EventBus,
}

impl JsonStorage {
    pub fn new(paths: &AppPaths, events: EventBus) -> Self {
        Self {
            config_path: paths.config.clone(),
            profiles_dir: paths.profiles_dir.clone(),
            events,
        }
    }

    /// Create the data directories if missing.
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.profiles_dir)
            .await
            .map_err(|e| Error::validation("profiles directory", e))?;
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load_config(&self) -> Result<Option<AppConfig>> {
        let json = match fs::read_to_string(&self.config_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::validation("config file", e)),
        };
        let config = AppConfig::from_json(&json)?;
        debug!("Config loaded from {}", self.config_path.display());
        Ok(Some(config))
    }

    async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| Error::validation("config serialization", e))?;
        fs::write(&self.config_path, json)
            .await
            .map_err(|e| Error::validation("config file", e))?;
        self.events.log(LogCategory::Log, "Config file written");
        Ok(())
    }

    async fn load_profiles(&self) -> Result<Vec<FaderProfile>> {
        let mut profiles = Vec::new();
        let mut entries = match fs::read_dir(&self.profiles_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(profiles),
            Err(e) => return Err(Error::validation("profiles directory", e)),
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    self.events.log(
                        LogCategory::Error,
                        format!("Failed to read profiles directory: {e}"),
                    );
                    break;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_profile(&path).await {
                Ok(profile) => {
                    self.events.log(
                        LogCategory::Log,
                        format!("Loaded fader profile: {}", profile.id),
                    );
                    profiles.push(profile);
                }
                Err(e) => {
                    // Skip the document whole; a partial profile must never load.
                    self.events.log(
                        LogCategory::Error,
                        format!("Skipping fader profile file {}: {e}", path.display()),
                    );
                }
            }
        }
        Ok(profiles)
    }

    async fn save_profiles(&self, profiles: &[FaderProfile]) -> Result<()> {
        for profile in profiles {
            let path = self.profiles_dir.join(format!("{}.json", profile.id));
            let json = serde_json::to_string_pretty(profile)
                .map_err(|e| Error::validation("profile serialization", e))?;
            fs::write(&path, json)
                .await
                .map_err(|e| Error::validation("profile file", e))?;
            debug!("Wrote fader profile: {}", profile.id);
        }
        Ok(())
    }
}

async fn read_profile(path: &std::path::Path) -> Result<FaderProfile> {
    let json = fs::read_to_string(path)
        .await
        .map_err(|e| Error::validation("profile file", e))?;
    let profile: FaderProfile =
        serde_json::from_str(&json).map_err(|e| Error::validation("profile file", e))?;
    profile.validate()?;
    Ok(profile)
}
