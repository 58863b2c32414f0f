//! Persisted CLI settings.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Settings written by `shutter use`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "shutter").context("Could not determine data directory")
}

/// The project data directory, created if missing.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    Ok(data_dir.to_path_buf())
}

fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.json"))
}

/// Where the store lives when nothing else says.
pub fn default_store_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("store"))
}

/// Save settings to disk.
pub fn save_config(config: &StoredConfig) -> Result<()> {
    let path = config_path()?;
    let json = serde_json::to_string_pretty(config)?;

    fs::write(&path, &json).context("Failed to write config file")?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

/// Load settings, or defaults if none were saved.
pub fn load_config() -> Result<StoredConfig> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(StoredConfig::default());
    }

    let json = fs::read_to_string(&path).context("Failed to read config file")?;
    serde_json::from_str(&json).context("Invalid config file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_omitted() {
        let config = StoredConfig {
            store: Some("file:///tmp/s/".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"store":"file:///tmp/s/"}"#);
    }

    #[test]
    fn missing_fields_default() {
        let config: StoredConfig = serde_json::from_str(r#"{"user":"amy"}"#).unwrap();
        assert_eq!(config.user.as_deref(), Some("amy"));
        assert_eq!(config.page_size, None);
    }
}
