use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub store_file: String,
    pub plugin_extension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub log_capacity: usize,
}

const DEFAULTS: &str = include_str!("../../config/default.toml");

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = directories::ProjectDirs::from("", "", "plugsync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
            .map(fs::read_to_string)
            .transpose()?;

        Self::from_layers(user.as_deref())
    }

    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;

        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user)?;
            merge_values(&mut merged, overlay);
        }

        Ok(merged.try_into()?)
    }

    /// Persisted folder store, relative to the working directory.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.general.store_file)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.network.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
