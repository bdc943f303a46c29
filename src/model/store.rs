use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk shape of the folder store: `{ "plugins_folder": "<path>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFolder {
    pub plugins_folder: String,
}

/// Remembers the chosen plugins folder between runs.
#[derive(Debug, Clone)]
pub struct FolderStore {
    path: PathBuf,
}

impl FolderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when the store is missing, unreadable, or has no folder.
    pub fn load(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!("cannot read {}: {err}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<StoredFolder>(&raw) {
            Ok(stored) if !stored.plugins_folder.trim().is_empty() => Some(stored.plugins_folder),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("ignoring malformed {}: {err}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, folder: &str) -> std::io::Result<()> {
        let stored = StoredFolder {
            plugins_folder: folder.to_string(),
        };
        let json = serde_json::to_string(&stored)?;
        fs::write(&self.path, json)?;
        tracing::info!("plugins folder saved to {}", self.path.display());
        Ok(())
    }
}
