use crate::plugin::metadata::PluginMetadata;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    Unknown,
    UpToDate,
    UpdateAvailable,
    Error(String),
}

impl PluginStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PluginStatus::Unknown => "not checked",
            PluginStatus::UpToDate => "up to date",
            PluginStatus::UpdateAvailable => "update available",
            PluginStatus::Error(_) => "error",
        }
    }
}

/// One plugin file as seen by a single check pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub file_name: String,
    pub name: String,
    pub local_version: String,
    pub update_url: String,
    pub remote_version: Option<String>,
    pub status: PluginStatus,
}

impl PluginRecord {
    pub fn unknown(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            name: String::new(),
            local_version: String::new(),
            update_url: String::new(),
            remote_version: None,
            status: PluginStatus::Unknown,
        }
    }

    pub fn from_local(file_name: impl Into<String>, meta: PluginMetadata) -> Self {
        Self {
            file_name: file_name.into(),
            name: meta.name,
            local_version: meta.version,
            update_url: meta.update_url,
            remote_version: None,
            status: PluginStatus::Unknown,
        }
    }

    pub fn with_error(mut self, cause: impl ToString) -> Self {
        self.status = PluginStatus::Error(cause.to_string());
        self
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self.status, PluginStatus::UpdateAvailable)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.file_name
        } else {
            &self.name
        }
    }

    /// Label used in the selectable updates list, e.g. `Better Volume (v1.5.0)`.
    pub fn update_label(&self) -> String {
        match &self.remote_version {
            Some(version) => format!("{} (v{version})", self.display_name()),
            None => self.display_name().to_string(),
        }
    }

    /// Single status line for the progress log.
    pub fn status_line(&self) -> String {
        match &self.status {
            PluginStatus::Error(cause) => format!("{} - error: {cause}", self.file_name),
            PluginStatus::UpdateAvailable => format!(
                "{} - update available ({} -> {})",
                self.file_name,
                self.local_version,
                self.remote_version.as_deref().unwrap_or("?")
            ),
            status => format!("{} - {}", self.file_name, status.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: PluginStatus) -> PluginRecord {
        PluginRecord {
            file_name: "vol.plugin.js".to_string(),
            name: "Better Volume".to_string(),
            local_version: "1.0.0".to_string(),
            update_url: "https://example.com/vol.plugin.js".to_string(),
            remote_version: Some("1.1.0".to_string()),
            status,
        }
    }

    #[test]
    fn only_update_available_is_actionable() {
        assert!(record(PluginStatus::UpdateAvailable).is_actionable());
        assert!(!record(PluginStatus::UpToDate).is_actionable());
        assert!(!record(PluginStatus::Unknown).is_actionable());
        assert!(!record(PluginStatus::Error("boom".into())).is_actionable());
    }

    #[test]
    fn one_line_per_status() {
        assert_eq!(
            record(PluginStatus::UpdateAvailable).status_line(),
            "vol.plugin.js - update available (1.0.0 -> 1.1.0)"
        );
        assert_eq!(
            record(PluginStatus::UpToDate).status_line(),
            "vol.plugin.js - up to date"
        );
        assert_eq!(
            record(PluginStatus::Error("timed out".into())).status_line(),
            "vol.plugin.js - error: timed out"
        );
    }

    #[test]
    fn unnamed_records_fall_back_to_file_name() {
        let rec = PluginRecord::unknown("bare.js");
        assert_eq!(rec.display_name(), "bare.js");
        assert_eq!(rec.update_label(), "bare.js");
        assert_eq!(record(PluginStatus::UpdateAvailable).update_label(), "Better Volume (v1.1.0)");
    }
}
