use std::collections::BTreeSet;
use std::path::Path;

use crate::plugin::error::UpdateError;
use crate::plugin::installer;
use crate::plugin::metadata;
use crate::plugin::record::{PluginRecord, PluginStatus};
use crate::plugin::source::UpdateSource;
use crate::plugin::version;

/// Check one plugin file against its update source.
///
/// Never fails: every problem ends up as `PluginStatus::Error` on the record.
pub fn check_plugin(folder: &Path, file_name: &str, source: &dyn UpdateSource) -> PluginRecord {
    let path = folder.join(file_name);
    let local_text = match std::fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(io) => {
            let err = UpdateError::Io {
                path: path.display().to_string(),
                source: io,
            };
            return PluginRecord::unknown(file_name).with_error(err);
        }
    };

    let local = match metadata::extract(&local_text, file_name) {
        Ok(meta) => meta,
        Err(err) => return PluginRecord::unknown(file_name).with_error(err),
    };

    let mut record = PluginRecord::from_local(file_name, local);

    let body = match source.fetch(&record.update_url) {
        Ok(body) => body,
        Err(err) => return record.with_error(err),
    };

    let label = format!("{file_name} (remote)");
    let remote = match metadata::extract(&String::from_utf8_lossy(&body), &label) {
        Ok(meta) => meta,
        Err(err) => return record.with_error(err),
    };

    record.remote_version = Some(remote.version.clone());
    record.status = match version::is_newer(&remote.version, &record.local_version) {
        Ok(true) => PluginStatus::UpdateAvailable,
        Ok(false) => PluginStatus::UpToDate,
        Err(err) => PluginStatus::Error(UpdateError::from(err).to_string()),
    };
    record
}

/// Check every file in order. One plugin's failure never skips the others.
///
/// `on_record` sees each record as soon as it is final.
pub fn compute_update_plan(
    folder: &Path,
    files: &[String],
    source: &dyn UpdateSource,
    mut on_record: impl FnMut(&PluginRecord),
) -> Vec<PluginRecord> {
    files
        .iter()
        .map(|file| {
            let record = check_plugin(folder, file, source);
            on_record(&record);
            record
        })
        .collect()
}

/// Re-fetch the plugin and overwrite the local file with the body verbatim.
pub fn apply_update(
    folder: &Path,
    record: &PluginRecord,
    source: &dyn UpdateSource,
) -> Result<(), UpdateError> {
    let body = source.fetch(&record.update_url)?;
    installer::install(&folder.join(&record.file_name), &body)
}

/// Apply every selected record that has an update available.
pub fn apply_selected(
    folder: &Path,
    records: &[PluginRecord],
    selection: &BTreeSet<String>,
    source: &dyn UpdateSource,
    mut on_result: impl FnMut(&str, &Result<(), UpdateError>),
) -> Vec<(String, Result<(), UpdateError>)> {
    records
        .iter()
        .filter(|record| record.is_actionable() && selection.contains(&record.file_name))
        .map(|record| {
            let result = apply_update(folder, record, source);
            on_result(&record.file_name, &result);
            (record.file_name.clone(), result)
        })
        .collect()
}

/// Results of the latest check pass plus the user's selection.
#[derive(Debug, Default)]
pub struct PluginManager {
    records: Vec<PluginRecord>,
    selected: BTreeSet<String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the previous pass. Records are never carried across checks.
    pub fn reset(&mut self) {
        self.records.clear();
        self.selected.clear();
    }

    pub fn push(&mut self, record: PluginRecord) {
        self.records.retain(|r| r.file_name != record.file_name);
        self.records.push(record);
    }

    pub fn records(&self) -> &[PluginRecord] {
        &self.records
    }

    pub fn status_of(&self, file_name: &str) -> Option<&PluginStatus> {
        self.records
            .iter()
            .find(|r| r.file_name == file_name)
            .map(|r| &r.status)
    }

    pub fn updates(&self) -> Vec<&PluginRecord> {
        self.records.iter().filter(|r| r.is_actionable()).collect()
    }

    pub fn is_selected(&self, file_name: &str) -> bool {
        self.selected.contains(file_name)
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Toggle an offered update. Files that were not offered are ignored.
    pub fn toggle(&mut self, file_name: &str) {
        let offered = self
            .records
            .iter()
            .any(|r| r.file_name == file_name && r.is_actionable());
        if !offered {
            return;
        }

        if !self.selected.remove(file_name) {
            self.selected.insert(file_name.to_string());
        }
    }

    pub fn select_all(&mut self, on: bool) {
        self.selected = if on {
            self.updates()
                .into_iter()
                .map(|r| r.file_name.clone())
                .collect()
        } else {
            BTreeSet::new()
        };
    }

    /// Selected records that are still actionable.
    pub fn selected_records(&self) -> Vec<PluginRecord> {
        self.records
            .iter()
            .filter(|r| r.is_actionable() && self.selected.contains(&r.file_name))
            .cloned()
            .collect()
    }

    /// An applied plugin is current now; it leaves the update list.
    pub fn mark_updated(&mut self, file_name: &str) {
        if let Some(record) = self.records.iter_mut().find(|r| r.file_name == file_name) {
            if let Some(remote) = record.remote_version.clone() {
                record.local_version = remote;
            }
            record.status = PluginStatus::UpToDate;
        }
        self.selected.remove(file_name);
    }

    pub fn summary_notification(&self) -> String {
        let count = |want: fn(&PluginStatus) -> bool| {
            self.records.iter().filter(|r| want(&r.status)).count()
        };

        format!(
            "plugins: {} up to date, {} updates available, {} errors",
            count(|s| matches!(s, PluginStatus::UpToDate)),
            count(|s| matches!(s, PluginStatus::UpdateAvailable)),
            count(|s| matches!(s, PluginStatus::Error(_))),
        )
    }
}
