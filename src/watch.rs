use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::model::plugin_dir::has_extension;
use crate::msg::Msg;

/// Watch the plugins folder and emit `FolderChanged` once per plugin file
/// touched by an event. Temp files and other extensions are ignored.
pub fn spawn_folder_watcher(folder: PathBuf, extension: String, tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in plugin_paths(&event, &extension) {
                    if tx.send(Msg::FolderChanged(path)).is_err() {
                        return;
                    }
                }
            }
            Err(err) => tracing::warn!("folder watcher error: {err}"),
        };

        let mut watcher: RecommendedWatcher = match notify::recommended_watcher(handler) {
            Ok(w) => w,
            Err(err) => {
                tracing::warn!("failed to initialize folder watcher: {err}");
                return;
            }
        };

        if let Err(err) = watcher.watch(&folder, RecursiveMode::NonRecursive) {
            tracing::warn!("failed to watch plugins folder {}: {err}", folder.display());
            return;
        }

        tracing::info!("watching {}", folder.display());
        loop {
            thread::park();
        }
    });
}

/// Plugin files an event added, changed or removed, without repeats.
fn plugin_paths(event: &Event, extension: &str) -> BTreeSet<PathBuf> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return BTreeSet::new();
    }

    event
        .paths
        .iter()
        .filter(|path| has_extension(path, extension))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind, RenameMode};

    #[test]
    fn only_plugin_files_are_reported() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/p/a.plugin.js"))
            .add_path(PathBuf::from("/p/a.plugin.js.plugsync-tmp"))
            .add_path(PathBuf::from("/p/notes.txt"));

        assert_eq!(
            plugin_paths(&event, "js"),
            BTreeSet::from([PathBuf::from("/p/a.plugin.js")])
        );
    }

    #[test]
    fn temp_rename_reports_the_plugin_once() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/p/a.plugin.js.plugsync-tmp"))
            .add_path(PathBuf::from("/p/a.plugin.js"))
            .add_path(PathBuf::from("/p/a.plugin.js"));

        assert_eq!(plugin_paths(&event, "js").len(), 1);
    }

    #[test]
    fn removals_count_and_reads_do_not() {
        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/p/gone.JS"));
        assert_eq!(plugin_paths(&removed, "js").len(), 1);

        let read = Event::new(EventKind::Access(AccessKind::Read))
            .add_path(PathBuf::from("/p/a.plugin.js"));
        assert!(plugin_paths(&read, "js").is_empty());
    }
}
