use crossterm::event::KeyEvent;
use std::path::PathBuf;

use crate::plugin::record::PluginRecord;

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize,

    // -- Commands
    Command(String),

    // -- Plugins folder
    FolderChanged(PathBuf),

    // -- Check pass
    PluginChecked(PluginRecord),
    CheckFinished,

    // -- Apply pass
    PluginApplied {
        file_name: String,
        result: Result<(), String>,
    },
    ApplyFinished,

    // -- System
    Quit,
}
