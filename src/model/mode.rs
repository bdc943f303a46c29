/// Application interaction modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal mode — plugin lists, update selection, triggers.
    #[default]
    Normal,
    /// First-run folder prompt. Cancelling it ends the program.
    FolderPrompt,
    /// Command palette (`:` prefix).
    Command,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::FolderPrompt => "FOLDER",
            Mode::Command => "COMMAND",
        }
    }
}
