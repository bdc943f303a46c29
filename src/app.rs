use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::config::AppConfig;
use crate::model::mode::Mode;
use crate::model::plugin_dir::{PluginDir, expand_tilde};
use crate::model::store::FolderStore;
use crate::msg::Msg;
use crate::plugin::PluginManager;
use crate::plugin::error::ConfigMissing;
use crate::plugin::manager::{apply_selected, compute_update_plan};
use crate::plugin::record::{PluginRecord, PluginStatus};
use crate::plugin::source::UpdateSource;
use crate::watch::spawn_folder_watcher;

const ORANGE: Color = Color::Rgb(255, 165, 0);

/// Colour tier of a progress log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Info,
    Ok,
    Available,
    Error,
}

impl Tier {
    fn style(self) -> Style {
        match self {
            Tier::Info => Style::default().fg(Color::Gray),
            Tier::Ok => Style::default().fg(Color::Green),
            Tier::Available => Style::default().fg(ORANGE),
            Tier::Error => Style::default().fg(Color::Red),
        }
    }

    fn of(status: &PluginStatus) -> Self {
        match status {
            PluginStatus::Unknown => Tier::Info,
            PluginStatus::UpToDate => Tier::Ok,
            PluginStatus::UpdateAvailable => Tier::Available,
            PluginStatus::Error(_) => Tier::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Checking,
    Applying,
}

pub struct App {
    pub mode: Mode,
    pub config: AppConfig,
    store: FolderStore,
    pub plugin_dir: Option<PluginDir>,
    pub plugin_manager: PluginManager,
    source: Arc<dyn UpdateSource>,
    pass: Option<Pass>,
    update_cursor: usize,
    pub log: VecDeque<LogLine>,
    folder_input: String,
    command_input: String,
    pub should_quit: bool,
    pub exit_error: Option<ConfigMissing>,
    pub event_tx: mpsc::Sender<Msg>,
    quit_confirm_armed: bool,
    applied: usize,
    failed: usize,
}

impl App {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn UpdateSource>,
        event_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let store = FolderStore::new(config.store_path());
        let mut app = Self {
            mode: Mode::FolderPrompt,
            config,
            store,
            plugin_dir: None,
            plugin_manager: PluginManager::new(),
            source,
            pass: None,
            update_cursor: 0,
            log: VecDeque::new(),
            folder_input: String::new(),
            command_input: String::new(),
            should_quit: false,
            exit_error: None,
            event_tx,
            quit_confirm_armed: false,
            applied: 0,
            failed: 0,
        };

        match app.store.load() {
            Some(folder) => match PluginDir::open(expand_tilde(&folder), &app.extension()) {
                Ok(dir) => app.use_folder(dir),
                Err(err) => {
                    tracing::warn!("stored plugins folder unusable: {err}");
                    app.push_log(format!("{err}; choose the plugins folder again"), Tier::Error);
                    app.folder_input = folder;
                }
            },
            None => tracing::info!("no plugins folder stored, prompting"),
        }

        app
    }

    fn extension(&self) -> String {
        self.config.general.plugin_extension.clone()
    }

    fn use_folder(&mut self, dir: PluginDir) {
        tracing::info!(
            "plugins folder {} ({} plugins)",
            dir.root().display(),
            dir.files.len()
        );
        spawn_folder_watcher(
            dir.root().to_path_buf(),
            dir.extension().to_string(),
            self.event_tx.clone(),
        );
        self.push_log(
            format!("{} plugins in {}", dir.files.len(), dir.root().display()),
            Tier::Info,
        );
        self.plugin_dir = Some(dir);
        self.mode = Mode::Normal;
    }

    fn push_log(&mut self, text: String, tier: Tier) {
        self.log.push_back(LogLine { text, tier });
        while self.log.len() > self.config.ui.log_capacity.max(1) {
            self.log.pop_front();
        }
    }

    fn is_busy(&self) -> bool {
        self.pass.is_some()
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Resize => {}
            Msg::Command(command) => self.handle_command(command),
            Msg::FolderChanged(path) => self.handle_folder_changed(path),
            Msg::PluginChecked(record) => self.handle_plugin_checked(record),
            Msg::CheckFinished => self.handle_check_finished(),
            Msg::PluginApplied { file_name, result } => {
                self.handle_plugin_applied(file_name, result)
            }
            Msg::ApplyFinished => self.handle_apply_finished(),
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::FolderPrompt => self.handle_key_folder_prompt(key),
            Mode::Command => self.handle_key_command(key),
        }
        Ok(())
    }

    fn handle_key_normal(&mut self, key: KeyEvent) {
        if key.code != KeyCode::Char('q') {
            self.quit_confirm_armed = false;
        }

        match key.code {
            KeyCode::Char('q') => {
                if self.pass != Some(Pass::Applying) || self.quit_confirm_armed {
                    self.should_quit = true;
                } else {
                    self.quit_confirm_armed = true;
                }
            }
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_input.clear();
            }
            KeyCode::Char('c') => self.start_check(),
            KeyCode::Char('a') | KeyCode::Enter => self.start_apply(),
            KeyCode::Char('r') => self.rescan(),
            KeyCode::Char('A') => self.toggle_all(),
            KeyCode::Char(' ') => self.toggle_under_cursor(),
            KeyCode::Char('j') | KeyCode::Down => self.move_update_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_update_cursor(-1),
            _ => {}
        }
    }

    fn handle_key_folder_prompt(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                tracing::error!("folder selection cancelled");
                self.exit_error = Some(ConfigMissing);
                self.should_quit = true;
            }
            KeyCode::Enter => self.commit_folder(),
            KeyCode::Backspace => {
                self.folder_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.folder_input.push(ch);
            }
            _ => {}
        }
    }

    fn handle_key_command(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                let command = self.command_input.trim().to_string();
                self.mode = Mode::Normal;
                self.command_input.clear();

                if !command.is_empty() {
                    let _ = self.event_tx.send(Msg::Command(command));
                }
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.command_input.push(ch);
            }
            _ => {}
        }
    }

    fn handle_command(&mut self, command: String) {
        match command.trim() {
            "check" | "c" => self.start_check(),
            "apply" | "a" => self.start_apply(),
            "rescan" | "r" => self.rescan(),
            "select all" => self.plugin_manager.select_all(true),
            "select none" => self.plugin_manager.select_all(false),
            "quit" | "q" => {
                let _ = self.event_tx.send(Msg::Quit);
            }
            "help" => {
                for line in [
                    "commands:",
                    "  check (c)       check every plugin for updates",
                    "  apply (a)       apply the selected updates",
                    "  select all | select none",
                    "  rescan (r)      re-list the plugins folder",
                    "  quit (q)",
                    "keys: c check, space toggle, A toggle all, a/enter apply, q quit",
                ] {
                    self.push_log(line.to_string(), Tier::Info);
                }
            }
            other => self.push_log(format!("unknown command: {other}"), Tier::Error),
        }
    }

    fn commit_folder(&mut self) {
        let raw = self.folder_input.trim().to_string();
        if raw.is_empty() {
            return;
        }

        let dir = match PluginDir::open(expand_tilde(&raw), &self.extension()) {
            Ok(dir) => dir,
            Err(err) => {
                self.push_log(err.to_string(), Tier::Error);
                return;
            }
        };

        let folder = std::fs::canonicalize(dir.root())
            .unwrap_or_else(|_| dir.root().to_path_buf())
            .display()
            .to_string();
        if let Err(err) = self.store.save(&folder) {
            tracing::error!("cannot save {}: {err}", self.store.path().display());
            self.push_log(
                format!("cannot remember folder in {}: {err}", self.store.path().display()),
                Tier::Error,
            );
        }

        self.folder_input.clear();
        self.use_folder(dir);
    }

    fn rescan(&mut self) {
        if let Some(dir) = self.plugin_dir.as_mut() {
            dir.refresh();
            let count = dir.files.len();
            self.push_log(format!("{count} plugins found"), Tier::Info);
        }
    }

    fn handle_folder_changed(&mut self, path: PathBuf) {
        if let Some(dir) = self.plugin_dir.as_mut()
            && dir.contains(&path)
        {
            dir.refresh();
        }
    }

    fn move_update_cursor(&mut self, delta: isize) {
        let count = self.plugin_manager.updates().len();
        if count == 0 {
            self.update_cursor = 0;
            return;
        }

        let max = count.saturating_sub(1) as isize;
        self.update_cursor = (self.update_cursor as isize + delta).clamp(0, max) as usize;
    }

    fn toggle_under_cursor(&mut self) {
        let file_name = self
            .plugin_manager
            .updates()
            .get(self.update_cursor)
            .map(|r| r.file_name.clone());
        if let Some(file_name) = file_name {
            self.plugin_manager.toggle(&file_name);
        }
    }

    fn toggle_all(&mut self) {
        let all = self.plugin_manager.updates().len();
        let selected = self.plugin_manager.selected_records().len();
        self.plugin_manager.select_all(selected < all);
    }

    // ── Passes ───────────────────────────────────────────────────

    fn start_check(&mut self) {
        if self.is_busy() {
            self.push_log("a pass is already running".to_string(), Tier::Info);
            return;
        }
        let Some(dir) = self.plugin_dir.as_ref() else {
            return;
        };

        let folder = dir.root().to_path_buf();
        let files = dir.files.clone();

        self.plugin_manager.reset();
        self.update_cursor = 0;
        self.log.clear();
        self.pass = Some(Pass::Checking);
        self.push_log(format!("checking {} plugins...", files.len()), Tier::Info);
        tracing::info!("check pass started for {} plugins", files.len());

        spawn_check(folder, files, self.source.clone(), self.event_tx.clone());
    }

    fn handle_plugin_checked(&mut self, record: PluginRecord) {
        match &record.status {
            PluginStatus::Error(cause) => tracing::warn!("{}: {cause}", record.file_name),
            status => tracing::info!("{}: {}", record.file_name, status.label()),
        }

        self.push_log(record.status_line(), Tier::of(&record.status));
        self.plugin_manager.push(record);
    }

    fn handle_check_finished(&mut self) {
        self.pass = None;
        self.move_update_cursor(0);
        let summary = self.plugin_manager.summary_notification();
        tracing::info!("{summary}");
        self.push_log(summary, Tier::Info);
    }

    fn start_apply(&mut self) {
        if self.is_busy() {
            self.push_log("a pass is already running".to_string(), Tier::Info);
            return;
        }
        let Some(dir) = self.plugin_dir.as_ref() else {
            return;
        };

        let selected = self.plugin_manager.selected_records();
        if selected.is_empty() {
            self.push_log("no updates selected".to_string(), Tier::Info);
            return;
        }

        let folder = dir.root().to_path_buf();
        let records = self.plugin_manager.records().to_vec();
        let selection = self.plugin_manager.selection().clone();

        self.pass = Some(Pass::Applying);
        self.applied = 0;
        self.failed = 0;
        self.push_log(format!("updating {} plugins...", selected.len()), Tier::Info);
        tracing::info!("apply pass started for {} plugins", selected.len());

        spawn_apply(
            folder,
            records,
            selection,
            self.source.clone(),
            self.event_tx.clone(),
        );
    }

    fn handle_plugin_applied(&mut self, file_name: String, result: Result<(), String>) {
        match result {
            Ok(()) => {
                tracing::info!("{file_name}: updated");
                self.applied += 1;
                self.push_log(format!("{file_name} - updated"), Tier::Ok);
                self.plugin_manager.mark_updated(&file_name);
                self.move_update_cursor(0);
            }
            Err(err) => {
                tracing::error!("{file_name}: update failed: {err}");
                self.failed += 1;
                self.push_log(format!("{file_name} - update failed: {err}"), Tier::Error);
            }
        }
    }

    fn handle_apply_finished(&mut self) {
        self.pass = None;
        self.quit_confirm_armed = false;
        if let Some(dir) = self.plugin_dir.as_mut() {
            dir.refresh();
        }
        let summary = format!("updates: {} applied, {} failed", self.applied, self.failed);
        tracing::info!("{summary}");
        self.push_log(summary, Tier::Info);
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),      // header
                Constraint::Percentage(50), // plugins + updates
                Constraint::Min(3),         // progress log
                Constraint::Length(1),      // status bar
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);

        let lists = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_plugin_list(frame, lists[0]);
        self.render_update_list(frame, lists[1]);
        self.render_progress_log(frame, chunks[2]);
        self.render_status_bar(frame, chunks[3]);

        match self.mode {
            Mode::FolderPrompt => self.render_folder_overlay(frame),
            Mode::Command => self.render_command_overlay(frame),
            Mode::Normal => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let folder = self
            .plugin_dir
            .as_ref()
            .map(|dir| dir.root().display().to_string())
            .unwrap_or_else(|| "no plugins folder".to_string());

        let header = Line::from(vec![
            Span::styled(
                " plugsync ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {folder}"), Style::default().fg(Color::Gray)),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn render_plugin_list(&self, frame: &mut Frame, area: Rect) {
        let files = self
            .plugin_dir
            .as_ref()
            .map(|dir| dir.files.as_slice())
            .unwrap_or_default();

        let lines: Vec<Line> = if files.is_empty() {
            vec![Line::from(Span::styled(
                "no plugins found",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            files
                .iter()
                .map(|file| match self.plugin_manager.status_of(file) {
                    Some(status) => Line::from(vec![
                        Span::styled(file.clone(), Style::default().fg(Color::White)),
                        Span::styled(format!(" : {}", status.label()), Tier::of(status).style()),
                    ]),
                    None => Line::from(Span::styled(file.clone(), Style::default().fg(Color::Gray))),
                })
                .collect()
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(format!(" Plugins ({}) ", files.len()))
                    .borders(Borders::ALL),
            ),
            area,
        );
    }

    fn render_update_list(&self, frame: &mut Frame, area: Rect) {
        let updates = self.plugin_manager.updates();

        let lines: Vec<Line> = if updates.is_empty() {
            let hint = if self.pass == Some(Pass::Checking) {
                "checking..."
            } else {
                "press c to check for updates"
            };
            vec![Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))]
        } else {
            updates
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    let mark = if self.plugin_manager.is_selected(&record.file_name) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    let content = format!("{mark} {}", record.update_label());

                    if idx == self.update_cursor {
                        Line::from(Span::styled(
                            content,
                            Style::default().fg(Color::Black).bg(Color::Cyan),
                        ))
                    } else {
                        Line::from(Span::styled(content, Style::default().fg(ORANGE)))
                    }
                })
                .collect()
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(" Updates (space select, a apply) ")
                    .borders(Borders::ALL),
            ),
            area,
        );
    }

    fn render_progress_log(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.log.len().saturating_sub(visible);

        let lines: Vec<Line> = self
            .log
            .iter()
            .skip(skip)
            .map(|line| Line::from(Span::styled(line.text.clone(), line.tier.style())))
            .collect();

        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title(" Progress ").borders(Borders::ALL)),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let mut suffix = match self.pass {
            Some(Pass::Checking) => " | checking...".to_string(),
            Some(Pass::Applying) => " | updating...".to_string(),
            None => format!(" | {} selected", self.plugin_manager.selection().len()),
        };

        match self.mode {
            Mode::Command => suffix.push_str(&format!(" | :{}", self.command_input)),
            Mode::FolderPrompt => suffix.push_str(" | enter accept, esc quit"),
            Mode::Normal => suffix.push_str(" | c check  a apply  : command  q quit"),
        }

        if self.quit_confirm_armed {
            suffix.push_str(" | update in progress, press q again to quit");
        }

        let info = Span::styled(suffix, Style::default().fg(Color::Gray).bg(Color::DarkGray));

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }

    fn render_folder_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(self.folder_input.as_str()).block(
            Block::default()
                .title(" Select plugins folder ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 1 + self.folder_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn render_command_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(format!(":{}", self.command_input)).block(
            Block::default()
                .title(" Command ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 2 + self.command_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn spawn_check(
    folder: PathBuf,
    files: Vec<String>,
    source: Arc<dyn UpdateSource>,
    tx: mpsc::Sender<Msg>,
) {
    std::thread::spawn(move || {
        compute_update_plan(&folder, &files, source.as_ref(), |record| {
            let _ = tx.send(Msg::PluginChecked(record.clone()));
        });
        let _ = tx.send(Msg::CheckFinished);
    });
}

fn spawn_apply(
    folder: PathBuf,
    records: Vec<PluginRecord>,
    selection: BTreeSet<String>,
    source: Arc<dyn UpdateSource>,
    tx: mpsc::Sender<Msg>,
) {
    std::thread::spawn(move || {
        apply_selected(&folder, &records, &selection, source.as_ref(), |file, result| {
            let _ = tx.send(Msg::PluginApplied {
                file_name: file.to_string(),
                result: result.as_ref().map(|_| ()).map_err(|e| e.to_string()),
            });
        });
        let _ = tx.send(Msg::ApplyFinished);
    });
}
