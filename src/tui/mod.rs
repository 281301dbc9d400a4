pub mod bookmark_grid;
pub mod help_overlay;
pub mod history_panel;
pub mod status_bar;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

use crate::action::ActionRecord;
use crate::applier::{Signal, UndoManager};
use crate::bookmark::{BookmarkNode, ROOT_ID};
use crate::config::Config;
use crate::filters::ActionFilters;
use crate::keymap::{Action, InputMode, KeyMapper};
use crate::log;
use crate::mutations::{self, MutationError};
use crate::profile::Profile;
use crate::store::Store;

use self::bookmark_grid::BookmarkGrid;
use self::help_overlay::HelpOverlay;
use self::history_panel::{HistoryPanel, HistoryRow};
use self::status_bar::{BottomBar, TopBar};

const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    BookmarkTitle,
    BookmarkUrl { title: String },
    FolderTitle,
    Rename { id: String },
    EditUrl { id: String },
}

impl PromptKind {
    fn label(&self) -> &'static str {
        match self {
            PromptKind::BookmarkTitle => "Bookmark title",
            PromptKind::BookmarkUrl { .. } => "URL",
            PromptKind::FolderTitle => "Folder name",
            PromptKind::Rename { .. } => "Rename",
            PromptKind::EditUrl { .. } => "Edit URL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

pub struct App<S: Store + Clone> {
    // Core state
    pub profile: Profile<S>,
    pub config: Config,
    pub current_folder: String,
    pub nodes: Vec<BookmarkNode>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub keymap: KeyMapper,
    pub should_quit: bool,

    // Mode
    pub mode: InputMode,

    // History panel (open while Some)
    pub history: Option<UndoManager<S>>,
    pub history_selected: usize,
    pub history_scroll: usize,
    pub filters: ActionFilters,

    // Node id waiting to be pasted
    pub clipboard: Option<String>,

    pub prompt: Option<Prompt>,
    pub help_scroll: u16,

    // Status message (temporary feedback)
    pub status_message: Option<String>,
    pub status_time: Option<Instant>,

    signal_tx: UnboundedSender<Signal>,
    signal_rx: UnboundedReceiver<Signal>,
}

impl<S: Store + Clone> App<S> {
    pub fn new(profile: Profile<S>, config: Config) -> Self {
        let (signal_tx, signal_rx) = unbounded_channel();
        let filters = config.filters.clone();
        let mut app = Self {
            profile,
            config,
            current_folder: ROOT_ID.to_string(),
            nodes: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            keymap: KeyMapper::new(),
            should_quit: false,
            mode: InputMode::Normal,
            history: None,
            history_selected: 0,
            history_scroll: 0,
            filters,
            clipboard: None,
            prompt: None,
            help_scroll: 0,
            status_message: None,
            status_time: None,
            signal_tx,
            signal_rx,
        };
        app.refresh_current_folder();
        app
    }

    /// Re-read the current folder from the tree, falling back to the root
    /// if it no longer exists.
    pub fn refresh_current_folder(&mut self) {
        let folder = match self.profile.tree.find(&self.current_folder) {
            Some(folder) if folder.is_folder() => folder,
            _ => {
                self.current_folder = ROOT_ID.to_string();
                &self.profile.tree.root
            }
        };
        self.nodes = folder.children.clone();
        self.clamp_selection();
    }

    fn selected_node(&self) -> Option<&BookmarkNode> {
        self.nodes.get(self.selected)
    }

    fn clamp_selection(&mut self) {
        if self.nodes.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.nodes.len() {
            self.selected = self.nodes.len() - 1;
        }
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_time = Some(Instant::now());
    }

    fn clear_stale_status(&mut self) {
        if let Some(t) = self.status_time {
            if t.elapsed() > STATUS_TTL {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }

    /// Handle everything the history engine asked for since the last call.
    pub fn drain_signals(&mut self) {
        while let Ok(signal) = self.signal_rx.try_recv() {
            match signal {
                Signal::RefreshCurrentFolder => self.refresh_current_folder(),
                Signal::Toast(msg) => self.set_status(msg),
            }
        }
    }

    fn path_display(&self) -> String {
        self.profile.tree.path_titles(&self.current_folder).join(" / ")
    }

    // ── Bookmark edits ──────────────────────────────────────────────

    /// Persist the tree and log the action produced by a mutation.
    ///
    /// The action is logged even when the tree could not be saved, so the
    /// change made in memory can still be undone.
    async fn commit_mutation(&mut self, outcome: Result<ActionRecord, MutationError>, done: &str) {
        let record = match outcome {
            Ok(record) => record,
            Err(e) => {
                self.set_status(format!("Error: {}", e));
                return;
            }
        };
        let saved = self.profile.save().await;
        if let Err(e) = &saved {
            tracing::error!(error = %e, "failed to save bookmarks");
        }
        let logged = log::add_action(self.profile.store(), &self.config.undo_manager, record).await;
        if let Err(e) = &logged {
            tracing::error!(error = %e, "failed to record action");
        }
        match (saved, logged) {
            (Ok(()), Ok(_)) => self.set_status(done.to_string()),
            (Err(_), Ok(_)) => self.set_status(format!("{}, but bookmarks could not be saved", done)),
            (Ok(()), Err(e)) => self.set_status(format!("{} (not in history: {})", done, e)),
            (Err(_), Err(_)) => self.set_status("Could not save bookmarks or history"),
        }
        self.refresh_current_folder();
    }

    fn start_prompt(&mut self, kind: PromptKind, input: String) {
        self.prompt = Some(Prompt { kind, input });
        self.mode = InputMode::Prompt;
    }

    async fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            self.mode = InputMode::Normal;
            return;
        };
        self.mode = InputMode::Normal;
        let input = prompt.input.trim().to_string();
        let folder = self.current_folder.clone();

        match prompt.kind {
            PromptKind::BookmarkTitle => {
                if !input.is_empty() {
                    self.start_prompt(PromptKind::BookmarkUrl { title: input }, String::new());
                }
            }
            PromptKind::BookmarkUrl { title } => {
                let node = BookmarkNode::bookmark(mutations::new_node_id(), title, input);
                let outcome = mutations::create_node(&mut self.profile.tree, &folder, node);
                self.commit_mutation(outcome, "Bookmark added").await;
            }
            PromptKind::FolderTitle => {
                if input.is_empty() {
                    return;
                }
                let node = BookmarkNode::folder(mutations::new_node_id(), input);
                let outcome = mutations::create_node(&mut self.profile.tree, &folder, node);
                self.commit_mutation(outcome, "Folder added").await;
            }
            PromptKind::Rename { id } => {
                let outcome = mutations::edit_node(&mut self.profile.tree, &id, Some(input), None, None);
                self.commit_mutation(outcome, "Renamed").await;
            }
            PromptKind::EditUrl { id } => {
                let outcome = mutations::edit_node(&mut self.profile.tree, &id, None, Some(input), None);
                self.commit_mutation(outcome, "URL updated").await;
            }
        }
    }

    async fn paste(&mut self) {
        let Some(id) = self.clipboard.take() else {
            self.set_status("Nothing to paste");
            return;
        };
        if self.profile.tree.has_child(&self.current_folder, &id) {
            self.set_status("Already in this folder");
            return;
        }
        let folder = self.current_folder.clone();
        let outcome = mutations::move_node(&mut self.profile.tree, &id, &folder);
        self.commit_mutation(outcome, "Moved").await;
    }

    /// Drop every stored history entry about the selected tile.
    async fn forget_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let id = node.id.clone();
        let title = node.display_title().to_string();
        match log::remove_all_action_by_key(self.profile.store(), &self.config.undo_manager, &id).await {
            Ok(0) => self.set_status(format!("No history for \"{}\"", title)),
            Ok(n) => self.set_status(format!("Forgot {} history entries for \"{}\"", n, title)),
            Err(e) => {
                tracing::error!(error = %e, "failed to forget history");
                self.set_status(format!("Could not forget history: {}", e));
            }
        }
    }

    async fn share_selected(&mut self) {
        let Some(node) = self.selected_node().cloned() else {
            return;
        };
        match self.profile.stage_sync_payload(&node).await {
            Ok(()) => self.set_status(format!("Shared \"{}\"", node.display_title())),
            Err(e) => {
                tracing::error!(error = %e, "failed to stage sync payload");
                self.set_status("Could not share");
            }
        }
    }

    async fn import_shared(&mut self) {
        let node = match self.profile.take_sync_payload().await {
            Ok(Some(node)) => node,
            Ok(None) => {
                self.set_status("Nothing shared");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read sync payload");
                self.set_status("Could not read shared bookmark");
                return;
            }
        };
        let folder = self.current_folder.clone();
        let copy = mutations::copy_with_fresh_ids(&node, &folder);
        let outcome = mutations::create_node(&mut self.profile.tree, &folder, copy);
        self.commit_mutation(outcome, "Imported").await;
    }

    // ── History panel ───────────────────────────────────────────────

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        let Some(manager) = &self.history else {
            return Vec::new();
        };
        self.filters
            .visible(manager.actions())
            .into_iter()
            .map(|r| HistoryRow::from_record(r, manager.is_quarantined(r.item_id())))
            .collect()
    }

    fn selected_history_record(&self) -> Option<&ActionRecord> {
        let manager = self.history.as_ref()?;
        self.filters
            .visible(manager.actions())
            .get(self.history_selected)
            .copied()
    }

    fn selected_history_id(&self) -> Option<String> {
        self.selected_history_record().map(|r| r.id.clone())
    }

    fn clamp_history_selection(&mut self) {
        let len = self.history_rows().len();
        if len == 0 {
            self.history_selected = 0;
        } else if self.history_selected >= len {
            self.history_selected = len - 1;
        }
    }

    pub async fn open_history(&mut self) {
        let store = self.profile.store().clone();
        match UndoManager::open(
            store,
            &self.config.undo_manager,
            self.filters.mode(),
            self.signal_tx.clone(),
        )
        .await
        {
            Ok(manager) => {
                self.history = Some(manager);
                self.history_selected = 0;
                self.history_scroll = 0;
                self.mode = InputMode::History;
                if !self.config.undo_manager.status {
                    self.set_status("History recording is switched off");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load history");
                self.set_status(format!("Could not load history: {}", e));
            }
        }
    }

    pub async fn close_history(&mut self) {
        self.mode = InputMode::Normal;
        let Some(manager) = self.history.take() else {
            return;
        };
        match manager.close().await {
            Ok(pruned) => {
                tracing::debug!(pruned, "history closed");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save history");
                self.set_status("Could not save history");
            }
        }
        self.refresh_current_folder();
    }

    async fn history_step(&mut self, undo: bool) {
        let Some(id) = self.selected_history_id() else {
            return;
        };
        let Some(manager) = self.history.as_mut() else {
            return;
        };
        let outcome = if undo {
            manager.undo_action(&mut self.profile, &id).await
        } else {
            manager.redo_action(&mut self.profile, &id).await
        };
        match outcome {
            Ok(()) => self.set_status(if undo { "Undone" } else { "Redone" }),
            // Inconsistencies already raised a toast.
            Err(e) if e.is_inconsistency() => {}
            Err(e) => self.set_status(e.to_string()),
        }
    }

    async fn history_delete(&mut self) {
        let Some(id) = self.selected_history_id() else {
            return;
        };
        let Some(manager) = self.history.as_mut() else {
            return;
        };
        if let Err(e) = manager.delete_action(&id).await {
            tracing::error!(error = %e, "failed to delete history entry");
            self.set_status(format!("Could not delete entry: {}", e));
        }
        self.clamp_history_selection();
    }

    async fn history_forget(&mut self) {
        let Some(item_id) = self.selected_history_record().map(|r| r.item_id().to_string()) else {
            return;
        };
        let Some(manager) = self.history.as_mut() else {
            return;
        };
        match manager.forget_item(&item_id).await {
            Ok(n) => self.set_status(format!("Forgot {} entries", n)),
            Err(e) => {
                tracing::error!(error = %e, "failed to forget history");
                self.set_status(format!("Could not forget history: {}", e));
            }
        }
        self.clamp_history_selection();
    }

    async fn history_clear(&mut self) {
        let Some(manager) = self.history.as_mut() else {
            return;
        };
        match manager.clear().await {
            Ok(()) => self.set_status("History cleared"),
            Err(e) => {
                tracing::error!(error = %e, "failed to clear history");
                self.set_status(format!("Could not clear history: {}", e));
            }
        }
        self.history_selected = 0;
    }

    fn regroup_history(&mut self) {
        let mode = self.filters.mode();
        if let Some(manager) = self.history.as_mut() {
            manager.set_mode(mode);
        }
        self.clamp_history_selection();
    }

    // ── Action dispatch ─────────────────────────────────────────────

    pub async fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            // Navigation
            Action::MoveDown => match self.mode {
                InputMode::History => {
                    if self.history_selected + 1 < self.history_rows().len() {
                        self.history_selected += 1;
                    }
                }
                InputMode::Help => self.help_scroll = self.help_scroll.saturating_add(3),
                _ => {
                    if self.selected + 1 < self.nodes.len() {
                        self.selected += 1;
                    }
                }
            },
            Action::MoveUp => match self.mode {
                InputMode::History => self.history_selected = self.history_selected.saturating_sub(1),
                InputMode::Help => self.help_scroll = self.help_scroll.saturating_sub(3),
                _ => self.selected = self.selected.saturating_sub(1),
            },
            Action::JumpTop => self.selected = 0,
            Action::JumpBottom => self.selected = self.nodes.len().saturating_sub(1),
            Action::OpenFolder => {
                let folder = self
                    .selected_node()
                    .filter(|n| n.is_folder())
                    .map(|n| n.id.clone());
                if let Some(id) = folder {
                    self.current_folder = id;
                    self.selected = 0;
                    self.scroll_offset = 0;
                    self.refresh_current_folder();
                }
            }
            Action::ParentFolder => {
                let parent = self
                    .profile
                    .tree
                    .find(&self.current_folder)
                    .and_then(|f| f.parent_id.clone());
                if let Some(parent) = parent {
                    let from = std::mem::replace(&mut self.current_folder, parent);
                    self.refresh_current_folder();
                    self.selected = self.nodes.iter().position(|n| n.id == from).unwrap_or(0);
                }
            }

            // Bookmark edits
            Action::NewBookmark => self.start_prompt(PromptKind::BookmarkTitle, String::new()),
            Action::NewFolder => self.start_prompt(PromptKind::FolderTitle, String::new()),
            Action::Rename => {
                if let Some(node) = self.selected_node() {
                    let kind = PromptKind::Rename { id: node.id.clone() };
                    let title = node.title.clone();
                    self.start_prompt(kind, title);
                }
            }
            Action::EditUrl => {
                if let Some(node) = self.selected_node() {
                    if node.is_folder() {
                        self.set_status("Folders have no URL");
                    } else {
                        let kind = PromptKind::EditUrl { id: node.id.clone() };
                        let url = node.url.clone();
                        self.start_prompt(kind, url);
                    }
                }
            }
            Action::Delete => {
                if let Some(id) = self.selected_node().map(|n| n.id.clone()) {
                    let outcome = mutations::delete_node(&mut self.profile.tree, &id);
                    self.commit_mutation(outcome, "Deleted").await;
                }
            }
            Action::Duplicate => {
                if let Some(id) = self.selected_node().map(|n| n.id.clone()) {
                    let outcome = mutations::duplicate_node(&mut self.profile.tree, &id);
                    self.commit_mutation(outcome, "Duplicated").await;
                }
            }
            Action::Cut => {
                if let Some(node) = self.selected_node() {
                    let msg = format!("Cut \"{}\"; open a folder and press p", node.display_title());
                    let id = node.id.clone();
                    self.clipboard = Some(id);
                    self.set_status(msg);
                }
            }
            Action::Paste => self.paste().await,
            Action::ForgetHistory => self.forget_selected().await,
            Action::Share => self.share_selected().await,
            Action::ImportShared => self.import_shared().await,

            // History panel
            Action::OpenHistory => self.open_history().await,
            Action::CloseHistory => self.close_history().await,
            Action::HistoryUndo => self.history_step(true).await,
            Action::HistoryRedo => self.history_step(false).await,
            Action::HistoryDelete => self.history_delete().await,
            Action::HistoryForget => self.history_forget().await,
            Action::HistoryClear => self.history_clear().await,
            Action::ToggleKind(kind) => {
                self.filters.toggle_kind(kind);
                self.clamp_history_selection();
            }
            Action::ToggleBookmarks => {
                self.filters.show_bookmarks = !self.filters.show_bookmarks;
                self.clamp_history_selection();
            }
            Action::ToggleFolders => {
                self.filters.show_folders = !self.filters.show_folders;
                self.clamp_history_selection();
            }
            Action::ToggleGrouping => {
                self.filters.group_same_id = !self.filters.group_same_id;
                self.regroup_history();
            }

            // Help
            Action::ShowHelp => {
                self.help_scroll = 0;
                self.mode = InputMode::Help;
            }
            Action::CloseHelp => self.mode = InputMode::Normal,

            // Text input
            Action::InputChar(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            Action::InputBackspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            Action::InputSubmit => self.submit_prompt().await,
            Action::InputCancel => {
                self.prompt = None;
                self.mode = InputMode::Normal;
            }

            Action::Quit => {
                if self.history.is_some() {
                    self.close_history().await;
                }
                self.should_quit = true;
            }
            Action::Noop => {}
        }
        self.drain_signals();
        Ok(())
    }

    fn hints(&self) -> &'static str {
        match self.mode {
            InputMode::History => "z:undo  y:redo  x:delete  X:forget item  g:group  q:close",
            InputMode::Help => "j/k:scroll  q:close",
            _ => "a:add  A:folder  r:rename  d:delete  c:dup  x/p:move  u:history  ?:help  q:quit",
        }
    }
}

pub async fn run<S: Store + Clone>(mut app: App<S>) -> Result<()> {
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let sequence_timeout = Duration::from_millis(1000);
    let mut last_key_time = Instant::now();
    let mut event_stream = EventStream::new();

    loop {
        app.clear_stale_status();

        terminal.draw(|frame| {
            let size = frame.area();
            let outer = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            let folder_count = app.nodes.iter().filter(|n| n.is_folder()).count();
            let path = app.path_display();
            frame.render_widget(
                TopBar {
                    path: &path,
                    folder_count,
                    bookmark_count: app.nodes.len() - folder_count,
                    undo_enabled: app.config.undo_manager.status,
                },
                outer[0],
            );

            let body_height = outer[1].height as usize;
            let (start, _) =
                BookmarkGrid::visible_range(app.selected, app.scroll_offset, body_height, app.nodes.len());
            app.scroll_offset = start;
            frame.render_widget(
                BookmarkGrid {
                    nodes: &app.nodes,
                    selected: app.selected,
                    offset: app.scroll_offset,
                    cut: app.clipboard.as_deref(),
                },
                outer[1],
            );

            if app.mode == InputMode::History {
                let rows = app.history_rows();
                let total = app.history.as_ref().map(|m| m.log().len()).unwrap_or(0);
                let desc = app.filters.description();
                let panel_height = size.height.saturating_sub(9) as usize;
                let (start, _) =
                    BookmarkGrid::visible_range(app.history_selected, app.history_scroll, panel_height.max(1), rows.len());
                app.history_scroll = start;
                frame.render_widget(
                    HistoryPanel {
                        rows: &rows,
                        selected: app.history_selected,
                        offset: app.history_scroll,
                        total,
                        filter_desc: desc.as_deref(),
                    },
                    outer[1],
                );
            }

            if app.mode == InputMode::Help {
                frame.render_widget(HelpOverlay { scroll: app.help_scroll }, size);
            }

            let prompt = app
                .prompt
                .as_ref()
                .map(|p| (p.kind.label(), p.input.as_str()));
            frame.render_widget(
                BottomBar {
                    hints: app.hints(),
                    pending_key: app.keymap.pending_display(),
                    prompt,
                    status: app.status_message.as_deref(),
                },
                outer[2],
            );
        })?;

        if app.should_quit {
            break;
        }

        let timeout = if app.keymap.has_pending() {
            sequence_timeout.saturating_sub(last_key_time.elapsed())
        } else if app.status_time.is_some() {
            STATUS_TTL
        } else {
            Duration::from_secs(60)
        };
        if app.keymap.has_pending() && last_key_time.elapsed() >= sequence_timeout {
            app.keymap.cancel_pending();
        }

        let event = tokio::select! {
            ev = event_stream.next() => ev.and_then(|r| r.ok()),
            _ = tokio::time::sleep(timeout) => None,
        };

        if let Some(Event::Key(key)) = event {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            last_key_time = Instant::now();
            let action = app.keymap.handle(key, &app.mode);
            if let Err(e) = app.handle_action(action).await {
                app.set_status(format!("Error: {}", e));
            }
        }
    }

    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::ActionLog;
    use crate::store::MemoryStore;

    async fn app() -> App<MemoryStore> {
        let profile = Profile::load(MemoryStore::new()).await.unwrap();
        App::new(profile, Config::default())
    }

    async fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::InputChar(c)).await.unwrap();
        }
        app.handle_action(Action::InputSubmit).await.unwrap();
    }

    async fn stored_log(app: &App<MemoryStore>) -> ActionLog {
        ActionLog::load(app.profile.store(), 50).await.unwrap()
    }

    #[tokio::test]
    async fn add_bookmark_records_history() {
        let mut app = app().await;
        app.handle_action(Action::NewBookmark).await.unwrap();
        assert_eq!(app.mode, InputMode::Prompt);
        type_text(&mut app, "Docs").await;
        type_text(&mut app, "https://docs.rs").await;

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.nodes.len(), 1);
        assert_eq!(app.nodes[0].url, "https://docs.rs");
        assert_eq!(stored_log(&app).await.len(), 1);
    }

    #[tokio::test]
    async fn undo_from_panel_refreshes_folder() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        assert_eq!(app.nodes.len(), 1);

        app.handle_action(Action::OpenHistory).await.unwrap();
        assert_eq!(app.mode, InputMode::History);
        assert_eq!(app.history_rows().len(), 1);
        assert!(app.history_rows()[0].can_undo);

        app.handle_action(Action::HistoryUndo).await.unwrap();
        assert!(app.nodes.is_empty());
        assert!(app.history_rows()[0].can_redo);

        app.handle_action(Action::CloseHistory).await.unwrap();
        assert_eq!(app.mode, InputMode::Normal);
        assert!(stored_log(&app).await.is_empty());
    }

    #[tokio::test]
    async fn filters_hide_rows_but_keep_log() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        app.handle_action(Action::Duplicate).await.unwrap();

        app.handle_action(Action::OpenHistory).await.unwrap();
        assert_eq!(app.history_rows().len(), 2);
        app.handle_action(Action::ToggleKind(crate::action::ActionKind::Duplicated))
            .await
            .unwrap();
        assert_eq!(app.history_rows().len(), 1);
        assert_eq!(app.history.as_ref().unwrap().log().len(), 2);
    }

    #[tokio::test]
    async fn cut_and_paste_moves_node() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        app.handle_action(Action::NewBookmark).await.unwrap();
        type_text(&mut app, "Docs").await;
        type_text(&mut app, "https://docs.rs").await;

        // nodes: [Work, Docs]
        app.handle_action(Action::MoveDown).await.unwrap();
        app.handle_action(Action::Cut).await.unwrap();
        app.handle_action(Action::MoveUp).await.unwrap();
        app.handle_action(Action::OpenFolder).await.unwrap();
        app.handle_action(Action::Paste).await.unwrap();

        assert_eq!(app.nodes.len(), 1);
        assert_eq!(app.nodes[0].title, "Docs");
        let log = stored_log(&app).await;
        assert_eq!(log.actions()[0].kind, crate::action::ActionKind::Moved);

        app.handle_action(Action::ParentFolder).await.unwrap();
        assert_eq!(app.current_folder, ROOT_ID);
        assert_eq!(app.nodes.len(), 1);
    }

    #[tokio::test]
    async fn undo_of_current_folder_falls_back_to_root() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        app.handle_action(Action::OpenFolder).await.unwrap();
        assert_ne!(app.current_folder, ROOT_ID);

        app.handle_action(Action::OpenHistory).await.unwrap();
        app.handle_action(Action::HistoryUndo).await.unwrap();
        assert_eq!(app.current_folder, ROOT_ID);
    }

    #[tokio::test]
    async fn failed_tree_save_still_records_action() {
        let mut app = app().await;
        app.profile.store().reject_key(crate::store::BOOKMARK_TREE_KEY);
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;

        assert_eq!(app.nodes.len(), 1);
        assert!(app.status_message.as_deref().unwrap().contains("could not be saved"));
        let log = stored_log(&app).await;
        assert_eq!(log.len(), 1);

        app.handle_action(Action::OpenHistory).await.unwrap();
        assert!(app.history_rows()[0].can_undo);
        app.handle_action(Action::HistoryUndo).await.unwrap();
        assert!(app.nodes.is_empty());
    }

    #[tokio::test]
    async fn forget_selected_drops_only_that_tile() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        app.handle_action(Action::Rename).await.unwrap();
        type_text(&mut app, "s").await; // appended to the prefilled title
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Home").await;
        assert_eq!(stored_log(&app).await.len(), 3);

        // selection still on Work
        app.handle_action(Action::ForgetHistory).await.unwrap();
        let log = stored_log(&app).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log.actions()[0].item.title, "Home");
        assert_eq!(app.nodes[0].title, "Works");
    }

    #[tokio::test]
    async fn panel_forget_removes_rows_of_item() {
        let mut app = app().await;
        app.handle_action(Action::NewFolder).await.unwrap();
        type_text(&mut app, "Work").await;
        app.handle_action(Action::Duplicate).await.unwrap();

        app.handle_action(Action::OpenHistory).await.unwrap();
        assert_eq!(app.history_rows().len(), 2);
        app.handle_action(Action::HistoryForget).await.unwrap();
        assert_eq!(app.history_rows().len(), 1);
        app.handle_action(Action::CloseHistory).await.unwrap();
        assert_eq!(stored_log(&app).await.len(), 1);
    }

    #[tokio::test]
    async fn share_then_import_creates_copy() {
        let mut app = app().await;
        app.handle_action(Action::NewBookmark).await.unwrap();
        type_text(&mut app, "Docs").await;
        type_text(&mut app, "https://docs.rs").await;

        app.handle_action(Action::Share).await.unwrap();
        app.handle_action(Action::ImportShared).await.unwrap();
        assert_eq!(app.nodes.len(), 2);
        assert_ne!(app.nodes[0].id, app.nodes[1].id);
        assert_eq!(app.nodes[1].url, "https://docs.rs");

        app.handle_action(Action::ImportShared).await.unwrap();
        assert_eq!(app.nodes.len(), 2);
    }
}
