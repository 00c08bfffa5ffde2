//! TUI application state and logic

use crate::cli::query_service;
use crate::export::export_journals;
use crate::query::{JournalDetail, JournalSummary, QueryService, SearchFilter, SearchOutcome};
use crate::storage::{Database, DatabaseStats};
use crate::workspace::Workspace;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::HashSet;
use std::path::PathBuf;

/// Current view in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Journal list
    Journals,
    /// One journal in full
    Detail,
    /// Help screen
    Help,
}

/// What the input line is being typed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Search,
    ExportPath,
}

/// Application state
pub struct AppState {
    /// Current view
    pub view: View,
    /// Selected row in the visible list
    pub selected: usize,
    /// Scroll offset of the detail view
    pub scroll_offset: usize,
    /// Input buffer for editing
    pub input_buffer: String,
    /// Active input line, if any
    pub input: Option<Input>,
    /// Keyword of the applied search
    pub search_query: String,
    /// Status message
    pub status_message: Option<String>,
    /// Confirmation dialog
    pub confirm_dialog: Option<ConfirmDialog>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Journals,
            selected: 0,
            scroll_offset: 0,
            input_buffer: String::new(),
            input: None,
            search_query: String::new(),
            status_message: None,
            confirm_dialog: None,
        }
    }
}

/// Confirmation dialog
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub on_confirm: Box<dyn FnOnce(&mut App) -> Result<()>>,
}

/// Main TUI application
pub struct App {
    /// Data directory and configuration
    pub workspace: Workspace,
    /// Database handle
    pub db: Database,
    /// Application state
    pub state: AppState,
    /// Every journal in the store
    pub journals: Vec<JournalSummary>,
    /// Indices into `journals` currently shown
    pub visible: Vec<usize>,
    /// Journal open in the detail view
    pub detail: Option<JournalDetail>,
    /// Database statistics
    pub stats: DatabaseStats,
}

impl App {
    /// Create a new app instance
    pub fn new(workspace: Workspace) -> Result<Self> {
        let db = crate::cli::open_database(&workspace)?;
        let stats = db.get_stats()?;

        let mut app = Self {
            workspace,
            db,
            state: AppState::default(),
            journals: Vec::new(),
            visible: Vec::new(),
            detail: None,
            stats,
        };
        app.reload()?;

        Ok(app)
    }

    /// Reload every journal and clear the search
    pub fn reload(&mut self) -> Result<()> {
        self.journals = QueryService::new(&self.db).list_all()?;
        self.visible = (0..self.journals.len()).collect();
        self.stats = self.db.get_stats()?;
        self.state.search_query.clear();
        self.state.selected = 0;
        Ok(())
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Handle confirmation dialog first
        if self.state.confirm_dialog.is_some() {
            return self.handle_confirm_key(key);
        }

        // Handle input mode
        if self.state.input.is_some() {
            return self.handle_input_key(key);
        }

        // Handle view-specific keys
        match self.state.view {
            View::Journals => self.handle_journals_key(key),
            View::Detail => self.handle_detail_key(key),
            View::Help => self.handle_help_key(key),
        }
    }

    /// Handle keys in the journal list
    fn handle_journals_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.selected = self.state.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.selected < self.visible.len().saturating_sub(1) {
                    self.state.selected += 1;
                }
            }
            KeyCode::PageUp => {
                self.state.selected = self.state.selected.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.state.selected =
                    (self.state.selected + 10).min(self.visible.len().saturating_sub(1));
            }
            KeyCode::Char('g') | KeyCode::Home => self.state.selected = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.state.selected = self.visible.len().saturating_sub(1);
            }
            KeyCode::Enter => self.open_selected()?,
            KeyCode::Char('/') => {
                self.state.input = Some(Input::Search);
                self.state.input_buffer = self.state.search_query.clone();
            }
            KeyCode::Esc => {
                if !self.state.search_query.is_empty() {
                    self.reload()?;
                }
            }
            KeyCode::Char('e') => {
                self.state.input = Some(Input::ExportPath);
                self.state.input_buffer = self
                    .workspace
                    .root()
                    .join("export.csv")
                    .display()
                    .to_string();
            }
            KeyCode::Char('u') => {
                let url = self.workspace.config().feed.url.clone();
                self.state.confirm_dialog = Some(ConfirmDialog {
                    title: "Update".to_string(),
                    message: format!("Download and import the feed from {}?", url),
                    on_confirm: Box::new(|app: &mut App| app.run_import()),
                });
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.state.view = View::Help;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Handle keys in detail view
    fn handle_detail_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.state.view = View::Journals;
                self.detail = None;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.scroll_offset = self.state.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.scroll_offset += 1;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Handle keys in help view
    fn handle_help_key(&mut self, _key: KeyEvent) -> Result<bool> {
        self.state.view = View::Journals;
        Ok(false)
    }

    /// Handle keys in input mode
    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.state.input = None;
                self.state.input_buffer.clear();
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.state.input_buffer);
                match self.state.input.take() {
                    Some(Input::Search) => self.apply_search(&text)?,
                    Some(Input::ExportPath) => self.export_visible(PathBuf::from(text.trim()))?,
                    None => {}
                }
            }
            KeyCode::Backspace => {
                self.state.input_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.state.input_buffer.push(c);
            }
            _ => {}
        }
        Ok(false)
    }

    /// Handle keys in confirmation dialog
    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(dialog) = self.state.confirm_dialog.take() {
                    (dialog.on_confirm)(self)?;
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.state.confirm_dialog = None;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Open the selected journal in the detail view
    fn open_selected(&mut self) -> Result<()> {
        if let Some(journal) = self.selected_journal() {
            let id = journal.id;
            self.detail = Some(QueryService::new(&self.db).detail(id)?);
            self.state.scroll_offset = 0;
            self.state.view = View::Detail;
        }
        Ok(())
    }

    /// Restrict the list to journals whose title matches `keyword`
    pub fn apply_search(&mut self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            self.reload()?;
            self.state.status_message = None;
            return Ok(());
        }

        let filter = SearchFilter::new().keyword(keyword);
        let outcome = query_service(&self.workspace, &self.db).search(&filter)?;
        match outcome {
            SearchOutcome::Matches(found) => {
                let ids: HashSet<i64> = found.iter().map(|j| j.id).collect();
                self.visible = self
                    .journals
                    .iter()
                    .enumerate()
                    .filter(|(_, j)| ids.contains(&j.id))
                    .map(|(i, _)| i)
                    .collect();
                self.state.search_query = keyword.to_string();
                self.state.selected = 0;
                self.state.status_message = Some(format!("{} journal(s) match", self.visible.len()));
            }
            SearchOutcome::TooMany { count, cap } => {
                self.state.status_message = Some(format!(
                    "{} journals match, more than the limit of {}. Refine the search.",
                    count, cap
                ));
            }
        }
        Ok(())
    }

    /// Export the visible journals
    pub fn export_visible(&mut self, path: PathBuf) -> Result<()> {
        if path.as_os_str().is_empty() {
            self.state.status_message = Some("Export cancelled: no file name".to_string());
            return Ok(());
        }

        let ids: Vec<i64> = self.visible_journals().map(|j| j.id).collect();
        self.state.status_message = Some(match export_journals(&QueryService::new(&self.db), &ids, &path) {
            Ok(written) => format!("Exported {} journal(s) to {}", written, path.display()),
            Err(e) => format!("Export failed: {}", e),
        });
        Ok(())
    }

    /// Download the feed and reconcile it
    fn run_import(&mut self) -> Result<()> {
        match self.workspace.import_feed(None, None, None) {
            Ok(report) => {
                self.reload()?;
                self.state.status_message = Some(format!(
                    "Import complete: {} records ({} new, {} updated)",
                    report.records, report.inserted, report.updated
                ));
            }
            Err(e) => {
                self.state.status_message = Some(format!("Import failed: {:#}", e));
            }
        }
        Ok(())
    }

    /// Journals currently shown, in list order
    pub fn visible_journals(&self) -> impl Iterator<Item = &JournalSummary> {
        self.visible.iter().filter_map(|i| self.journals.get(*i))
    }

    /// Get the currently selected journal
    pub fn selected_journal(&self) -> Option<&JournalSummary> {
        self.visible
            .get(self.state.selected)
            .and_then(|i| self.journals.get(*i))
    }
}
