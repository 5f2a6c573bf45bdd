mod query_editor;

use crate::domain::{QueryConfig, ResumeRequest, SessionSummary};
use crate::infra::SessionIndex;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use thiserror::Error;

pub use query_editor::QueryEditor;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Focus {
    Search,
    List,
}

#[derive(Clone, Debug)]
pub struct CwdPrompt {
    pub editor: QueryEditor,
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub index: Arc<SessionIndex>,
    pub search: QueryEditor,
    pub config: QueryConfig,
    pub filtered_indices: Vec<usize>,
    pub selected: usize,
    pub focus: Focus,
    pub cwd_prompt: Option<CwdPrompt>,
    pub last_cwd_filter: Option<String>,
    pub launch_dir: Option<String>,
    pub notice: Option<String>,
    pub help_open: bool,
    pub terminal_size: (u16, u16),
}

impl AppModel {
    pub fn new(index: Arc<SessionIndex>, initial_query: &str, config: QueryConfig) -> Self {
        let last_cwd_filter = config.active_cwd_filter().map(str::to_string);
        let mut model = Self {
            index,
            search: QueryEditor::from_text(initial_query),
            config,
            filtered_indices: Vec::new(),
            selected: 0,
            focus: Focus::Search,
            cwd_prompt: None,
            last_cwd_filter,
            launch_dir: None,
            notice: None,
            help_open: false,
            terminal_size: (0, 0),
        };
        model.apply_query();
        model
    }

    pub fn with_launch_dir(mut self, launch_dir: Option<String>) -> Self {
        self.launch_dir = launch_dir;
        self
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    /// Swaps in a rebuilt index, keeping the cursor on the same log file when it survived.
    pub fn with_index(mut self, index: Arc<SessionIndex>) -> Self {
        let selected_path = self
            .selected_session()
            .map(|session| session.source_path.clone());
        self.index = index;
        self.apply_query();
        if let Some(path) = selected_path {
            if let Some(position) = self.filtered_indices.iter().position(|index| {
                self.index
                    .sessions()
                    .get(*index)
                    .is_some_and(|session| session.source_path == path)
            }) {
                self.selected = position;
            }
        }
        self
    }

    pub fn visible_sessions(&self) -> impl Iterator<Item = &SessionSummary> {
        let sessions = self.index.sessions();
        self.filtered_indices
            .iter()
            .filter_map(move |index| sessions.get(*index))
    }

    pub fn selected_session(&self) -> Option<&SessionSummary> {
        self.filtered_indices
            .get(self.selected)
            .and_then(|index| self.index.sessions().get(*index))
    }

    pub fn status_text(&self) -> String {
        let direction = if self.config.sort_ascending { "↑" } else { "↓" };
        let base = format!(
            "Sort: {} {direction} · CWD: {} · Match: {} · Sessions: {}/{}",
            self.config.sort_key.label(),
            self.config.active_cwd_filter().unwrap_or("any"),
            self.config.match_mode.label(),
            self.filtered_indices.len(),
            self.index.len(),
        );
        match self.notice.as_deref().filter(|notice| !notice.is_empty()) {
            Some(notice) => format!("{base} · {notice}"),
            None => base,
        }
    }

    fn apply_query(&mut self) {
        self.filtered_indices = self
            .index
            .filtered_positions(self.search.text(), &self.config);
        self.selected = self
            .selected
            .min(self.filtered_indices.len().saturating_sub(1));
    }

    fn set_cwd_filter(&mut self, filter: Option<String>) {
        if let Some(value) = &filter {
            self.last_cwd_filter = Some(value.clone());
        }
        self.config.working_directory_filter = filter;
        self.selected = 0;
        self.apply_query();
    }

    fn toggle_cwd_filter(&mut self) {
        if let Some(current) = self.config.active_cwd_filter().map(str::to_string) {
            self.last_cwd_filter = Some(current);
            self.config.working_directory_filter = None;
            self.notice = Some("CWD filter: global".to_string());
        } else {
            let Some(next) = self.last_cwd_filter.clone().or(self.launch_dir.clone()) else {
                self.notice = Some("No CWD to filter by".to_string());
                return;
            };
            self.notice = Some(format!("CWD filter: {next}"));
            self.config.working_directory_filter = Some(next.clone());
            self.last_cwd_filter = Some(next);
        }
        self.selected = 0;
        self.apply_query();
    }

    fn cycle_sort(&mut self) {
        self.config.sort_key = self.config.sort_key.next();
        self.config.sort_ascending = false;
        self.apply_query();
    }

    fn flip_sort_direction(&mut self) {
        self.config.sort_ascending = !self.config.sort_ascending;
        self.apply_query();
    }

    fn toggle_match_mode(&mut self) {
        self.config.match_mode = self.config.match_mode.toggle();
        self.apply_query();
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.filtered_indices.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected.saturating_add_signed(delta);
        self.selected = next.min(len - 1);
    }

    fn page_step(&self) -> isize {
        // Three rows per list item, minus header, borders and footer.
        let rows = self.terminal_size.1.saturating_sub(8) as isize / 3;
        rows.max(1)
    }

    fn resume_command(&self) -> AppCommand {
        match self.selected_session() {
            Some(session) => AppCommand::Resume(ResumeRequest::for_session(session)),
            None => AppCommand::None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Refresh,
    Resume(ResumeRequest),
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
        AppEvent::Resize(width, height) => (model.with_terminal_size(width, height), AppCommand::None),
    }
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    if let Some(prompt) = model.cwd_prompt.as_mut() {
        prompt.editor.insert_str(&text);
        return (model, AppCommand::None);
    }
    model.search.insert_str(&text);
    model.focus = Focus::Search;
    model.apply_query();
    (model, AppCommand::None)
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return (model, AppCommand::Quit);
    }

    if model.cwd_prompt.is_some() {
        return update_cwd_prompt(model, key);
    }

    if model.help_open {
        model.help_open = false;
        return (model, AppCommand::None);
    }

    if ctrl {
        return update_on_ctrl_key(model, key);
    }

    match key.code {
        KeyCode::Enter => {
            model.notice = None;
            let command = model.resume_command();
            (model, command)
        }
        KeyCode::F(1) => {
            model.help_open = true;
            (model, AppCommand::None)
        }
        KeyCode::Up => {
            model.move_selection(-1);
            (model, AppCommand::None)
        }
        KeyCode::PageUp => {
            let step = model.page_step();
            model.move_selection(-step);
            (model, AppCommand::None)
        }
        KeyCode::PageDown => {
            let step = model.page_step();
            model.move_selection(step);
            (model, AppCommand::None)
        }
        _ => match model.focus {
            Focus::Search => update_search(model, key),
            Focus::List => update_list(model, key),
        },
    }
}

fn update_on_ctrl_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('r') => return (model, AppCommand::Refresh),
        KeyCode::Char('s') => model.cycle_sort(),
        KeyCode::Char('o') => model.flip_sort_direction(),
        KeyCode::Char('a') => model.toggle_match_mode(),
        KeyCode::Char('g') => model.toggle_cwd_filter(),
        KeyCode::Char('f') => open_cwd_prompt(&mut model),
        KeyCode::Char('u') => {
            if model.search.clear() {
                model.apply_query();
            }
        }
        KeyCode::Char('w') => {
            if model.search.delete_word_back() {
                model.apply_query();
            }
        }
        _ => {}
    }
    (model, AppCommand::None)
}

fn open_cwd_prompt(model: &mut AppModel) {
    let current = model.config.active_cwd_filter().unwrap_or("");
    model.cwd_prompt = Some(CwdPrompt {
        editor: QueryEditor::from_text(current),
    });
}

fn update_cwd_prompt(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let Some(mut prompt) = model.cwd_prompt.take() else {
        return (model, AppCommand::None);
    };

    match key.code {
        KeyCode::Esc => return (model, AppCommand::None),
        KeyCode::Enter => {
            let value = prompt.editor.text().trim();
            let filter = (!value.is_empty()).then(|| value.to_string());
            model.set_cwd_filter(filter);
            return (model, AppCommand::None);
        }
        KeyCode::Backspace => {
            prompt.editor.backspace();
        }
        KeyCode::Delete => {
            prompt.editor.delete_forward();
        }
        KeyCode::Left => prompt.editor.move_left(),
        KeyCode::Right => prompt.editor.move_right(),
        KeyCode::Home => prompt.editor.move_home(),
        KeyCode::End => prompt.editor.move_end(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.editor.insert_char(ch);
        }
        _ => {}
    }

    model.cwd_prompt = Some(prompt);
    (model, AppCommand::None)
}

fn update_search(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let changed = match key.code {
        KeyCode::Char(ch) => {
            model.search.insert_char(ch);
            true
        }
        KeyCode::Backspace => model.search.backspace(),
        KeyCode::Delete => model.search.delete_forward(),
        KeyCode::Esc => model.search.clear(),
        KeyCode::Left => {
            model.search.move_left();
            false
        }
        KeyCode::Right => {
            model.search.move_right();
            false
        }
        KeyCode::Home => {
            model.search.move_home();
            false
        }
        KeyCode::End => {
            model.search.move_end();
            false
        }
        KeyCode::Tab | KeyCode::Down => {
            model.focus = Focus::List;
            false
        }
        _ => false,
    };

    if changed {
        model.notice = None;
        model.selected = 0;
        model.apply_query();
    }
    (model, AppCommand::None)
}

fn update_list(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('q') => return (model, AppCommand::Quit),
        KeyCode::Char('r') => return (model, AppCommand::Refresh),
        KeyCode::Char('/') | KeyCode::Esc | KeyCode::Tab => model.focus = Focus::Search,
        KeyCode::Char('f') | KeyCode::Char('c') => open_cwd_prompt(&mut model),
        KeyCode::Char('g') => model.toggle_cwd_filter(),
        KeyCode::Char('s') => model.cycle_sort(),
        KeyCode::Char('o') => model.flip_sort_direction(),
        KeyCode::Char('a') => model.toggle_match_mode(),
        KeyCode::Char('?') => model.help_open = true,
        KeyCode::Down => model.move_selection(1),
        KeyCode::Home => model.selected = 0,
        KeyCode::End => model.selected = model.filtered_indices.len().saturating_sub(1),
        KeyCode::Char(_) | KeyCode::Backspace => {
            model.focus = Focus::Search;
            return update_search(model, key);
        }
        _ => {}
    }
    (model, AppCommand::None)
}
