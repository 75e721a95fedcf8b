//! Application state for the TUI.

mod knowledge;

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use legalchat_core::{AgentType, ChatController};
use ratatui::widgets::{ListState, TableState};

/// Which region receives keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    Agents,
    Transcript,
    #[default]
    Composer,
    Knowledge,
}

/// Single-line prompt shown in place of the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Path of a file to upload
    Upload,
    /// Knowledge base search query
    Search,
}

impl Prompt {
    pub fn label(&self) -> &'static str {
        match self {
            Prompt::Upload => "Upload file",
            Prompt::Search => "Search",
        }
    }
}

/// Main application state.
pub struct App {
    pub controller: ChatController,
    pub focus: Focus,
    /// Composer contents
    pub input: String,
    pub prompt: Option<Prompt>,
    pub prompt_input: String,
    /// Cursor in the agent sidebar
    pub agent_list_state: ListState,
    /// Scroll offset for the transcript (clamped during rendering)
    pub transcript_scroll: usize,
    /// Keep the transcript pinned to the newest message
    pub follow_transcript: bool,
    pub document_table_state: TableState,
    pub history_scroll: usize,
    /// Frame counter for the spinner
    pub tick: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        let mut agent_list_state = ListState::default();
        agent_list_state.select(Some(controller.state().selected_agent.index()));

        Self {
            controller,
            focus: Focus::Composer,
            input: String::new(),
            prompt: None,
            prompt_input: String::new(),
            agent_list_state,
            transcript_scroll: 0,
            follow_transcript: true,
            document_table_state: TableState::default(),
            history_scroll: 0,
            tick: 0,
            should_quit: false,
        }
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// True while anything is waiting on the backend.
    pub fn is_busy(&self) -> bool {
        let state = self.controller.state();
        state.transcript.is_loading() || state.in_flight.any()
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            self.handle_control_key(key);
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        if self.controller.state().history_open {
            self.handle_history_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(true);
                return;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Composer => self.handle_composer_key(key),
            Focus::Agents => self.handle_agents_key(key),
            Focus::Transcript => self.handle_transcript_key(key),
            Focus::Knowledge => self.handle_knowledge_key(key),
        }
    }

    /// Global Ctrl shortcuts, active in every region.
    fn handle_control_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') => {
                self.should_quit = true;
            }
            KeyCode::Char('k') => {
                self.toggle_knowledge();
            }
            KeyCode::Char('h') => {
                self.history_scroll = 0;
                self.controller.toggle_history();
            }
            KeyCode::Char('n') => {
                self.new_session();
            }
            KeyCode::Char('r') => {
                self.controller.reindex();
            }
            KeyCode::Char('s') => {
                self.controller.refresh_status();
                self.controller.refresh_stats();
            }
            _ => {}
        }
    }

    /// Cycle focus through the visible regions.
    fn cycle_focus(&mut self, forward: bool) {
        let mut order = vec![Focus::Agents, Focus::Transcript, Focus::Composer];
        if self.controller.state().knowledge_open {
            order.push(Focus::Knowledge);
        }
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    fn toggle_knowledge(&mut self) {
        self.controller.toggle_knowledge();
        if self.controller.state().knowledge_open {
            self.focus = Focus::Knowledge;
            self.document_table_state.select(None);
        } else if self.focus == Focus::Knowledge {
            self.focus = Focus::Composer;
        }
    }

    fn new_session(&mut self) {
        self.controller.new_session();
        self.transcript_scroll = 0;
        self.follow_transcript = true;
        self.history_scroll = 0;
        self.prompt = None;
        self.prompt_input.clear();
    }

    // ========== Composer ==========

    fn handle_composer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Enter => {
                self.submit_message();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    /// Send the composer contents. The input is kept when nothing was sent.
    fn submit_message(&mut self) {
        if self.controller.send_message(&self.input) {
            self.input.clear();
            self.follow_transcript = true;
        }
    }

    // ========== Agent sidebar ==========

    fn handle_agents_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::Composer;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next_agent();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous_agent();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(agent) = self
                    .agent_list_state
                    .selected()
                    .and_then(|i| AgentType::ALL.get(i))
                {
                    self.controller.select_agent(*agent);
                    self.focus = Focus::Composer;
                }
            }
            KeyCode::Char('r') => {
                self.controller.reconnect();
            }
            _ => {}
        }
    }

    /// Select the next agent in the sidebar.
    fn select_next_agent(&mut self) {
        let i = match self.agent_list_state.selected() {
            Some(i) if i + 1 < AgentType::ALL.len() => i + 1,
            _ => 0,
        };
        self.agent_list_state.select(Some(i));
    }

    /// Select the previous agent in the sidebar.
    fn select_previous_agent(&mut self) {
        let i = match self.agent_list_state.selected() {
            Some(0) | None => AgentType::ALL.len() - 1,
            Some(i) => i - 1,
        };
        self.agent_list_state.select(Some(i));
    }

    // ========== Transcript ==========

    fn handle_transcript_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::Composer;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_transcript_down(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_transcript_up(1);
            }
            KeyCode::PageDown | KeyCode::Char('d') | KeyCode::Char(' ') => {
                self.scroll_transcript_down(10);
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.scroll_transcript_up(10);
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.transcript_scroll = 0;
                self.follow_transcript = false;
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.follow_transcript = true;
            }
            KeyCode::Char('r') => {
                self.controller.reconnect();
            }
            _ => {}
        }
    }

    fn scroll_transcript_down(&mut self, lines: usize) {
        // Clamped during rendering, which also re-enables follow at the bottom
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines);
    }

    fn scroll_transcript_up(&mut self, lines: usize) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
        self.follow_transcript = false;
    }

    // ========== History overlay ==========

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.controller.toggle_history();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.history_scroll = self.history_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.history_scroll = 0;
            }
            _ => {}
        }
    }

    // ========== Prompts ==========

    fn open_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(prompt);
        self.prompt_input.clear();
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.prompt_input.clear();
            }
            KeyCode::Enter => {
                self.submit_prompt();
            }
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(c) => {
                self.prompt_input.push(c);
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let value = std::mem::take(&mut self.prompt_input);
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        match prompt {
            Prompt::Upload => {
                let home = std::env::var_os("HOME").map(PathBuf::from);
                self.controller
                    .upload_document(expand_home(value, home.as_deref()), None, None);
                self.follow_transcript = true;
            }
            Prompt::Search => {
                self.controller.search(value);
            }
        }
    }
}

/// Expand a leading `~/` to `home`, if known.
fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
