use super::*;
use legalchat_core::{DocumentFilter, DocumentType};

impl App {
    // ========== Knowledge Panel Methods ==========

    /// Handle keyboard input in the knowledge panel.
    pub(super) fn handle_knowledge_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::Composer;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next_document();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous_document();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.controller.state().documents.is_empty() {
                    self.document_table_state.select(Some(0));
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                let len = self.controller.state().documents.len();
                if len > 0 {
                    self.document_table_state.select(Some(len - 1));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                self.delete_selected_document();
            }
            KeyCode::Char('u') => {
                self.open_prompt(Prompt::Upload);
            }
            KeyCode::Char('/') => {
                self.open_prompt(Prompt::Search);
            }
            KeyCode::Char('f') => {
                self.cycle_type_filter();
            }
            KeyCode::Char('r') => {
                self.controller.reconnect();
            }
            _ => {}
        }
    }

    /// The document under the table cursor, if any.
    pub fn selected_document_id(&self) -> Option<&str> {
        let idx = self.document_table_state.selected()?;
        self.controller
            .state()
            .documents
            .get(idx)
            .map(|d| d.document_id.as_str())
    }

    fn delete_selected_document(&mut self) {
        let Some(document_id) = self.selected_document_id().map(str::to_string) else {
            return;
        };
        if self.controller.delete_document(&document_id) {
            self.follow_transcript = true;
        }
    }

    /// Cycle the document type filter: all, pdf, docx, text.
    fn cycle_type_filter(&mut self) {
        let current = self.controller.state().document_filter.clone();
        let next_type = match current.document_type {
            None => Some(DocumentType::Pdf),
            Some(DocumentType::Pdf) => Some(DocumentType::Docx),
            Some(DocumentType::Docx) => Some(DocumentType::Text),
            Some(DocumentType::Text) => None,
        };
        self.document_table_state.select(None);
        self.controller.set_document_filter(DocumentFilter {
            document_type: next_type,
            ..current
        });
    }

    fn select_next_document(&mut self) {
        let len = self.controller.state().documents.len();
        if len == 0 {
            return;
        }
        let i = match self.document_table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.document_table_state.select(Some(i));
    }

    fn select_previous_document(&mut self) {
        let len = self.controller.state().documents.len();
        if len == 0 {
            return;
        }
        let i = match self.document_table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.document_table_state.select(Some(i));
    }
}
