//! Chat controller.
//!
//! The controller owns the [`ChatState`] and is the only thing that mutates
//! it. User intents become requests spawned on the tokio runtime; their
//! results come back as [`AppEvent`]s over a channel and are applied when
//! the owner calls [`ChatController::pump`]. Every event carries the
//! [`SessionId`] it was issued under, and events for a replaced session are
//! dropped.

use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::client::{BackendClient, SearchQuery, UploadRequest};
use crate::config::{Config, KnowledgeConfig};
use crate::error::Result;
use crate::session::{generate_user_id, Session, SessionId};
use crate::state::{Action, ChatState, Completion};
use crate::stream::{ReconnectPolicy, StreamEvent, StreamHandle};
use crate::types::{AgentType, ChatMessage, DocumentFilter, DocumentType};

/// Something that happened off the owning thread.
#[derive(Debug)]
pub enum AppEvent {
    Stream {
        session: SessionId,
        event: StreamEvent,
    },
    Completed {
        session: SessionId,
        completion: Completion,
    },
}

impl AppEvent {
    pub fn session(&self) -> &SessionId {
        match self {
            AppEvent::Stream { session, .. } => session,
            AppEvent::Completed { session, .. } => session,
        }
    }
}

pub struct ChatController {
    state: ChatState,
    client: BackendClient,
    runtime: Handle,
    ws_base: String,
    policy: ReconnectPolicy,
    knowledge: KnowledgeConfig,
    stream: Option<StreamHandle>,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
}

impl ChatController {
    /// Build a controller. No connection is opened until
    /// [`start_session`](Self::start_session).
    pub fn new(config: &Config, runtime: Handle) -> Result<Self> {
        let client = BackendClient::new(&config.backend)?;
        let user_id = config
            .backend
            .user_id
            .clone()
            .unwrap_or_else(generate_user_id);
        let (events_tx, events_rx) = mpsc::channel();

        Ok(Self {
            state: ChatState::new(Session::new(user_id), config.chat.default_agent),
            client,
            runtime,
            ws_base: config.backend.ws_base(),
            policy: ReconnectPolicy::from(&config.reconnect),
            knowledge: config.knowledge.clone(),
            stream: None,
            events_tx,
            events_rx,
        })
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    // ========== Session lifecycle ==========

    /// Open the streaming channel for the current session.
    ///
    /// Any previous channel is closed first.
    pub fn start_session(&mut self) {
        self.stream = None;

        let session = self.state.session.id.clone();
        tracing::info!(session_id = %session, user_id = %self.state.session.user_id, "Starting session");

        let tx = self.events_tx.clone();
        let tagged = session.clone();
        self.stream = Some(StreamHandle::spawn(
            &self.runtime,
            &self.ws_base,
            session,
            self.policy.clone(),
            move |event| {
                let _ = tx.send(AppEvent::Stream {
                    session: tagged.clone(),
                    event,
                });
            },
        ));
    }

    /// Discard the current session and start a fresh one.
    pub fn new_session(&mut self) {
        self.stream = None;
        self.state.reset_session();
        self.start_session();
    }

    /// Skip any reconnect backoff.
    pub fn reconnect(&self) {
        if let Some(stream) = &self.stream {
            stream.reconnect();
        }
    }

    pub fn select_agent(&mut self, agent: AgentType) {
        self.state.select_agent(agent);
    }

    // ========== Chat ==========

    /// Send user input on the streaming channel.
    ///
    /// Returns false without side effects when the input is blank, the
    /// channel is not open, or a turn is already in flight.
    pub fn send_message(&mut self, input: &str) -> bool {
        let Some(frame) = self.state.prepare_send(input) else {
            return false;
        };

        let sent = match &self.stream {
            Some(stream) => stream.send(&frame),
            None => Err(crate::error::Error::Stream("no open channel".to_string())),
        };

        if let Err(e) = sent {
            tracing::warn!(error = %e, "Failed to send message");
            self.state.transcript.abort_turn();
            self.state
                .transcript
                .push(ChatMessage::error(format!("Failed to send message: {}", e)));
            return false;
        }
        true
    }

    // ========== Panels ==========

    /// Toggle the knowledge panel, refreshing its data when opened.
    pub fn toggle_knowledge(&mut self) {
        self.state.knowledge_open = !self.state.knowledge_open;
        if self.state.knowledge_open {
            self.refresh_documents();
            self.refresh_stats();
        }
    }

    /// Toggle the history overlay, loading history and memories when opened.
    pub fn toggle_history(&mut self) {
        self.state.history_open = !self.state.history_open;
        if self.state.history_open {
            self.load_history();
            self.load_memories();
        }
    }

    // ========== Requests ==========

    pub fn load_history(&mut self) -> bool {
        if !self.state.try_begin(Action::History) {
            return false;
        }
        let client = self.client.clone();
        let session_id = self.state.session.id.as_str().to_string();
        self.spawn_request(async move { Completion::History(client.session_history(&session_id).await) });
        true
    }

    pub fn load_memories(&mut self) -> bool {
        if !self.state.try_begin(Action::Memories) {
            return false;
        }
        let client = self.client.clone();
        let user_id = self.state.session.user_id.clone();
        self.spawn_request(async move { Completion::Memories(client.user_memories(&user_id).await) });
        true
    }

    /// Reload the document list with the current filter.
    ///
    /// Returns false when a listing is already running. That listing may
    /// predate the latest change, so another one is issued after it lands.
    pub fn refresh_documents(&mut self) -> bool {
        if !self.state.try_begin_or_defer(Action::Documents) {
            return false;
        }
        let client = self.client.clone();
        let filter = self.state.document_filter.clone();
        self.spawn_request(async move { Completion::Documents(client.list_documents(&filter).await) });
        true
    }

    /// Change the document list filter and reload the list.
    pub fn set_document_filter(&mut self, filter: DocumentFilter) -> bool {
        self.state.document_filter = filter;
        self.refresh_documents()
    }

    pub fn refresh_stats(&mut self) -> bool {
        if !self.state.try_begin_or_defer(Action::Stats) {
            return false;
        }
        let client = self.client.clone();
        self.spawn_request(async move { Completion::Stats(client.knowledge_stats().await) });
        true
    }

    /// Reload backend health and service status.
    pub fn refresh_status(&mut self) {
        if self.state.try_begin(Action::Status) {
            let client = self.client.clone();
            self.spawn_request(async move { Completion::Status(client.aws_status().await) });
        }
        if self.state.try_begin(Action::Health) {
            let client = self.client.clone();
            self.spawn_request(async move { Completion::Health(client.health().await) });
        }
    }

    /// Upload a local file into the knowledge base.
    ///
    /// The document type is inferred from the extension when not given, and
    /// the category falls back to the configured default. Files whose
    /// extension does not match the type are rejected before any request.
    pub fn upload_document(
        &mut self,
        path: PathBuf,
        document_type: Option<DocumentType>,
        category: Option<String>,
    ) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let Some(document_type) = document_type.or_else(|| DocumentType::from_path(&path)) else {
            self.state.transcript.push(ChatMessage::error(format!(
                "Upload of {} failed: unsupported file type (expected .pdf, .docx, .doc, .txt or .md)",
                file_name
            )));
            return false;
        };
        if let Err(e) = document_type.check_file(&path) {
            self.state
                .transcript
                .push(ChatMessage::error(format!("Upload of {} failed: {}", file_name, e)));
            return false;
        }

        if !self.state.try_begin(Action::Upload) {
            return false;
        }

        let category = category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.knowledge.default_category.clone());
        tracing::info!(file = %file_name, document_type = document_type.as_str(), category = %category, "Uploading document");

        let client = self.client.clone();
        self.spawn_request(async move {
            let request = UploadRequest {
                path: &path,
                document_type,
                category: &category,
            };
            let result = client.upload_document(&request).await;
            Completion::Upload { file_name, result }
        });
        true
    }

    pub fn delete_document(&mut self, document_id: &str) -> bool {
        if !self.state.try_begin(Action::Delete) {
            return false;
        }
        let file_name = self
            .state
            .documents
            .iter()
            .find(|d| d.document_id == document_id)
            .map(|d| d.file_name.clone())
            .unwrap_or_else(|| document_id.to_string());

        let client = self.client.clone();
        let document_id = document_id.to_string();
        self.spawn_request(async move {
            let result = client.delete_document(&document_id).await;
            Completion::Delete {
                document_id,
                file_name,
                result,
            }
        });
        true
    }

    /// Semantic search over the knowledge base. Blank queries are ignored.
    pub fn search(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || !self.state.try_begin(Action::Search) {
            return false;
        }

        let client = self.client.clone();
        let query = query.to_string();
        let limit = self.knowledge.search_limit;
        let similarity_threshold = self.knowledge.similarity_threshold;
        self.spawn_request(async move {
            let params = SearchQuery {
                query: &query,
                limit,
                similarity_threshold,
            };
            let result = client.search(&params).await;
            Completion::Search { query, result }
        });
        true
    }

    pub fn reindex(&mut self) -> bool {
        if !self.state.try_begin(Action::Reindex) {
            return false;
        }
        let client = self.client.clone();
        self.spawn_request(async move { Completion::Reindex(client.reindex().await) });
        true
    }

    // ========== Event delivery ==========

    /// Apply every event received so far. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for at least one event, then drain the rest.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => usize::from(self.handle_event(event)) + self.pump(),
            Err(_) => 0,
        }
    }

    fn handle_event(&mut self, event: AppEvent) -> bool {
        if event.session() != &self.state.session.id {
            tracing::debug!(session_id = %event.session(), "Dropping event for a replaced session");
            return false;
        }

        match event {
            AppEvent::Stream { event, .. } => {
                self.state.apply_stream(event);
            }
            AppEvent::Completed { completion, .. } => {
                let action = completion.action();
                let changed = self.state.apply_completion(completion);
                if self.state.take_deferred(action) {
                    match action {
                        Action::Documents => {
                            self.refresh_documents();
                        }
                        Action::Stats => {
                            self.refresh_stats();
                        }
                        _ => {}
                    }
                }
                if changed {
                    self.refresh_documents();
                    self.refresh_stats();
                }
            }
        }
        true
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let session = self.state.session.id.clone();
        self.runtime.spawn(async move {
            let completion = request.await;
            let _ = tx.send(AppEvent::Completed {
                session,
                completion,
            });
        });
    }
}
