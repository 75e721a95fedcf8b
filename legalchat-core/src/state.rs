//! Chat view state.
//!
//! [`ChatState`] is everything the view renders: session, transcript, agent
//! selection, panel toggles, cached knowledge data and per-action in-flight
//! flags. It performs no I/O. The controller feeds it stream events and
//! request completions; renderers only read it.

use crate::error::Result;
use crate::protocol::OutboundFrame;
use crate::session::Session;
use crate::stream::{ConnectionStatus, StreamEvent};
use crate::transcript::{Applied, Transcript};
use crate::types::{
    AgentType, AwsStatus, ChatMessage, DeleteResponse, DocumentFilter, HealthResponse,
    HistoryEntry, KnowledgeDocument, KnowledgeStats, MemoryEntry, ReindexResponse, SearchInfo, SearchResponse,
    SearchResult, UploadResponse,
};

/// A request/response action guarded by an in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    History,
    Memories,
    Documents,
    Stats,
    Upload,
    Delete,
    Search,
    Reindex,
    Status,
    Health,
}

/// Per-action "request in progress" flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InFlight {
    pub history: bool,
    pub memories: bool,
    pub documents: bool,
    pub stats: bool,
    pub upload: bool,
    pub delete: bool,
    pub search: bool,
    pub reindex: bool,
    pub status: bool,
    pub health: bool,
}

impl InFlight {
    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::History => &mut self.history,
            Action::Memories => &mut self.memories,
            Action::Documents => &mut self.documents,
            Action::Stats => &mut self.stats,
            Action::Upload => &mut self.upload,
            Action::Delete => &mut self.delete,
            Action::Search => &mut self.search,
            Action::Reindex => &mut self.reindex,
            Action::Status => &mut self.status,
            Action::Health => &mut self.health,
        }
    }

    pub fn is_set(&self, action: Action) -> bool {
        match action {
            Action::History => self.history,
            Action::Memories => self.memories,
            Action::Documents => self.documents,
            Action::Stats => self.stats,
            Action::Upload => self.upload,
            Action::Delete => self.delete,
            Action::Search => self.search,
            Action::Reindex => self.reindex,
            Action::Status => self.status,
            Action::Health => self.health,
        }
    }

    /// True if any request is outstanding.
    pub fn any(&self) -> bool {
        *self != InFlight::default()
    }
}

/// Result of one request/response call, delivered back to the view.
#[derive(Debug)]
pub enum Completion {
    History(Result<Vec<HistoryEntry>>),
    Memories(Result<Vec<MemoryEntry>>),
    Documents(Result<Vec<KnowledgeDocument>>),
    Stats(Result<KnowledgeStats>),
    Upload {
        file_name: String,
        result: Result<UploadResponse>,
    },
    Delete {
        document_id: String,
        file_name: String,
        result: Result<DeleteResponse>,
    },
    Search {
        query: String,
        result: Result<SearchResponse>,
    },
    Reindex(Result<ReindexResponse>),
    Status(Result<AwsStatus>),
    Health(Result<HealthResponse>),
}

impl Completion {
    pub fn action(&self) -> Action {
        match self {
            Completion::History(_) => Action::History,
            Completion::Memories(_) => Action::Memories,
            Completion::Documents(_) => Action::Documents,
            Completion::Stats(_) => Action::Stats,
            Completion::Upload { .. } => Action::Upload,
            Completion::Delete { .. } => Action::Delete,
            Completion::Search { .. } => Action::Search,
            Completion::Reindex(_) => Action::Reindex,
            Completion::Status(_) => Action::Status,
            Completion::Health(_) => Action::Health,
        }
    }
}

/// All state owned by the chat view.
#[derive(Debug)]
pub struct ChatState {
    pub session: Session,
    pub transcript: Transcript,
    pub selected_agent: AgentType,
    pub connection: ConnectionStatus,

    // ========== Panel toggles ==========
    pub knowledge_open: bool,
    pub history_open: bool,

    // ========== Cached backend data ==========
    pub documents: Vec<KnowledgeDocument>,
    pub document_filter: DocumentFilter,
    pub stats: Option<KnowledgeStats>,
    pub search_results: Vec<SearchResult>,
    pub search_info: Option<SearchInfo>,
    pub last_query: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub memories: Vec<MemoryEntry>,
    pub aws_status: Option<AwsStatus>,
    pub health: Option<HealthResponse>,

    pub in_flight: InFlight,
    /// Requests refused while an older one of the same kind was running.
    /// Each is reissued once that older request completes.
    pub deferred: InFlight,
}

impl ChatState {
    pub fn new(session: Session, agent: AgentType) -> Self {
        Self {
            session,
            transcript: Transcript::new(),
            selected_agent: agent,
            connection: ConnectionStatus::Disconnected,
            knowledge_open: false,
            history_open: false,
            documents: Vec::new(),
            document_filter: DocumentFilter::default(),
            stats: None,
            search_results: Vec::new(),
            search_info: None,
            last_query: None,
            history: Vec::new(),
            memories: Vec::new(),
            aws_status: None,
            health: None,
            in_flight: InFlight::default(),
            deferred: InFlight::default(),
        }
    }

    /// Turn user input into an outbound frame, appending the user message.
    ///
    /// Returns `None` and leaves the state untouched when the input is blank,
    /// the channel is not open, or a turn is already loading.
    pub fn prepare_send(&mut self, input: &str) -> Option<OutboundFrame> {
        let text = input.trim();
        if text.is_empty() || !self.connection.is_open() || self.transcript.is_loading() {
            return None;
        }

        self.transcript
            .begin_turn(ChatMessage::user(text, self.selected_agent));

        Some(OutboundFrame {
            message: text.to_string(),
            agent_type: self.selected_agent,
            session_id: self.session.id.as_str().to_string(),
            user_id: self.session.user_id.clone(),
        })
    }

    /// Replace the session, discarding everything tied to the old one.
    ///
    /// Cached knowledge documents and stats survive: they belong to the
    /// backend, not the session.
    pub fn reset_session(&mut self) {
        self.session = self.session.renew();
        self.transcript.clear();
        self.search_results.clear();
        self.search_info = None;
        self.last_query = None;
        self.history.clear();
        self.memories.clear();
        self.connection = ConnectionStatus::Disconnected;
        // Completions for the old session will be dropped, so nothing would clear these.
        self.in_flight = InFlight::default();
        self.deferred = InFlight::default();
    }

    pub fn select_agent(&mut self, agent: AgentType) {
        self.selected_agent = agent;
    }

    /// Mark `action` in flight. Returns false if it already was.
    pub fn try_begin(&mut self, action: Action) -> bool {
        let flag = self.in_flight.flag_mut(action);
        if *flag {
            false
        } else {
            *flag = true;
            true
        }
    }

    /// Like [`try_begin`](Self::try_begin), but a refused request is
    /// remembered so it can be reissued when the running one completes.
    ///
    /// Used for reloads whose running request may already be out of date.
    pub fn try_begin_or_defer(&mut self, action: Action) -> bool {
        if self.try_begin(action) {
            return true;
        }
        *self.deferred.flag_mut(action) = true;
        false
    }

    /// Clear and return the deferred flag for `action`.
    pub fn take_deferred(&mut self, action: Action) -> bool {
        std::mem::take(self.deferred.flag_mut(action))
    }

    /// Apply an event from the streaming channel.
    pub fn apply_stream(&mut self, event: StreamEvent) -> Option<Applied> {
        match event {
            StreamEvent::Status(status) => {
                self.connection = status;
                if !status.is_open() && self.transcript.is_loading() {
                    tracing::info!(status = %status.label(), "Channel lost mid-turn, ending turn");
                    self.transcript.abort_turn();
                }
                None
            }
            StreamEvent::Inbound(event) => Some(self.transcript.apply(event)),
        }
    }

    /// Apply a request completion.
    ///
    /// Returns true when the knowledge base changed and the cached document
    /// list and stats should be refreshed.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        *self.in_flight.flag_mut(completion.action()) = false;

        match completion {
            Completion::History(result) => match result {
                Ok(entries) => self.history = entries,
                Err(e) => tracing::warn!(error = %e, "Failed to load session history"),
            },
            Completion::Memories(result) => match result {
                Ok(memories) => self.memories = memories,
                Err(e) => tracing::warn!(error = %e, "Failed to load user memories"),
            },
            Completion::Stats(result) => match result {
                Ok(stats) => self.stats = Some(stats),
                Err(e) => tracing::warn!(error = %e, "Failed to load knowledge stats"),
            },
            Completion::Status(result) => match result {
                Ok(status) => self.aws_status = Some(status),
                Err(e) => tracing::warn!(error = %e, "Failed to load service status"),
            },
            Completion::Health(result) => match result {
                Ok(health) => self.health = Some(health),
                Err(e) => tracing::warn!(error = %e, "Failed to load backend health"),
            },
            Completion::Documents(result) => match result {
                Ok(documents) => self.documents = documents,
                Err(e) => self.report_failure("Failed to load documents", &e),
            },
            Completion::Upload { file_name, result } => match result {
                Ok(response) => {
                    self.transcript.push(ChatMessage::notice(format!(
                        "Uploaded {} ({} chunks created)",
                        response.file_name.as_deref().unwrap_or(&file_name),
                        response.chunks_created
                    )));
                    return true;
                }
                Err(e) => self.report_failure(&format!("Upload of {} failed", file_name), &e),
            },
            Completion::Delete {
                document_id,
                file_name,
                result,
            } => match result {
                Ok(response) => {
                    tracing::info!(document_id = %document_id, chunks = response.chunks_deleted, "Document deleted");
                    self.transcript.push(ChatMessage::notice(format!(
                        "Deleted {} ({} chunks removed)",
                        file_name, response.chunks_deleted
                    )));
                    return true;
                }
                Err(e) => self.report_failure(&format!("Delete of {} failed", file_name), &e),
            },
            Completion::Search { query, result } => match result {
                Ok(response) => {
                    self.search_results = response.results;
                    self.search_info = Some(response.search_info);
                    self.last_query = Some(query);
                }
                Err(e) => self.report_failure("Search failed", &e),
            },
            Completion::Reindex(result) => match result {
                Ok(response) => {
                    let services = if response.services_updated.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", response.services_updated.join(", "))
                    };
                    self.transcript.push(ChatMessage::notice(format!(
                        "Reindexed {} documents into {} chunks using {}{}",
                        response.documents_processed,
                        response.chunks_created,
                        response.embedding_model,
                        services
                    )));
                    return true;
                }
                Err(e) => self.report_failure("Reindex failed", &e),
            },
        }
        false
    }

    fn report_failure(&mut self, what: &str, error: &crate::error::Error) {
        tracing::warn!(error = %error, "{}", what);
        self.transcript
            .push(ChatMessage::error(format!("{}: {}", what, error)));
    }
}
