//! Core domain types for legalchat
//!
//! These types mirror what the assistant backend sends and receives, plus the
//! client-side transcript entry.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Agent** | A legal persona the backend can route a turn to, or the whole team |
//! | **Turn** | One user request and its (possibly multi-fragment) assistant reply |
//! | **Transcript** | The ordered list of [`ChatMessage`]s shown in the chat view |
//! | **Knowledge base** | The backend's document store and search index |
//!
//! Knowledge types are read-only snapshots of backend responses. The client
//! never edits them, it only replaces them on refresh.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

// ============================================
// Agents
// ============================================

/// Agent persona selectable in the sidebar.
///
/// Serialized as the `agent_type` field of outbound chat frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Route the turn to the whole team
    #[default]
    Team,
    Researcher,
    ContractAnalyzer,
    ComplianceAdvisor,
    DocumentDrafter,
    LegalAdvisor,
}

impl AgentType {
    /// All personas in sidebar order.
    pub const ALL: [AgentType; 6] = [
        AgentType::Team,
        AgentType::Researcher,
        AgentType::ContractAnalyzer,
        AgentType::ComplianceAdvisor,
        AgentType::DocumentDrafter,
        AgentType::LegalAdvisor,
    ];

    /// Wire name used in `agent_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Team => "team",
            AgentType::Researcher => "researcher",
            AgentType::ContractAnalyzer => "contract_analyzer",
            AgentType::ComplianceAdvisor => "compliance_advisor",
            AgentType::DocumentDrafter => "document_drafter",
            AgentType::LegalAdvisor => "legal_advisor",
        }
    }

    /// Name the backend reports in the `agent` field of content frames.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Team => "Legal Team",
            AgentType::Researcher => "LegalResearcher",
            AgentType::ContractAnalyzer => "ContractAnalyzer",
            AgentType::ComplianceAdvisor => "ComplianceAdvisor",
            AgentType::DocumentDrafter => "DocumentDrafter",
            AgentType::LegalAdvisor => "LegalAdvisor",
        }
    }

    /// One-line description for the sidebar.
    pub fn description(&self) -> &'static str {
        match self {
            AgentType::Team => "All specialists collaborating on one answer",
            AgentType::Researcher => "Case law, statutes and precedents",
            AgentType::ContractAnalyzer => "Clause review, risks and obligations",
            AgentType::ComplianceAdvisor => "Regulatory requirements and gaps",
            AgentType::DocumentDrafter => "Drafts letters, agreements and filings",
            AgentType::LegalAdvisor => "General guidance and next steps",
        }
    }

    /// Position in [`AgentType::ALL`].
    pub fn index(&self) -> usize {
        AgentType::ALL
            .iter()
            .position(|a| a == self)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AgentType::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown agent type: {}", s))
    }
}

// ============================================
// Transcript
// ============================================

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Locally generated identifier
    pub id: String,
    /// Message text. Grows in place while the message is streaming.
    pub content: String,
    /// True for assistant-authored messages
    pub is_bot: bool,
    /// Agent name reported by the backend (bot messages) or selected persona (user messages)
    pub agent: Option<String>,
    /// ISO-8601 timestamp, fixed at creation
    pub timestamp: String,
    /// True while more fragments may be appended
    #[serde(default)]
    pub is_streaming: bool,
    /// True for error entries
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    fn new(content: String, is_bot: bool, agent: Option<String>, timestamp: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            is_bot,
            agent,
            timestamp,
            is_streaming: false,
            is_error: false,
        }
    }

    /// A message typed by the user.
    pub fn user(content: impl Into<String>, agent: AgentType) -> Self {
        Self::new(
            content.into(),
            false,
            Some(agent.display_name().to_string()),
            now_iso(),
        )
    }

    /// First fragment of a streaming bot reply.
    pub fn streaming(
        content: impl Into<String>,
        agent: Option<String>,
        timestamp: Option<String>,
    ) -> Self {
        let mut msg = Self::new(
            content.into(),
            true,
            agent,
            timestamp.unwrap_or_else(now_iso),
        );
        msg.is_streaming = true;
        msg
    }

    /// A flagged error entry. The text is prefixed with `Error: `.
    pub fn error(message: impl AsRef<str>) -> Self {
        let mut msg = Self::new(
            format!("Error: {}", message.as_ref()),
            true,
            None,
            now_iso(),
        );
        msg.is_error = true;
        msg
    }

    /// A complete bot-side notice (e.g., knowledge action results).
    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(content.into(), true, Some("System".to_string()), now_iso())
    }
}

/// Current time as an ISO-8601 string.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ============================================
// Session history and memories
// ============================================

/// One stored turn returned by `GET /sessions/{id}/history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryEntry {
    /// True when the entry was written by the user.
    pub fn is_user(&self) -> bool {
        self.role.eq_ignore_ascii_case("user")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

/// A user memory. The backend sends either a bare string or `{memory: ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MemoryEntry {
    Text(String),
    Record { memory: String },
}

impl MemoryEntry {
    pub fn text(&self) -> &str {
        match self {
            MemoryEntry::Text(s) => s,
            MemoryEntry::Record { memory } => memory,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoriesResponse {
    #[serde(default)]
    pub memories: Vec<MemoryEntry>,
}

// ============================================
// Knowledge base
// ============================================

/// Document types accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Text,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [DocumentType::Pdf, DocumentType::Docx, DocumentType::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
            DocumentType::Text => "text",
        }
    }

    /// Lowercase file extensions (with dot) the backend accepts for this type.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentType::Pdf => &[".pdf"],
            DocumentType::Docx => &[".docx", ".doc"],
            DocumentType::Text => &[".txt", ".md"],
        }
    }

    /// Infer the document type from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = extension_of(path)?;
        DocumentType::ALL
            .into_iter()
            .find(|t| t.allowed_extensions().contains(&ext.as_str()))
    }

    /// Check that `path` has an extension allowed for this type.
    pub fn check_file(&self, path: &Path) -> Result<()> {
        let ext = extension_of(path).unwrap_or_default();
        if self.allowed_extensions().contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "file extension {} not allowed for type {}",
                if ext.is_empty() { "(none)" } else { ext.as_str() },
                self.as_str()
            )))
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(DocumentType::Pdf),
            "docx" => Ok(DocumentType::Docx),
            "text" => Ok(DocumentType::Text),
            _ => Err(format!("unknown document type: {}", s)),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Document metadata as listed by `GET /knowledge/documents`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnowledgeDocument {
    pub document_id: String,
    pub file_name: String,
    pub document_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub chunk_count: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub total_content_length: Option<i64>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsResponse {
    #[serde(default)]
    pub documents: Vec<KnowledgeDocument>,
}

/// Optional filters for document listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub category: Option<String>,
    pub document_type: Option<DocumentType>,
}

/// One hit from `GET /knowledge/search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub file_name: String,
    pub similarity_score: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub chunk_index: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchInfo {
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default)]
    pub vector_database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub search_info: SearchInfo,
}

/// Response of `POST /knowledge/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub chunks_created: i64,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Response of `DELETE /knowledge/documents/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    pub chunks_deleted: i64,
}

/// Response of `POST /knowledge/reindex`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReindexResponse {
    pub documents_processed: i64,
    pub chunks_created: i64,
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default)]
    pub services_updated: Vec<String>,
}

/// Response of `GET /knowledge/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeStats {
    #[serde(default)]
    pub total_documents: Option<i64>,
    #[serde(default)]
    pub total_chunks: Option<i64>,
    #[serde(default)]
    pub opensearch_docs: Option<i64>,
    #[serde(default)]
    pub opensearch_index: Option<String>,
    /// Service role → service name
    #[serde(default)]
    pub aws_services: BTreeMap<String, String>,
}

// ============================================
// Service status
// ============================================

/// Health of one backing service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ServiceStatus {
    Connected,
    Healthy,
    Error,
    Degraded,
    #[default]
    Unknown,
    Other(String),
}

impl From<String> for ServiceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "connected" => ServiceStatus::Connected,
            "healthy" => ServiceStatus::Healthy,
            "error" => ServiceStatus::Error,
            "degraded" => ServiceStatus::Degraded,
            _ => ServiceStatus::Other(s),
        }
    }
}

impl ServiceStatus {
    pub fn label(&self) -> &str {
        match self {
            ServiceStatus::Connected => "connected",
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Error => "error",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Other(s) => s,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceStatus::Connected | ServiceStatus::Healthy)
    }
}

/// Response of `GET /aws/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsStatus {
    #[serde(default)]
    pub bedrock: ServiceStatus,
    #[serde(default)]
    pub opensearch: ServiceStatus,
    #[serde(default)]
    pub documentdb: ServiceStatus,
    #[serde(default)]
    pub llm: Option<String>,
    #[serde(default)]
    pub opensearch_docs: Option<i64>,
    #[serde(default)]
    pub documentdb_collections: Vec<String>,
    #[serde(default)]
    pub embeddings: Option<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceStatus>,
}

/// Response of `GET /agents`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsResponse {
    /// Agent key → instructions
    #[serde(default)]
    pub agents: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub team_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_agent_type_round_trip_names() {
        for agent in AgentType::ALL {
            assert_eq!(agent.as_str().parse::<AgentType>().unwrap(), agent);
        }
        assert!("judge".parse::<AgentType>().is_err());
        assert_eq!(AgentType::default(), AgentType::Team);
        assert_eq!(AgentType::LegalAdvisor.index(), 5);
    }

    #[test]
    fn test_agent_type_serializes_snake_case() {
        let json = serde_json::to_string(&AgentType::ComplianceAdvisor).unwrap();
        assert_eq!(json, "\"compliance_advisor\"");
    }

    #[test]
    fn test_error_message_is_flagged_and_prefixed() {
        let msg = ChatMessage::error("boom");
        assert_eq!(msg.content, "Error: boom");
        assert!(msg.is_error);
        assert!(msg.is_bot);
        assert!(!msg.is_streaming);
    }

    #[test]
    fn test_streaming_message_keeps_given_timestamp() {
        let msg = ChatMessage::streaming(
            "Hi",
            Some("LegalAdvisor".to_string()),
            Some("2025-01-01T00:00:00".to_string()),
        );
        assert!(msg.is_streaming);
        assert_eq!(msg.timestamp, "2025-01-01T00:00:00");

        let msg = ChatMessage::streaming("Hi", None, None);
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("a", AgentType::Team);
        let b = ChatMessage::user("a", AgentType::Team);
        assert_ne!(a.id, b.id);
        assert_eq!(a.agent.as_deref(), Some("Legal Team"));
    }

    #[test]
    fn test_document_type_from_path() {
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("brief.PDF")),
            Some(DocumentType::Pdf)
        );
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("nda.doc")),
            Some(DocumentType::Docx)
        );
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("notes.md")),
            Some(DocumentType::Text)
        );
        assert_eq!(DocumentType::from_path(&PathBuf::from("image.png")), None);
        assert_eq!(DocumentType::from_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_document_type_check_file() {
        assert!(DocumentType::Text
            .check_file(&PathBuf::from("a.txt"))
            .is_ok());
        let err = DocumentType::Pdf
            .check_file(&PathBuf::from("a.txt"))
            .unwrap_err();
        assert!(err.to_string().contains(".txt"));
        assert!(DocumentType::Pdf.check_file(&PathBuf::from("a")).is_err());
    }

    #[test]
    fn test_memory_entry_variants() {
        let parsed: MemoriesResponse = serde_json::from_str(
            r#"{"memories": ["prefers short answers", {"memory": "based in Kuala Lumpur"}]}"#,
        )
        .unwrap();
        let texts: Vec<&str> = parsed.memories.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["prefers short answers", "based in Kuala Lumpur"]);
    }

    #[test]
    fn test_service_status_parsing() {
        let status: AwsStatus = serde_json::from_str(
            r#"{
                "bedrock": "connected",
                "opensearch": "error",
                "documentdb": "warming",
                "llm": "gpt-oss:120b",
                "opensearch_docs": 42,
                "documentdb_collections": ["agent_data"],
                "embeddings": "amazon.titan-embed-text-v2:0"
            }"#,
        )
        .unwrap();
        assert_eq!(status.bedrock, ServiceStatus::Connected);
        assert!(status.bedrock.is_ok());
        assert_eq!(status.opensearch, ServiceStatus::Error);
        assert_eq!(status.documentdb, ServiceStatus::Other("warming".to_string()));
        assert_eq!(status.documentdb.label(), "warming");
        assert_eq!(status.opensearch_docs, Some(42));
    }

    #[test]
    fn test_knowledge_document_optional_fields() {
        let doc: KnowledgeDocument = serde_json::from_str(
            r#"{
                "document_id": "d1",
                "file_name": "nda.pdf",
                "document_type": "pdf",
                "category": "contracts",
                "chunk_count": 3,
                "created_at": "2025-02-01T10:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(doc.chunk_count, 3);
        assert!(doc.total_content_length.is_none());
    }
}
