//! REST client tests against a mock backend.

use legalchat_core::client::{BackendClient, SearchQuery, UploadRequest};
use legalchat_core::config::BackendConfig;
use legalchat_core::{DocumentFilter, DocumentType, Error, ServiceStatus};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BackendClient {
    let config = BackendConfig {
        api_url: server.uri(),
        ..Default::default()
    };
    BackendClient::new(&config).unwrap()
}

// ============================================
// Session data
// ============================================

#[tokio::test]
async fn test_session_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/session_abc/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"role": "user", "content": "What is a tort?", "timestamp": "2025-01-01T10:00:00"},
                {"role": "assistant", "content": "A civil wrong."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = client_for(&server)
        .session_history("session_abc")
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert!(history[0].is_user());
    assert!(!history[1].is_user());
    assert_eq!(history[1].content, "A civil wrong.");
    assert!(history[1].timestamp.is_none());
}

#[tokio::test]
async fn test_user_memories_accepts_both_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user_1/memories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memories": ["Prefers Delaware law", {"memory": "Works on SaaS contracts"}]
        })))
        .mount(&server)
        .await;

    let memories = client_for(&server).user_memories("user_1").await.unwrap();

    let texts: Vec<&str> = memories.iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["Prefers Delaware law", "Works on SaaS contracts"]);
}

// ============================================
// Knowledge base
// ============================================

#[tokio::test]
async fn test_list_documents_with_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/knowledge/documents"))
        .and(query_param("category", "contracts"))
        .and(query_param("document_type", "pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "document_id": "doc-1",
                "file_name": "nda.pdf",
                "document_type": "pdf",
                "category": "contracts",
                "chunk_count": 12,
                "created_at": "2025-01-01T10:00:00",
                "total_content_length": 20480
            }],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = DocumentFilter {
        category: Some("contracts".to_string()),
        document_type: Some(DocumentType::Pdf),
    };
    let documents = client_for(&server).list_documents(&filter).await.unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].document_id, "doc-1");
    assert_eq!(documents[0].chunk_count, 12);
    assert_eq!(documents[0].total_content_length, Some(20480));
}

#[tokio::test]
async fn test_upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/knowledge/upload"))
        .and(body_string_contains("name=\"document_type\""))
        .and(body_string_contains("name=\"category\""))
        .and(body_string_contains("filename=\"brief.txt\""))
        .and(body_string_contains("The parties agree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Document uploaded successfully",
            "document_id": "doc-9",
            "file_name": "brief.txt",
            "chunks_created": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("brief.txt");
    let mut file = std::fs::File::create(&file_path).unwrap();
    writeln!(file, "The parties agree to the following terms.").unwrap();

    let response = client_for(&server)
        .upload_document(&UploadRequest {
            path: &file_path,
            document_type: DocumentType::Text,
            category: "briefs",
        })
        .await
        .unwrap();

    assert_eq!(response.document_id, "doc-9");
    assert_eq!(response.chunks_created, 3);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .upload_document(&UploadRequest {
            path: std::path::Path::new("contract.docx"),
            document_type: DocumentType::Pdf,
            category: "general",
        })
        .await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_delete_document() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge/documents/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Document deleted successfully",
            "chunks_deleted": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).delete_document("doc-1").await.unwrap();
    assert_eq!(response.chunks_deleted, 12);
}

#[tokio::test]
async fn test_delete_missing_document_reports_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge/documents/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Document not found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_document("nope")
        .await
        .unwrap_err();

    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Document not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/knowledge/search"))
        .and(query_param("query", "force majeure"))
        .and(query_param("limit", "5"))
        .and(query_param("similarity_threshold", "0.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "force majeure",
            "results": [{
                "file_name": "supply.pdf",
                "similarity_score": 0.91,
                "content": "Neither party shall be liable...",
                "document_type": "pdf",
                "category": "contracts",
                "chunk_index": 4
            }],
            "total_results": 1,
            "search_info": {
                "embedding_model": "amazon.titan-embed-text-v1",
                "vector_database": "opensearch"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search(&SearchQuery {
            query: "force majeure",
            limit: 5,
            similarity_threshold: 0.7,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].chunk_index, 4);
    assert_eq!(response.search_info.vector_database, "opensearch");
}

#[tokio::test]
async fn test_search_falls_back_to_post_on_405() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/knowledge/search"))
        .respond_with(ResponseTemplate::new(405).set_body_json(json!({
            "detail": "Method Not Allowed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/knowledge/search"))
        .and(query_param("query", "indemnity"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"file_name": "msa.pdf", "similarity_score": 0.82}],
            "search_info": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search(&SearchQuery {
            query: "indemnity",
            limit: 3,
            similarity_threshold: 0.5,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].file_name, "msa.pdf");
}

#[tokio::test]
async fn test_reindex_and_stats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/knowledge/reindex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Reindexed",
            "documents_processed": 4,
            "chunks_created": 40,
            "embedding_model": "titan",
            "services_updated": ["opensearch", "documentdb"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/knowledge/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_documents": 4,
            "total_chunks": 40,
            "opensearch_docs": 40,
            "opensearch_index": "legal-knowledge",
            "aws_services": {"embeddings": "Amazon Bedrock Titan"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reindex = client.reindex().await.unwrap();
    assert_eq!(reindex.documents_processed, 4);
    assert_eq!(reindex.services_updated.len(), 2);

    let stats = client.knowledge_stats().await.unwrap();
    assert_eq!(stats.total_chunks, Some(40));
    assert_eq!(
        stats.aws_services.get("embeddings").map(String::as_str),
        Some("Amazon Bedrock Titan")
    );
}

// ============================================
// Service status
// ============================================

#[tokio::test]
async fn test_health_and_aws_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2025-01-01T10:00:00",
            "services": {"bedrock": "connected", "opensearch": "error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/aws/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bedrock": "connected",
            "opensearch": "connected",
            "documentdb": "error",
            "llm": "Claude 3.5 Sonnet",
            "opensearch_docs": 120,
            "documentdb_collections": ["sessions", "memories"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let health = client.health().await.unwrap();
    assert!(health.status.is_ok());
    assert_eq!(health.services["opensearch"], ServiceStatus::Error);

    let aws = client.aws_status().await.unwrap();
    assert!(aws.bedrock.is_ok());
    assert_eq!(aws.documentdb, ServiceStatus::Error);
    assert_eq!(aws.opensearch_docs, Some(120));
    assert_eq!(aws.documentdb_collections, vec!["sessions", "memories"]);
}

#[tokio::test]
async fn test_agents_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agents": {"legal_researcher": "Researches case law"},
            "team_available": true
        })))
        .mount(&server)
        .await;

    let agents = client_for(&server).agents().await.unwrap();
    assert!(agents.team_available);
    assert!(agents.agents.contains_key("legal_researcher"));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let config = BackendConfig {
        api_url: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    };
    let err = BackendClient::new(&config)
        .unwrap()
        .health()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)), "unexpected error: {:?}", err);
}
