//! Streaming channel wire format.
//!
//! Outbound: one JSON text frame per user turn.
//!
//! ```json
//! {"message": "...", "agent_type": "team", "session_id": "...", "user_id": "..."}
//! ```
//!
//! Inbound: any number of `{"content": ...}` frames, then `{"done": true}`,
//! or an `{"error": ...}` frame at any point. Frames are not validated beyond
//! looking for those three keys.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::types::AgentType;

/// A chat turn sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    pub message: String,
    pub agent_type: AgentType,
    pub session_id: String,
    pub user_id: String,
}

impl OutboundFrame {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An inbound streaming event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A fragment of the assistant's reply
    Content {
        content: String,
        agent: Option<String>,
        timestamp: Option<String>,
    },
    /// The backend failed the turn
    Error(String),
    /// The turn is complete
    Done,
    /// None of the recognized keys were present
    Unrecognized,
}

impl InboundEvent {
    /// Parse a text frame.
    ///
    /// Only invalid JSON is an error. A well-formed frame without `error`,
    /// `done` or `content` becomes [`InboundEvent::Unrecognized`]. When several
    /// keys are present, `error` wins over `done`, which wins over `content`.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return InboundEvent::Unrecognized;
        };

        if let Some(err) = obj.get("error").filter(|v| !v.is_null()) {
            let message = match err {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return InboundEvent::Error(message);
        }

        if obj.get("done").and_then(Value::as_bool) == Some(true) {
            return InboundEvent::Done;
        }

        if let Some(content) = obj.get("content").and_then(Value::as_str) {
            return InboundEvent::Content {
                content: content.to_string(),
                agent: string_field(obj, "agent"),
                timestamp: string_field(obj, "timestamp"),
            };
        }

        InboundEvent::Unrecognized
    }
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_frame_shape() {
        let frame = OutboundFrame {
            message: "Review this NDA".to_string(),
            agent_type: AgentType::ContractAnalyzer,
            session_id: "session_1".to_string(),
            user_id: "user_1".to_string(),
        };
        let value: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "message": "Review this NDA",
                "agent_type": "contract_analyzer",
                "session_id": "session_1",
                "user_id": "user_1"
            })
        );
    }

    #[test]
    fn test_parse_content_frame() {
        let event = InboundEvent::parse(
            r#"{"content": "Hello", "agent": "LegalAdvisor", "timestamp": "2025-01-01T00:00:00", "aws_powered": true}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            InboundEvent::Content {
                content: "Hello".to_string(),
                agent: Some("LegalAdvisor".to_string()),
                timestamp: Some("2025-01-01T00:00:00".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_done_and_error() {
        assert_eq!(InboundEvent::parse(r#"{"done": true}"#).unwrap(), InboundEvent::Done);
        assert_eq!(
            InboundEvent::parse(r#"{"error": "boom"}"#).unwrap(),
            InboundEvent::Error("boom".to_string())
        );
        // Non-string error payloads are kept as JSON text
        assert_eq!(
            InboundEvent::parse(r#"{"error": {"code": 1}}"#).unwrap(),
            InboundEvent::Error(r#"{"code":1}"#.to_string())
        );
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(
            InboundEvent::parse(r#"{"content": "x", "error": "boom"}"#).unwrap(),
            InboundEvent::Error("boom".to_string())
        );
        assert_eq!(
            InboundEvent::parse(r#"{"content": "x", "done": true}"#).unwrap(),
            InboundEvent::Done
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(
            InboundEvent::parse(r#"{"status": "thinking"}"#).unwrap(),
            InboundEvent::Unrecognized
        );
        assert_eq!(
            InboundEvent::parse(r#"{"done": false}"#).unwrap(),
            InboundEvent::Unrecognized
        );
        assert_eq!(InboundEvent::parse("[1, 2]").unwrap(), InboundEvent::Unrecognized);
        assert!(InboundEvent::parse("not json").is_err());
    }
}
