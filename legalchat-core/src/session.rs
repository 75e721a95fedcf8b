//! Chat sessions.
//!
//! A session is an opaque identifier generated locally and threaded through
//! every request. It is never mutated: starting a new session builds a new
//! [`Session`] and the old identifier becomes the marker for stale completions.

use std::fmt;

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier (`session_<uuid>`).
    pub fn generate() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the uuid part, for status bars.
    pub fn short(&self) -> &str {
        let id = self.0.strip_prefix("session_").unwrap_or(&self.0);
        let end = id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(id.len());
        &id[..end]
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity pair sent with every chat frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
}

impl Session {
    /// Start a session for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::generate(),
            user_id: user_id.into(),
        }
    }

    /// A replacement session for the same user.
    pub fn renew(&self) -> Self {
        Self::new(self.user_id.clone())
    }
}

/// Generate a per-launch user id (`user_<uuid>`).
pub fn generate_user_id() -> String {
    format!("user_{}", uuid::Uuid::new_v4().simple())
}
