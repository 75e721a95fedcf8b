//! Streaming transcript assembler.
//!
//! Merges the fragments of one assistant reply into a single bot message.
//!
//! A bot message is the stream target only while it is literally the last
//! entry of the transcript and still flagged `is_streaming`. As soon as any
//! other message is appended after it, later fragments start a new message.
//! Fragments are applied in arrival order; nothing is reordered.

use crate::protocol::InboundEvent;
use crate::types::ChatMessage;

/// Outcome of applying one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Fragment appended to the streaming tail
    Merged,
    /// Fragment opened a new bot message
    Started,
    /// Error entry appended, turn over
    Failed,
    /// Turn completed
    Finished,
    /// Event carried nothing we recognize
    Ignored,
}

/// Ordered chat transcript plus the per-turn loading flag.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True between sending a turn and its `done`/`error`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Append the user's message and mark the turn in flight.
    pub fn begin_turn(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.loading = true;
    }

    /// Append a complete message (notices, knowledge action errors).
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// End the in-flight turn without an inbound event (channel dropped).
    pub fn abort_turn(&mut self) {
        self.loading = false;
        self.close_tail();
    }

    /// Drop every message and any in-flight turn.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.loading = false;
    }

    /// The message fragments would currently be merged into, if any.
    pub fn stream_target(&self) -> Option<&ChatMessage> {
        self.messages
            .last()
            .filter(|m| m.is_bot && m.is_streaming)
    }

    /// Apply one inbound streaming event.
    pub fn apply(&mut self, event: InboundEvent) -> Applied {
        match event {
            InboundEvent::Error(message) => {
                tracing::warn!(error = %message, "Backend reported an error for this turn");
                self.close_tail();
                self.messages.push(ChatMessage::error(message));
                self.loading = false;
                Applied::Failed
            }
            InboundEvent::Done => {
                self.loading = false;
                self.close_tail();
                Applied::Finished
            }
            InboundEvent::Content {
                content,
                agent,
                timestamp,
            } => {
                if let Some(last) = self
                    .messages
                    .last_mut()
                    .filter(|m| m.is_bot && m.is_streaming)
                {
                    last.content.push_str(&content);
                    Applied::Merged
                } else {
                    self.messages
                        .push(ChatMessage::streaming(content, agent, timestamp));
                    Applied::Started
                }
            }
            InboundEvent::Unrecognized => {
                tracing::debug!("Ignoring inbound frame without content, error or done");
                Applied::Ignored
            }
        }
    }

    fn close_tail(&mut self) {
        if let Some(last) = self.messages.last_mut() {
            if last.is_bot {
                last.is_streaming = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentType;

    fn content(text: &str) -> InboundEvent {
        InboundEvent::Content {
            content: text.to_string(),
            agent: Some("LegalAdvisor".to_string()),
            timestamp: None,
        }
    }

    #[test]
    fn test_fragments_merge_into_one_message() {
        let mut transcript = Transcript::new();
        transcript.begin_turn(ChatMessage::user("Hi", AgentType::LegalAdvisor));

        assert_eq!(transcript.apply(content("Hello")), Applied::Started);
        assert_eq!(transcript.apply(content(" world")), Applied::Merged);
        assert_eq!(transcript.apply(InboundEvent::Done), Applied::Finished);

        assert_eq!(transcript.len(), 2);
        let reply = &transcript.messages()[1];
        assert!(reply.is_bot);
        assert_eq!(reply.content, "Hello world");
        assert!(!reply.is_streaming);
        assert!(!transcript.is_loading());
    }

    #[test]
    fn test_merge_keeps_identity_and_timestamp() {
        let mut transcript = Transcript::new();
        transcript.apply(InboundEvent::Content {
            content: "a".to_string(),
            agent: None,
            timestamp: Some("2025-01-01T00:00:00".to_string()),
        });
        let id = transcript.messages()[0].id.clone();

        transcript.apply(InboundEvent::Content {
            content: "b".to_string(),
            agent: None,
            timestamp: Some("2030-01-01T00:00:00".to_string()),
        });

        let msg = &transcript.messages()[0];
        assert_eq!(msg.id, id);
        assert_eq!(msg.timestamp, "2025-01-01T00:00:00");
        assert_eq!(msg.content, "ab");
    }

    #[test]
    fn test_error_after_fragment_appends_separate_message() {
        let mut transcript = Transcript::new();
        transcript.begin_turn(ChatMessage::user("Hi", AgentType::Team));

        transcript.apply(content("Part1"));
        assert_eq!(
            transcript.apply(InboundEvent::Error("boom".to_string())),
            Applied::Failed
        );

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[1].content, "Part1");
        assert!(!transcript.messages()[1].is_streaming);
        let err = &transcript.messages()[2];
        assert_eq!(err.content, "Error: boom");
        assert!(err.is_error);
        assert!(!transcript.is_loading());
    }

    #[test]
    fn test_content_after_error_is_never_merged_into_it() {
        let mut transcript = Transcript::new();
        transcript.apply(InboundEvent::Error("boom".to_string()));
        assert_eq!(transcript.apply(content("late")), Applied::Started);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content, "Error: boom");
        assert_eq!(transcript.messages()[1].content, "late");
    }

    #[test]
    fn test_stream_target_abandoned_after_user_message() {
        let mut transcript = Transcript::new();
        transcript.apply(content("first"));
        transcript.begin_turn(ChatMessage::user("interrupt", AgentType::Team));

        assert!(transcript.stream_target().is_none());
        assert_eq!(transcript.apply(content("second")), Applied::Started);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[0].content, "first");
        assert_eq!(transcript.messages()[2].content, "second");
    }

    #[test]
    fn test_done_closes_stream_target() {
        let mut transcript = Transcript::new();
        transcript.apply(content("one"));
        transcript.apply(InboundEvent::Done);

        assert!(transcript.stream_target().is_none());
        assert_eq!(transcript.apply(content("two")), Applied::Started);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_done_leaves_user_tail_untouched() {
        let mut transcript = Transcript::new();
        transcript.begin_turn(ChatMessage::user("Hi", AgentType::Team));
        transcript.apply(InboundEvent::Done);
        assert_eq!(transcript.len(), 1);
        assert!(!transcript.messages()[0].is_bot);
        assert!(!transcript.is_loading());
    }

    #[test]
    fn test_unrecognized_is_ignored() {
        let mut transcript = Transcript::new();
        transcript.begin_turn(ChatMessage::user("Hi", AgentType::Team));
        assert_eq!(
            transcript.apply(InboundEvent::Unrecognized),
            Applied::Ignored
        );
        assert_eq!(transcript.len(), 1);
        assert!(transcript.is_loading());
    }

    #[test]
    fn test_at_most_one_streaming_message_at_tail() {
        let mut transcript = Transcript::new();
        for turn in 0..3 {
            transcript.begin_turn(ChatMessage::user(format!("q{}", turn), AgentType::Team));
            transcript.apply(content("a"));
            transcript.apply(content("b"));
            transcript.apply(InboundEvent::Done);
        }
        // A turn cut short by an error
        transcript.begin_turn(ChatMessage::user("q3", AgentType::Team));
        transcript.apply(content("Part1"));
        transcript.apply(InboundEvent::Error("boom".to_string()));

        transcript.begin_turn(ChatMessage::user("q4", AgentType::Team));
        transcript.apply(content("open"));

        let streaming: Vec<usize> = transcript
            .messages()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_streaming)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(streaming, vec![transcript.len() - 1]);
    }

    #[test]
    fn test_clear_and_abort() {
        let mut transcript = Transcript::new();
        transcript.begin_turn(ChatMessage::user("Hi", AgentType::Team));
        transcript.apply(content("partial"));
        transcript.abort_turn();
        assert!(!transcript.is_loading());
        assert!(transcript.stream_target().is_none());

        transcript.clear();
        assert!(transcript.is_empty());
    }
}
