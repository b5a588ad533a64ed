//! Conversation history
//!
//! Append-only message log for one process run. Only the orchestrator
//! appends; everyone else reads.

use crate::core::{Message, Role};

/// Ordered, append-only message log
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append several messages, keeping their order
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages from `index` onward
    ///
    /// An index past the end yields an empty slice.
    pub fn messages_since(&self, index: usize) -> &[Message] {
        let start = index.min(self.messages.len());
        &self.messages[start..]
    }

    /// Text of the most recent assistant message that carries text
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.content.as_deref())
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolCall;

    #[test]
    fn test_conversation_basic() {
        let mut conv = Conversation::new();
        assert!(conv.is_empty());

        conv.push(Message::user("Hello"));
        conv.push(Message::assistant_text(Some("Hi there!".to_string())));

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last_assistant_text(), Some("Hi there!"));
    }

    #[test]
    fn test_messages_since() {
        let mut conv = Conversation::new();
        conv.push(Message::user("first"));
        conv.push(Message::assistant_text(Some("one".to_string())));
        conv.push(Message::user("second"));
        conv.extend(vec![
            Message::assistant_tool_calls(vec![ToolCall::new("t1", "search", "{}")]),
            Message::tool_result("t1", "{}"),
        ]);

        let since = conv.messages_since(2);
        assert_eq!(since.len(), 3);
        assert_eq!(since[0].text(), "second");
        assert_eq!(since[2].tool_call_id.as_deref(), Some("t1"));

        assert!(conv.messages_since(5).is_empty());
        assert!(conv.messages_since(99).is_empty());
    }

    #[test]
    fn test_last_assistant_text_skips_tool_call_messages() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant_text(Some("earlier".to_string())));
        conv.push(Message::assistant_tool_calls(vec![]));

        assert_eq!(conv.last_assistant_text(), Some("earlier"));
    }
}
