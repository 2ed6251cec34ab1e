//! Conversation turn types.

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};

/// Who authored a message shown in the chat window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the remote assistant.
    Assistant,
    /// Locally generated message (greeting, notices).
    System,
}

impl MessageRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        }
    }
}

/// One question and what came back for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// The user's question.
    pub question: String,
    /// The resolved answer, or why there is none.
    pub outcome: Result<String, ResolveError>,
    /// Timestamp when the turn completed (RFC 3339).
    pub timestamp: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, outcome: Result<String, ResolveError>) -> Self {
        Self {
            question: question.into(),
            outcome,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Text the chat window shows for this turn.
    ///
    /// Errors render to their bracketed form; a successful empty answer stays
    /// empty.
    pub fn display_text(&self) -> String {
        match &self.outcome {
            Ok(answer) => answer.clone(),
            Err(err) => err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// `true` when the service answered successfully with no text.
    pub fn is_empty_answer(&self) -> bool {
        matches!(&self.outcome, Ok(answer) if answer.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_for_answer() {
        let turn = ConversationTurn::new("hi", Ok("hello".to_string()));
        assert_eq!(turn.display_text(), "hello");
        assert!(!turn.is_error());
        assert!(!turn.timestamp.is_empty());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let before = chrono::Utc::now();
        let turn = ConversationTurn::new("hi", Ok("hello".to_string()));
        let stamped = chrono::DateTime::parse_from_rfc3339(&turn.timestamp).unwrap();
        assert!(stamped.with_timezone(&chrono::Utc) >= before);
    }

    #[test]
    fn test_empty_answer_is_not_an_error() {
        let turn = ConversationTurn::new("hi", Ok(String::new()));
        assert!(turn.is_empty_answer());
        assert!(!turn.is_error());
        assert_eq!(turn.display_text(), "");
    }

    #[test]
    fn test_error_renders_bracketed() {
        let turn = ConversationTurn::new("hi", Err(ResolveError::processing("bad body")));
        assert!(turn.is_error());
        assert!(!turn.is_empty_answer());
        assert_eq!(turn.display_text(), "[PROCESSING ERROR]: bad body");
    }
}
