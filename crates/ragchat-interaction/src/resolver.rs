//! The seam between the chat loop and a remote conversational service.

use async_trait::async_trait;
use ragchat_core::ResolveError;

/// A remote service that turns a question into an answer.
///
/// One call is one HTTP round trip. Implementations never panic on remote
/// failures; every failure is reported as a [`ResolveError`].
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short human-readable description of the backend.
    fn expertise(&self) -> &str;

    /// Sends `question` and returns the extracted answer.
    async fn resolve(&self, question: &str) -> Result<String, ResolveError>;

    /// Session id the next request will carry, for backends that have one.
    async fn session_id(&self) -> Option<String> {
        None
    }

    /// Drops the current session so the next turn starts a new conversation.
    async fn reset_session(&self) {}
}
