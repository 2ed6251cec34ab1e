pub mod envelope;
pub mod gemini_api_agent;
mod http;
pub mod rag_chat_api_agent;
pub mod ragflow_api_agent;
pub mod resolver;

use std::sync::Arc;
use tokio::sync::Mutex;

use ragchat_core::{Backend, ChatConfig, ConversationTurn, MessageRole, Prefixes, streamify};

pub use gemini_api_agent::GeminiApiAgent;
pub use rag_chat_api_agent::RagChatApiAgent;
pub use ragflow_api_agent::RagflowApiAgent;
pub use resolver::Resolver;

/// Builds the resolver for the configured backend.
pub fn build_resolver(config: ChatConfig) -> Arc<dyn Resolver> {
    match config {
        ChatConfig::Ragflow(c) => Arc::new(RagflowApiAgent::new(c)),
        ChatConfig::RagChat(c) => Arc::new(RagChatApiAgent::new(c)),
        ChatConfig::Gemini(c) => Arc::new(GeminiApiAgent::new(c)),
    }
}

/// Opening message shown by the assistant before the first turn.
pub fn greeting(backend: Backend) -> &'static str {
    match backend {
        Backend::Gemini => "Hello! I'm connected to Gemini. How can I help?",
        Backend::Ragflow | Backend::RagChat => "Hello! How can I help?",
    }
}

/// Result of handling one chat input.
#[derive(Debug)]
pub enum InteractionResult {
    /// Nothing to answer (blank input, or a message the assistant should not reply to).
    NoOp,
    /// The assistant's reply.
    Reply {
        /// The completed turn, with the typed outcome.
        turn: ConversationTurn,
        /// Growing prefixes of the text to display; the last one is the full reply.
        prefixes: Prefixes,
    },
}

/// Drives conversation turns against a [`Resolver`].
///
/// Turns are serialised: a second call to [`handle_input`](Self::handle_input)
/// waits until the first has finished, so a backend's session id is never
/// read and written by two turns at once.
pub struct InteractionManager {
    resolver: Arc<dyn Resolver>,
    turn_gate: Mutex<()>,
}

impl InteractionManager {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            turn_gate: Mutex::new(()),
        }
    }

    /// Creates a manager for the configured backend.
    pub fn from_config(config: ChatConfig) -> Self {
        Self::new(build_resolver(config))
    }

    pub fn expertise(&self) -> &str {
        self.resolver.expertise()
    }

    /// Handles a message posted to the chat by `sender`.
    ///
    /// Only user messages are answered. The remote call happens before this
    /// returns; the returned prefixes only replay the finished text.
    pub async fn handle_input(&self, input: &str, sender: MessageRole) -> InteractionResult {
        let question = input.trim();
        if sender != MessageRole::User || question.is_empty() {
            return InteractionResult::NoOp;
        }

        let _turn = self.turn_gate.lock().await;
        let outcome = self.resolver.resolve(question).await;
        if let Err(err) = &outcome {
            tracing::warn!("Turn failed ({:?}) via {}", err.kind(), self.resolver.expertise());
        }

        let turn = ConversationTurn::new(question, outcome);
        tracing::info!(
            timestamp = %turn.timestamp,
            failed = turn.is_error(),
            "Turn completed via {}",
            self.resolver.expertise()
        );
        let prefixes = streamify(turn.display_text());
        InteractionResult::Reply { turn, prefixes }
    }

    /// Session id the next turn will carry, if the backend keeps one.
    pub async fn session_id(&self) -> Option<String> {
        self.resolver.session_id().await
    }

    /// Starts a new conversation on the next turn.
    pub async fn reset_session(&self) {
        let _turn = self.turn_gate.lock().await;
        self.resolver.reset_session().await;
    }
}
