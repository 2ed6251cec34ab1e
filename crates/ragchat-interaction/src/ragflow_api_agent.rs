//! RagflowApiAgent - REST client for RagFlow agent completions.
//!
//! Calls `POST {server}/api/v1/agents/{agent_id}/completions` in non-streaming
//! mode and keeps the session id the service hands back, so consecutive turns
//! belong to one conversation.

use crate::envelope;
use crate::http::{http_error, send_json};
use crate::resolver::Resolver;
use async_trait::async_trait;
use ragchat_core::config::RagflowConfig;
use ragchat_core::{ResolveError, SessionStore};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

const HTTP_HINT: &str = "check that the API key and the agent id are correct.";

/// Agent implementation that talks to a RagFlow agent.
#[derive(Clone)]
pub struct RagflowApiAgent {
    client: Client,
    config: RagflowConfig,
    endpoint: String,
    session: SessionStore,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    question: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

impl RagflowApiAgent {
    /// Creates an agent; the configured session id, if any, is used until the
    /// service reports a different one.
    pub fn new(config: RagflowConfig) -> Self {
        let endpoint = config.endpoint();
        let session = SessionStore::new(config.session_id.clone());
        Self {
            client: Client::new(),
            config,
            endpoint,
            session,
        }
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The store holding this agent's session id.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}

#[async_trait]
impl Resolver for RagflowApiAgent {
    fn expertise(&self) -> &str {
        "RagFlow agent"
    }

    async fn resolve(&self, question: &str) -> Result<String, ResolveError> {
        let body = CompletionRequest {
            question,
            stream: false,
            session_id: self.session.get().await,
        };

        tracing::debug!(
            "RagFlow request to {} (session: {:?})",
            self.endpoint,
            body.session_id
        );

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .timeout(self.config.timeout);

        let envelope = send_json(request, &self.endpoint, |status, body| {
            http_error(status, body).with_hint(HTTP_HINT)
        })
        .await?;
        let extracted = envelope::interpret(&envelope)?;

        if let Some(session_id) = extracted.session_id.as_deref() {
            self.session.set(session_id).await;
        }

        Ok(extracted.answer)
    }

    async fn session_id(&self) -> Option<String> {
        self.session.get().await
    }

    async fn reset_session(&self) {
        self.session.clear().await;
    }
}
