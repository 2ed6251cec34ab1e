//! RagChatApiAgent - client for a plain RAG chat endpoint.
//!
//! The endpoint takes `{ "query": ..., "stream": false }` and usually answers
//! `{ "answer": "..." }`; the same envelope matchers as RagFlow are applied so
//! wrapped answers and service errors are handled too.

use crate::envelope;
use crate::http::{http_error, send_json};
use crate::resolver::Resolver;
use async_trait::async_trait;
use ragchat_core::ResolveError;
use ragchat_core::config::RagChatConfig;
use reqwest::Client;
use serde::Serialize;

#[derive(Clone)]
pub struct RagChatApiAgent {
    client: Client,
    config: RagChatConfig,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    stream: bool,
}

impl RagChatApiAgent {
    pub fn new(config: RagChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Resolver for RagChatApiAgent {
    fn expertise(&self) -> &str {
        "RAG chat endpoint"
    }

    async fn resolve(&self, question: &str) -> Result<String, ResolveError> {
        tracing::debug!("RAG chat request to {}", self.config.url);

        let mut request = self
            .client
            .post(&self.config.url)
            .json(&QueryRequest {
                query: question,
                stream: false,
            })
            .timeout(self.config.timeout);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let envelope = send_json(request, &self.config.url, http_error).await?;
        envelope::interpret(&envelope).map(|extracted| extracted.answer)
    }
}
