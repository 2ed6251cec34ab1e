//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Sends one `generateContent` request per turn and returns the first text
//! part of the reply.

use crate::http::send_json;
use crate::resolver::Resolver;
use async_trait::async_trait;
use ragchat_core::ResolveError;
use ragchat_core::config::GeminiConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    config: GeminiConfig,
}

impl GeminiApiAgent {
    /// Creates a new agent from the resolved configuration.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Endpoint without the API key, safe to show in error messages.
    fn target(&self) -> String {
        format!(
            "{}/{model}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model = self.config.model
        )
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ResolveError> {
        let target = self.target();
        tracing::debug!("Gemini request to {}", target);

        let request = self
            .client
            .post(&target)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .timeout(self.config.timeout);

        let value = send_json(request, &target, |status, body| {
            map_http_error(status, body)
                .with_hint("check that the API key and the model name are correct.")
        })
        .await?;
        let parsed: GenerateContentResponse = serde_json::from_value(value).map_err(|err| {
            ResolveError::processing(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Resolver for GeminiApiAgent {
    fn expertise(&self) -> &str {
        "Gemini API"
    }

    async fn resolve(&self, question: &str) -> Result<String, ResolveError> {
        let contents = vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: question.to_string(),
            }],
        }];

        let system_instruction = self.config.system_instruction.as_ref().map(|text| Content {
            role: "system".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        });

        let request = GenerateContentRequest {
            contents,
            system_instruction,
        };
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ResolveError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            ResolveError::processing("Gemini API returned no text in the response candidates")
        })
}

fn map_http_error(status: StatusCode, body: String) -> ResolveError {
    let detail = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("Status: {}", status.as_u16())
            } else {
                body.clone()
            }
        });

    ResolveError::http(status.as_u16(), detail)
}
