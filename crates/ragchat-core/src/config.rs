//! Configuration loading for ragchat.
//!
//! Values come from three places, in priority order:
//! 1. `~/.config/ragchat/secret.json`
//! 2. Environment variables (a `.env` file in the working directory is loaded first)
//! 3. Built-in defaults

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RAGFLOW_SERVER: &str = "http://localhost:9380";
pub const DEFAULT_RAG_CHAT_URL: &str = "http://localhost:8000/api/v1/rag/chat";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Agents may run several reasoning steps before answering.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which remote conversational service to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// RagFlow agent completions API.
    #[default]
    Ragflow,
    /// Plain RAG chat endpoint answering `{ "answer": ... }`.
    RagChat,
    /// Gemini REST API.
    Gemini,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Ragflow => "ragflow",
            Backend::RagChat => "rag-chat",
            Backend::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ragflow" => Ok(Backend::Ragflow),
            "rag-chat" | "rag_chat" | "ragchat" => Ok(Backend::RagChat),
            "gemini" => Ok(Backend::Gemini),
            other => Err(format!(
                "unknown backend '{other}' (expected ragflow, rag-chat or gemini)"
            )),
        }
    }
}

/// Root structure of `secret.json`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub ragflow: Option<RagflowSecret>,
    #[serde(default)]
    pub rag_chat: Option<RagChatSecret>,
    #[serde(default)]
    pub gemini: Option<GeminiSecret>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RagflowSecret {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RagChatSecret {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeminiSecret {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl SecretConfig {
    /// Reads `secret.json` from the given path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ChatError::io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reads `~/.config/ragchat/secret.json` when it exists.
    pub fn load_default() -> Result<Option<Self>> {
        let path = secret_path()?;
        if !path.exists() {
            return Ok(None);
        }
        Self::from_path(&path).map(Some)
    }
}

/// Loads `.env` from the working directory into the process environment.
///
/// Variables already set are left alone, so calling this twice is harmless.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Returns the ragchat configuration directory: `~/.config/ragchat`
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChatError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("ragchat"))
}

/// Returns the log directory: `~/.config/ragchat/logs`
pub fn log_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("logs"))
}

/// Returns the path to the secret file: `~/.config/ragchat/secret.json`
pub fn secret_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("secret.json"))
}

/// Settings for the RagFlow agent backend.
#[derive(Debug, Clone)]
pub struct RagflowConfig {
    pub server: String,
    pub api_key: String,
    pub agent_id: String,
    /// Session to resume; `None` lets the service open a new one.
    pub session_id: Option<String>,
    pub timeout: Duration,
}

impl RagflowConfig {
    /// `POST` target for agent completions.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/v1/agents/{}/completions",
            self.server.trim_end_matches('/'),
            self.agent_id
        )
    }
}

/// Settings for the plain RAG chat endpoint.
#[derive(Debug, Clone)]
pub struct RagChatConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Settings for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Sent as `system_instruction` with every request.
    pub system_instruction: Option<String>,
    pub timeout: Duration,
}

/// Resolved configuration for the selected backend.
#[derive(Debug, Clone)]
pub enum ChatConfig {
    Ragflow(RagflowConfig),
    RagChat(RagChatConfig),
    Gemini(GeminiConfig),
}

impl ChatConfig {
    /// Loads `.env`, `secret.json` and the process environment, then builds the
    /// configuration for `backend`.
    pub fn load(backend: Backend) -> Result<Self> {
        load_dotenv();
        let secret = SecretConfig::load_default()?;
        Self::from_sources(backend, secret.as_ref(), |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an optional `secret.json` and an
    /// environment lookup. Secret values win over environment values.
    pub fn from_sources<F>(backend: Backend, secret: Option<&SecretConfig>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        let timeout = match env("RAGCHAT_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ChatError::config(format!("RAGCHAT_TIMEOUT_SECS must be a whole number, got '{raw}'"))
            })?,
            None => DEFAULT_TIMEOUT,
        };

        match backend {
            Backend::Ragflow => {
                let section = secret.and_then(|s| s.ragflow.clone()).unwrap_or_default();
                let server = section
                    .server
                    .or_else(|| env("RAGFLOW_SERVER"))
                    .unwrap_or_else(|| DEFAULT_RAGFLOW_SERVER.to_string());
                let api_key = section.api_key.or_else(|| env("RAGFLOW_API_KEY")).ok_or_else(|| {
                    ChatError::config("RAGFLOW_API_KEY not found in secret.json or environment variables")
                })?;
                let agent_id = section.agent_id.or_else(|| env("RAGFLOW_AGENT_ID")).ok_or_else(|| {
                    ChatError::config("RAGFLOW_AGENT_ID not found in secret.json or environment variables")
                })?;
                let session_id = section
                    .session_id
                    .or_else(|| env("RAGFLOW_SESSION_ID"))
                    .filter(|id| !id.trim().is_empty());

                Ok(ChatConfig::Ragflow(RagflowConfig {
                    server,
                    api_key,
                    agent_id,
                    session_id,
                    timeout,
                }))
            }
            Backend::RagChat => {
                let section = secret.and_then(|s| s.rag_chat.clone()).unwrap_or_default();
                let url = section
                    .url
                    .or_else(|| env("RAGCHAT_URL"))
                    .unwrap_or_else(|| DEFAULT_RAG_CHAT_URL.to_string());
                let api_key = section.api_key.or_else(|| env("RAGCHAT_API_KEY"));

                Ok(ChatConfig::RagChat(RagChatConfig {
                    url,
                    api_key,
                    timeout,
                }))
            }
            Backend::Gemini => {
                let section = secret.and_then(|s| s.gemini.clone()).unwrap_or_default();
                let api_key = section.api_key.or_else(|| env("GEMINI_API_KEY")).ok_or_else(|| {
                    ChatError::config("GEMINI_API_KEY not found in secret.json or environment variables")
                })?;
                let model = section
                    .model_name
                    .or_else(|| env("GEMINI_MODEL"))
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                let base_url = env("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
                let system_instruction = section
                    .system_instruction
                    .or_else(|| env("GEMINI_SYSTEM_INSTRUCTION"))
                    .filter(|text| !text.trim().is_empty());

                Ok(ChatConfig::Gemini(GeminiConfig {
                    api_key,
                    model,
                    base_url,
                    system_instruction,
                    timeout,
                }))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            ChatConfig::Ragflow(_) => Backend::Ragflow,
            ChatConfig::RagChat(_) => Backend::RagChat,
            ChatConfig::Gemini(_) => Backend::Gemini,
        }
    }

    /// Overrides the request timeout of whichever backend is configured.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match &mut self {
            ChatConfig::Ragflow(c) => c.timeout = timeout,
            ChatConfig::RagChat(c) => c.timeout = timeout,
            ChatConfig::Gemini(c) => c.timeout = timeout,
        }
        self
    }

    /// Overrides the Gemini system instruction. Other backends ignore it.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        if let ChatConfig::Gemini(c) = &mut self {
            let instruction = instruction.into();
            c.system_instruction = (!instruction.trim().is_empty()).then_some(instruction);
        }
        self
    }

    /// Overrides the configured RagFlow session. Other backends ignore it.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        if let ChatConfig::Ragflow(c) = &mut self {
            let session_id = session_id.into();
            c.session_id = (!session_id.trim().is_empty()).then_some(session_id);
        }
        self
    }
}
