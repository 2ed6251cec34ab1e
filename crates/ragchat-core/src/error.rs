//! Error types for ragchat.
//!
//! Two families live here:
//! - [`ResolveError`]: the per-turn failures of a remote call. Their `Display`
//!   output is what the chat window shows in place of an answer.
//! - [`ChatError`]: setup failures (configuration, IO) that stop the program
//!   before any turn is taken.

use thiserror::Error;

/// Category of a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Http,
    Service,
    Connection,
    UnrecognizedFormat,
    Processing,
}

impl ErrorKind {
    /// Bracketed label printed at the start of the rendered error.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Http => "[HTTP ERROR]",
            Self::Service => "[SERVICE ERROR]",
            Self::Connection => "[CONNECTION ERROR]",
            Self::UnrecognizedFormat => "[UNRECOGNIZED FORMAT]",
            Self::Processing => "[PROCESSING ERROR]",
        }
    }
}

/// Failure of a single conversation turn.
///
/// Every variant renders to a non-empty string starting with its
/// [`ErrorKind::label`], so a failed turn is never confused with an empty
/// answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The remote service answered with a non-2xx status.
    #[error("[HTTP ERROR]: {status} - {detail}{}", hint_line(.hint))]
    Http {
        status: u16,
        detail: String,
        /// What the user should check, appended after a blank line.
        hint: Option<String>,
    },

    /// 2xx response whose embedded status code reports a failure.
    #[error("[SERVICE ERROR]: {message} ({code})")]
    Service { code: String, message: String },

    /// Transport failure: refused connection, DNS, timeout.
    #[error(
        "[CONNECTION ERROR]: {detail}\n\nCheck:\n- that the URL is correct: {url}\n- that the server is reachable\n- for network or firewall problems"
    )]
    Connection { url: String, detail: String },

    /// The response parsed but matched none of the known envelope shapes.
    #[error("[UNRECOGNIZED FORMAT]: the response did not match any known shape:\n{raw}")]
    UnrecognizedFormat { raw: String },

    /// Anything else that went wrong while interpreting the response.
    #[error("[PROCESSING ERROR]: {0}")]
    Processing(String),
}

impl ResolveError {
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
            hint: None,
        }
    }

    /// Attaches a hint to an `Http` error; other variants are returned unchanged.
    pub fn with_hint(mut self, text: impl Into<String>) -> Self {
        if let Self::Http { hint, .. } = &mut self {
            *hint = Some(text.into());
        }
        self
    }

    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn connection(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Builds an `UnrecognizedFormat` error carrying the pretty-printed envelope.
    pub fn unrecognized(raw: &serde_json::Value) -> Self {
        let raw = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
        Self::UnrecognizedFormat { raw }
    }

    pub fn processing(detail: impl Into<String>) -> Self {
        Self::Processing(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { .. } => ErrorKind::Http,
            Self::Service { .. } => ErrorKind::Service,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::UnrecognizedFormat { .. } => ErrorKind::UnrecognizedFormat,
            Self::Processing(_) => ErrorKind::Processing,
        }
    }
}

fn hint_line(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|text| format!("\n\nHint: {text}"))
        .unwrap_or_default()
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Processing(format!("invalid JSON in response: {err}"))
    }
}

/// Errors raised while setting the application up.
#[derive(Error, Debug, Clone)]
pub enum ChatError {
    /// Missing or invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl ChatError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_error_starts_with_its_label() {
        let errors = vec![
            ResolveError::http(401, "Status: 401"),
            ResolveError::service("1", "bad"),
            ResolveError::connection("http://localhost:1", "refused"),
            ResolveError::unrecognized(&json!({"foo": "bar"})),
            ResolveError::processing("boom"),
        ];

        for err in errors {
            let rendered = err.to_string();
            assert!(
                rendered.starts_with(err.kind().label()),
                "{rendered:?} should start with {}",
                err.kind().label()
            );
        }
    }

    #[test]
    fn test_http_hint_is_optional() {
        let plain = ResolveError::http(503, "Status: 503");
        assert_eq!(plain.to_string(), "[HTTP ERROR]: 503 - Status: 503");

        let hinted = plain.with_hint("check that the API key is correct.");
        assert_eq!(
            hinted.to_string(),
            "[HTTP ERROR]: 503 - Status: 503\n\nHint: check that the API key is correct."
        );
    }

    #[test]
    fn test_hint_ignored_for_other_kinds() {
        let err = ResolveError::processing("boom").with_hint("ignored");
        assert_eq!(err, ResolveError::processing("boom"));
    }

    #[test]
    fn test_service_error_rendering() {
        let err = ResolveError::service("102", "agent not found");
        assert_eq!(err.to_string(), "[SERVICE ERROR]: agent not found (102)");
    }

    #[test]
    fn test_connection_error_names_the_url() {
        let err = ResolveError::connection("https://rag.example/api", "timed out");
        let rendered = err.to_string();
        assert!(rendered.contains("CONNECTION ERROR"));
        assert!(rendered.contains("https://rag.example/api"));
    }

    #[test]
    fn test_unrecognized_keeps_pretty_json() {
        let err = ResolveError::unrecognized(&json!({"foo": "bar"}));
        assert!(err.to_string().contains("\"foo\": \"bar\""));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "secret.json");
        let err: ChatError = io.into();
        assert!(matches!(err, ChatError::Io { .. }));
        assert!(err.to_string().contains("NotFound"));
    }
}
