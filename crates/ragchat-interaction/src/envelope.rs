//! Response envelope normalisation.
//!
//! RagFlow wraps the answer differently depending on how the agent is
//! deployed (direct agent, workflow, plain RAG endpoint). Each known shape is
//! a named matcher; [`interpret`] runs them in order and the first one that
//! recognises the envelope decides the outcome.

use ragchat_core::ResolveError;
use serde_json::Value;

/// Answer text extracted from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub answer: String,
    /// Session id reported alongside the answer, if any.
    pub session_id: Option<String>,
}

impl Extracted {
    fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            session_id: None,
        }
    }
}

/// `None` means "not this shape"; `Some(Err(_))` means the shape was
/// recognised but reports or contains an error.
type Matcher = fn(&Value) -> Option<Result<Extracted, ResolveError>>;

/// Known envelope shapes, highest priority first.
const MATCHERS: &[(&str, Matcher)] = &[
    ("service_status", service_status),
    ("agent_answer", agent_answer),
    ("workflow_content", workflow_content),
    ("plain_text", plain_text),
    ("bare_answer", bare_answer),
];

/// Extracts the answer from a response envelope.
///
/// Falls back to [`ResolveError::UnrecognizedFormat`] carrying the raw
/// envelope when no shape matches.
pub fn interpret(envelope: &Value) -> Result<Extracted, ResolveError> {
    for (name, matcher) in MATCHERS {
        if let Some(outcome) = matcher(envelope) {
            tracing::debug!("Envelope matched shape `{}`", name);
            return outcome;
        }
    }

    tracing::debug!("Envelope matched no known shape");
    Err(ResolveError::unrecognized(envelope))
}

/// `{ "code": <non-zero>, "message": "..." }`
fn service_status(envelope: &Value) -> Option<Result<Extracted, ResolveError>> {
    let code = match envelope.get("code")? {
        Value::Null => return None,
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::String(s) if s == "0" || s.eq_ignore_ascii_case("success") => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let message = match envelope.get("message") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => "unknown error".to_string(),
        Some(Value::String(_)) => "unknown error".to_string(),
        Some(other) => other.to_string(),
    };

    Some(Err(ResolveError::service(code, message)))
}

/// `{ "data": { "answer": "...", "session_id": "..." } }`
fn agent_answer(envelope: &Value) -> Option<Result<Extracted, ResolveError>> {
    let data = envelope.get("data")?.as_object()?;
    let answer = data.get("answer")?;

    let answer = match answer {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => {
            return Some(Err(ResolveError::processing(format!(
                "`data.answer` is not a string: {other}"
            ))));
        }
    };

    let session_id = data
        .get("session_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    Some(Ok(Extracted { answer, session_id }))
}

/// `{ "data": { "data": { "content": "..." } } }` or
/// `{ "data": { "data": { "outputs": { "content": "..." } } } }`
fn workflow_content(envelope: &Value) -> Option<Result<Extracted, ResolveError>> {
    let inner = envelope.get("data")?.get("data")?.as_object()?;

    if let Some(content) = inner.get("content") {
        return Some(text_field(content, "data.data.content"));
    }

    let content = inner.get("outputs")?.as_object()?.get("content")?;
    Some(text_field(content, "data.data.outputs.content"))
}

/// `{ "data": { "data": "..." } }` or `{ "data": "..." }`
fn plain_text(envelope: &Value) -> Option<Result<Extracted, ResolveError>> {
    let data = envelope.get("data")?;
    let text = match data.get("data") {
        Some(Value::String(s)) => s.as_str(),
        _ => data.as_str()?,
    };
    Some(Ok(Extracted::answer(text)))
}

/// `{ "answer": "..." }`
fn bare_answer(envelope: &Value) -> Option<Result<Extracted, ResolveError>> {
    match envelope.get("answer")? {
        Value::Null => None,
        value => Some(text_field(value, "answer")),
    }
}

fn text_field(value: &Value, path: &str) -> Result<Extracted, ResolveError> {
    value
        .as_str()
        .map(|text| Extracted::answer(text))
        .ok_or_else(|| ResolveError::processing(format!("`{path}` is not a string: {value}")))
}
