//! Shared request plumbing for the HTTP agents.

use ragchat_core::ResolveError;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

/// Sends `request` and parses a 2xx body as JSON.
///
/// `target` names the endpoint in connection errors; it must not contain
/// credentials. Non-2xx responses are turned into errors by `on_http_error`,
/// which receives the status and the raw body text.
pub(crate) async fn send_json<F>(
    request: RequestBuilder,
    target: &str,
    on_http_error: F,
) -> Result<Value, ResolveError>
where
    F: FnOnce(StatusCode, String) -> ResolveError,
{
    let response = request
        .send()
        .await
        .map_err(|err| connection_error(target, err))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("Failed to read error body: {}", err.without_url()));
        tracing::warn!("{} answered with HTTP {}", target, status);
        return Err(on_http_error(status, body));
    }

    let body = response
        .text()
        .await
        .map_err(|err| connection_error(target, err))?;

    serde_json::from_str(&body).map_err(|err| {
        ResolveError::processing(format!("response is not valid JSON ({err}): {}", preview(&body)))
    })
}

/// Default mapping for non-2xx responses: the body as compact JSON when it
/// parses, otherwise just the status code.
pub(crate) fn http_error(status: StatusCode, body: String) -> ResolveError {
    let detail = serde_json::from_str::<Value>(&body)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| format!("Status: {}", status.as_u16()));
    ResolveError::http(status.as_u16(), detail)
}

fn connection_error(target: &str, err: reqwest::Error) -> ResolveError {
    // The request URL may carry an API key in its query string.
    let timed_out = err.is_timeout();
    let err = err.without_url();
    let detail = if timed_out {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    ResolveError::connection(target, detail)
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
