use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use ragchat_core::config::{GeminiConfig, RagChatConfig};
use ragchat_core::{ErrorKind, MessageRole};
use ragchat_interaction::{
    GeminiApiAgent, InteractionManager, InteractionResult, RagChatApiAgent, Resolver,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const GEMINI_PATH: &str = "/gemini-2.5-flash:generateContent";

fn rag_chat_config(url: String, api_key: Option<&str>) -> RagChatConfig {
    RagChatConfig {
        url,
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(5),
    }
}

fn gemini_config(base_url: String) -> GeminiConfig {
    GeminiConfig {
        api_key: "gemini-key".to_string(),
        model: "gemini-2.5-flash".to_string(),
        base_url,
        system_instruction: None,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_rag_chat_sends_query_and_reads_answer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/rag/chat")
        .match_body(Matcher::Json(json!({ "query": "what is rag?", "stream": false })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "answer": "retrieval augmented generation" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let agent = RagChatApiAgent::new(rag_chat_config(
        format!("{}/api/v1/rag/chat", server.url()),
        None,
    ));
    assert_eq!(
        agent.resolve("what is rag?").await.unwrap(),
        "retrieval augmented generation"
    );
    assert_eq!(agent.session_id().await, None);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rag_chat_sends_bearer_when_configured() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat")
        .match_header("authorization", "Bearer rag-key")
        .with_status(200)
        .with_body(json!({ "answer": "ok" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let agent = RagChatApiAgent::new(rag_chat_config(format!("{}/chat", server.url()), Some("rag-key")));
    assert_eq!(agent.resolve("q").await.unwrap(), "ok");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rag_chat_missing_answer_is_unrecognized() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(json!({ "result": "elsewhere" }).to_string())
        .create_async()
        .await;

    let agent = RagChatApiAgent::new(rag_chat_config(format!("{}/chat", server.url()), None));
    let err = agent.resolve("q").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedFormat);
}

#[tokio::test]
async fn test_rag_chat_http_error_has_no_agent_hint() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat")
        .with_status(500)
        .with_body(json!({ "detail": "index offline" }).to_string())
        .create_async()
        .await;

    let agent = RagChatApiAgent::new(rag_chat_config(format!("{}/chat", server.url()), None));
    let err = agent.resolve("q").await.unwrap_err();
    let rendered = err.to_string();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(rendered.contains("index offline"));
    assert!(!rendered.contains("agent id"));
}

#[tokio::test]
async fn test_gemini_returns_first_text_part() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "gemini-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Olá" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Olá! Tudo bem?" }] } }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let agent = GeminiApiAgent::new(gemini_config(server.url()));
    assert_eq!(agent.resolve("Olá").await.unwrap(), "Olá! Tudo bem?");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_sends_system_instruction() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "system_instruction": { "role": "system", "parts": [{ "text": "Answer briefly." }] }
        })))
        .with_status(200)
        .with_body(json!({ "candidates": [{ "content": { "parts": [{ "text": "Yes." }] } }] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut config = gemini_config(server.url());
    config.system_instruction = Some("Answer briefly.".to_string());
    let agent = GeminiApiAgent::new(config);
    assert_eq!(agent.resolve("Well?").await.unwrap(), "Yes.");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_http_error_hides_api_key() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(
            json!({ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } })
                .to_string(),
        )
        .create_async()
        .await;

    let agent = GeminiApiAgent::new(gemini_config(server.url()));
    let err = agent.resolve("q").await.unwrap_err();
    let rendered = err.to_string();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(rendered.contains("INVALID_ARGUMENT: API key not valid"));
    assert!(rendered.contains("model name"));
    assert!(!rendered.contains("agent id"));
    assert!(!rendered.contains("gemini-key"));
}

/// `true` once the request head and a body of the announced length arrived.
fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= length
}

#[tokio::test]
async fn test_gemini_unreadable_error_body_is_reported() {
    // Announces a 100-byte error body, then hangs up after a few bytes
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request_complete(&request) {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
    });

    let agent = GeminiApiAgent::new(gemini_config(format!("http://{addr}")));
    let err = agent.resolve("q").await.unwrap_err();
    let rendered = err.to_string();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(rendered.starts_with("[HTTP ERROR]: 500"));
    assert!(rendered.contains("Failed to read error body"));
    assert!(!rendered.contains("gemini-key"));
}

#[tokio::test]
async fn test_manager_streams_resolved_answer() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(json!({ "answer": "abc" }).to_string())
        .create_async()
        .await;

    let resolver: Arc<dyn Resolver> =
        Arc::new(RagChatApiAgent::new(rag_chat_config(format!("{}/chat", server.url()), None)));
    let manager = InteractionManager::new(resolver);

    let InteractionResult::Reply { turn, prefixes } =
        manager.handle_input("letters?", MessageRole::User).await
    else {
        panic!("expected a reply");
    };

    assert_eq!(turn.outcome, Ok("abc".to_string()));
    assert_eq!(prefixes.collect::<Vec<_>>(), vec!["a", "ab", "abc"]);
}
