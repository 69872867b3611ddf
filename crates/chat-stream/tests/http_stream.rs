//! End-to-end tests of the HTTP transport against a local mock endpoint.

use std::sync::Arc;

use chat_stream::{
    ChatClient, ChatError, ClientConfig, CollectingSink, HistoryEntry, SessionOptions,
    Termination, send,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(deltas: &[&str], done: bool) -> String {
    let mut body = String::new();
    for delta in deltas {
        body.push_str(&format!(
            "data: {}\n\n",
            serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}]
            })
        ));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

fn client_for(server: &MockServer) -> ChatClient {
    ChatClient::new(ClientConfig::new(format!("{}/v1", server.uri()))).expect("client")
}

async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn send_posts_history_and_flags_and_streams_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "vinallama",
            "stream": true,
            "temperature": 0.7,
            "search_web": true,
            "device_id": "device_abc123xyz",
            "messages": [
                {"role": "assistant", "content": "Xin chào!"},
                {"role": "user", "content": "Lịch nghỉ Tết?"},
                {"role": "assistant", "content": "Từ 28 tháng Chạp."},
                {"role": "user", "content": "Cảm ơn"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse(&["Không ", "có gì", "!"], true), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        HistoryEntry::new("bot", "Xin chào!"),
        HistoryEntry::new("user", "Lịch nghỉ Tết?"),
        HistoryEntry::new("bot", "Từ 28 tháng Chạp."),
    ];
    let mut updates = Vec::new();
    let text = send(
        &history,
        "Cảm ơn",
        &format!("{}/v1", server.uri()),
        "vinallama",
        true,
        "device_abc123xyz",
        |text| updates.push(text.to_owned()),
    )
    .await
    .expect("reply");

    assert_eq!(text, "Không có gì!");
    assert_eq!(updates, vec!["Không ", "Không có gì", "Không có gì!"]);
}

#[tokio::test]
async fn non_success_status_is_transport_error_without_callbacks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .expect(1)
        .mount(&server)
        .await;

    let mut calls = 0;
    let err = send(
        &[],
        "Hi",
        &format!("{}/v1", server.uri()),
        "m",
        false,
        "device_x",
        |_| calls += 1,
    )
    .await
    .expect_err("must fail");

    assert_eq!(calls, 0);
    assert_eq!(err.status_code(), Some(500));
    match err {
        ChatError::Transport { message, .. } => {
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("model not loaded"), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_without_done_returns_partial_text() {
    let server = MockServer::start().await;
    let mut body = sse(&["first", " second"], false);
    body.push_str("data: {\"choices\":[{\"delta\":{\"content\":\" cut");
    mount_stream(&server, body).await;

    let client = client_for(&server);
    let request = client.request().conversation(&[], "Hi").build().expect("request");
    let reply = client.stream(&request, |_| {}).await.expect("reply");

    assert_eq!(reply.text, "first second");
    assert_eq!(reply.termination, Termination::EndOfStream);
}

#[tokio::test]
async fn malformed_frame_reaches_sink_and_is_skipped() {
    let server = MockServer::start().await;
    let body = format!("{}data: {{oops\n\n{}", sse(&["a"], false), sse(&["b"], true));
    mount_stream(&server, body).await;

    let sink = CollectingSink::new();
    let client = client_for(&server);
    let request = client.request().conversation(&[], "Hi").build().expect("request");
    let reply = client
        .stream_with(
            &request,
            SessionOptions::default().diagnostics(Arc::new(sink.clone())),
            |_| {},
        )
        .await
        .expect("reply");

    assert_eq!(reply.text, "ab");
    assert_eq!(reply.dropped_frames, 1);
    assert_eq!(sink.warnings().len(), 1);
    assert_eq!(sink.warnings()[0].payload, "{oops");
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse(&["ok"], true), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(
        ClientConfig::new(format!("{}/v1", server.uri())).api_key("secret-key"),
    )
    .expect("client");
    let request = client.request().conversation(&[], "Hi").build().expect("request");
    let reply = client.stream(&request, |_| {}).await.expect("reply");
    assert_eq!(reply.text, "ok");
}

#[tokio::test]
async fn complete_posts_unary_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "local-model",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-2",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "pong"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client.request().conversation(&[], "ping").build().expect("request");
    assert_eq!(client.complete(&request).await.expect("text"), "pong");
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let err = send(&[], "Hi", "http://127.0.0.1:1/v1", "m", false, "device_x", |_| {})
        .await
        .expect_err("must fail");
    assert!(matches!(err, ChatError::Transport { status_code: None, .. }));
}

#[tokio::test]
async fn complete_with_non_json_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client.request().conversation(&[], "ping").build().expect("request");
    let err = client.complete(&request).await.expect_err("must fail");
    assert!(matches!(err, ChatError::Protocol(msg) if msg.contains("not JSON")));
}
