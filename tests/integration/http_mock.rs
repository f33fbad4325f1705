//! End-to-end tests through `HttpTransport` against a mockito server.

use crate::integration::mock_server::MockServerFixture;
use crate::integration::scripted::completion_body;
use futures::StreamExt;
use openrouter_rust::{ChatMessage, ErrorKind};

#[tokio::test]
async fn chat_completion_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json("POST", "/chat/completions", 200, &completion_body("Hello"))
        .await;

    let (resp, stats) = fixture
        .client(0)
        .chat_completion_with_stats(vec![ChatMessage::user("Hi")], "openai/gpt-4o-mini", None)
        .await
        .unwrap();

    assert_eq!(resp.content(), "Hello");
    assert_eq!(stats.http_status, 200);
    assert_eq!(stats.upstream_request_id.as_deref(), Some("req-upstream-42"));
    mock.assert_async().await;
}

#[tokio::test]
async fn streaming_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(
            "/chat/completions",
            &[
                ": OPENROUTER PROCESSING",
                r#"{"id":"gen-1","choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"},"finish_reason":null}]}"#,
                r#"{"id":"gen-1","choices":[{"index":0,"delta":{"content":"lo"},"finish_reason":null}]}"#,
                r#"{"id":"gen-1","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
                "[DONE]",
            ],
        )
        .await;

    let chunks: Vec<_> = fixture
        .client(0)
        .stream_completion(vec![ChatMessage::user("Hi")], "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    let text: String = chunks.iter().map(|c| c.as_ref().unwrap().content.as_str()).collect();
    assert_eq!(text, "Hello");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_retried_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/credits")
        .with_status(503)
        .with_body(r#"{"error":{"code":503,"message":"Service unavailable"}}"#)
        .expect(3)
        .create_async()
        .await;

    let err = fixture.client(2).get_balance().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.attempts(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_is_auth_error() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json(
            "GET",
            "/models",
            401,
            r#"{"error":{"code":401,"message":"No auth credentials found"}}"#,
        )
        .await;

    let err = fixture.client(3).list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.http_status(), Some(401));
    assert_eq!(err.message(), "No auth credentials found");
    assert_eq!(err.context().details.as_deref(), Some("upstream_id: req-upstream-42"));
    mock.assert_async().await;
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let client = openrouter_rust::Client::builder()
        .api_key("sk-test")
        // Nothing listens on the discard port.
        .base_url("http://127.0.0.1:9")
        .retry_policy(openrouter_rust::RetryPolicy::no_retries())
        .build()
        .unwrap();

    let err = client.list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.attempts(), 1);
}
