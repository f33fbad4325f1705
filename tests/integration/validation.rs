//! Request validation and outgoing request shape.

use crate::integration::scripted::{completion_body, fast_policy, ScriptedTransport, Step};
use openrouter_rust::{ChatMessage, ChatOptions, Client, ErrorKind};
use serde_json::json;

fn client(transport: &std::sync::Arc<ScriptedTransport>) -> Client {
    Client::builder()
        .api_key("sk-or-test")
        .transport(transport.clone())
        .retry_policy(fast_policy(3))
        .http_referer("https://example.app")
        .app_title("Example App")
        .build()
        .unwrap()
}

#[tokio::test]
async fn rejected_requests_never_reach_transport() {
    let transport = ScriptedTransport::new(vec![Step::ok(completion_body("x"))]);
    let client = client(&transport);

    let cases: Vec<(Vec<ChatMessage>, &str, Option<ChatOptions>, &str)> = vec![
        (vec![], "openai/gpt-4o-mini", None, "request.messages"),
        (vec![ChatMessage::user("Hi")], "", None, "request.model"),
        (
            vec![ChatMessage::user("Hi")],
            "openai/gpt-4o-mini",
            Some(ChatOptions::new().temperature(2.5)),
            "request.temperature",
        ),
        (
            vec![ChatMessage::user("Hi")],
            "openai/gpt-4o-mini",
            Some(ChatOptions::new().top_p(1.5)),
            "request.top_p",
        ),
        (
            vec![ChatMessage::user("Hi")],
            "openai/gpt-4o-mini",
            Some(ChatOptions::new().max_tokens(0)),
            "request.max_tokens",
        ),
    ];

    for (messages, model, options, field) in cases {
        let err = client.chat_completion(messages, model, options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.context().field_path.as_deref(), Some(field));
        assert_eq!(err.attempts(), 0);
    }
    let err = client
        .stream_completion(vec![], "openai/gpt-4o-mini", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn outgoing_request_shape() {
    let transport = ScriptedTransport::new(vec![Step::ok(completion_body("x"))]);
    let options = ChatOptions::new()
        .max_tokens(64)
        .temperature(0.7)
        .option("transforms", json!(["middle-out"]));
    client(&transport)
        .chat_completion(
            vec![ChatMessage::system("Be brief"), ChatMessage::user("Hi")],
            "openai/gpt-4o-mini",
            Some(options),
        )
        .await
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.request.path, "/chat/completions");
    assert_eq!(
        call.request.body.clone().unwrap(),
        json!({
            "model": "openai/gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Be brief"},
                {"role": "user", "content": "Hi"}
            ],
            "max_tokens": 64,
            "temperature": 0.7,
            "transforms": ["middle-out"]
        })
    );

    let headers = &call.request.headers;
    let auth = &headers["authorization"];
    assert_eq!(auth, "Bearer sk-or-test");
    assert!(auth.is_sensitive());
    assert_eq!(headers["http-referer"], "https://example.app");
    assert_eq!(headers["x-title"], "Example App");
    assert_eq!(headers["content-type"], "application/json");
}
