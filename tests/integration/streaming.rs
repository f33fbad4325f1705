//! Streaming completions over the scripted transport.

use crate::integration::scripted::{
    as_refs, client_with, completion_body, delta_frame, fast_policy, hello_frames, stop_frame,
    ScriptedTransport, Step, DONE,
};
use futures::StreamExt;
use openrouter_rust::{ChatCompletionRequest, ChatMessage, ErrorKind, FinishReason};

fn hello() -> Vec<ChatMessage> {
    vec![ChatMessage::user("Say hello")]
}

#[tokio::test]
async fn streamed_chunks_match_unary_content() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![
        Step::sse(&as_refs(&frames)),
        Step::ok(completion_body("Hello")),
    ]);
    let client = client_with(&transport, fast_policy(0));

    let stream = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 3);
    let chunks: Vec<_> = chunks.into_iter().map(|c| c.unwrap()).collect();
    let streamed: String = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(streamed, "Hello");
    assert_eq!(chunks[2].finish_reason, Some(FinishReason::Stop));
    assert_eq!(chunks[2].usage.map(|u| u.total_tokens), Some(7));

    let unary = client
        .chat_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    assert_eq!(unary.content(), streamed);
}

#[tokio::test]
async fn collect_response_aggregates_chunks() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![Step::sse(&as_refs(&frames))]);
    let client = client_with(&transport, fast_policy(0));

    let stream = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    assert_eq!(stream.stats().upstream_request_id.as_deref(), Some("upstream-1"));
    let resp = stream.collect_response().await.unwrap();
    assert_eq!(resp.content(), "Hello");
    assert_eq!(resp.id, "gen-1");
    assert_eq!(resp.finish_reason(), Some(FinishReason::Stop));
    assert_eq!(resp.usage.map(|u| u.total_tokens), Some(7));
}

#[tokio::test]
async fn streaming_request_carries_stream_flag_and_accept_header() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![Step::sse(&as_refs(&frames))]);
    let client = client_with(&transport, fast_policy(0));
    let _ = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    let call = &transport.calls()[0];
    let body = call.request.body.as_ref().unwrap();
    assert_eq!(body["stream"], serde_json::json!(true));
    assert_eq!(call.request.headers["accept"], "text/event-stream");
}

#[tokio::test(start_paused = true)]
async fn failure_before_first_chunk_is_retried() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![
        Step::status(503, r#"{"error":{"code":503,"message":"No instances available"}}"#),
        Step::Reset,
        Step::sse(&as_refs(&frames)),
    ]);
    let client = client_with(&transport, fast_policy(3));

    let stream = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    assert_eq!(stream.stats().attempts, 3);
    let resp = stream.collect_response().await.unwrap();
    assert_eq!(resp.content(), "Hello");
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn stream_closed_before_any_chunk_is_retried() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![
        Step::sse(&[": OPENROUTER PROCESSING\n\n"]),
        Step::sse(&as_refs(&frames)),
    ]);
    let client = client_with(&transport, fast_policy(2));

    let resp = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect_response()
        .await
        .unwrap();
    assert_eq!(resp.content(), "Hello");
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn mid_stream_failure_is_not_retried() {
    let hel = delta_frame("Hel");
    let transport = ScriptedTransport::new(vec![
        Step::sse(&[hel.as_str()]),
        Step::sse(&as_refs(&hello_frames())),
    ]);
    let client = client_with(&transport, fast_policy(3));

    let items: Vec<_> = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().content, "Hel");
    let err = items[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn malformed_event_mid_stream_keeps_earlier_chunks() {
    let hel = delta_frame("Hel");
    let lo = delta_frame("lo");
    let stop = stop_frame();
    let transport = ScriptedTransport::new(vec![Step::sse(&[
        hel.as_str(),
        "data: {\"choices\": [\n\n",
        lo.as_str(),
        stop.as_str(),
        DONE,
    ])]);
    let client = client_with(&transport, fast_policy(0));

    let items: Vec<_> = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 4);
    assert_eq!(items[1].as_ref().unwrap_err().kind(), ErrorKind::Validation);
    let text: String = items.iter().filter_map(|i| i.as_ref().ok()).map(|c| c.content.as_str()).collect();
    assert_eq!(text, "Hello");
}

#[tokio::test]
async fn malformed_first_event_is_an_item_not_a_failed_call() {
    let hel = delta_frame("Hel");
    let lo = delta_frame("lo");
    let stop = stop_frame();
    let transport = ScriptedTransport::new(vec![Step::sse(&[
        "data: {\"choices\": [\n\n",
        hel.as_str(),
        lo.as_str(),
        stop.as_str(),
        DONE,
    ])]);
    let client = client_with(&transport, fast_policy(3));

    let items: Vec<_> = client
        .stream_completion(hello(), "openai/gpt-4o-mini", None)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 4);
    assert_eq!(items[0].as_ref().unwrap_err().kind(), ErrorKind::Validation);
    let text: String = items.iter().filter_map(|i| i.as_ref().ok()).map(|c| c.content.as_str()).collect();
    assert_eq!(text, "Hello");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn simple_completion_stream_yields_text() {
    let frames = hello_frames();
    let transport = ScriptedTransport::new(vec![Step::sse(&as_refs(&frames))]);
    let client = client_with(&transport, fast_policy(0));

    let parts: Vec<String> = client
        .simple_completion_stream("Say hello", None)
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(parts, vec!["Hel".to_string(), "lo".to_string()]);

    let body = transport.calls()[0].request.body.clone().unwrap();
    assert_eq!(body["model"], "anthropic/claude-3.5-sonnet");
}

#[tokio::test]
async fn stream_flag_must_match_entry_point() {
    let transport = ScriptedTransport::new(vec![]);
    let client = client_with(&transport, fast_policy(0));

    let unary = ChatCompletionRequest::builder("openai/gpt-4o-mini")
        .message(ChatMessage::user("Hi"))
        .build()
        .unwrap();
    let err = client.send_stream(&unary).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let streaming = ChatCompletionRequest::builder("openai/gpt-4o-mini")
        .message(ChatMessage::user("Hi"))
        .stream(true)
        .build()
        .unwrap();
    let err = client.send(&streaming).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.context().field_path.as_deref(), Some("request.stream"));

    assert_eq!(transport.call_count(), 0);
}
