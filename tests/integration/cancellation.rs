//! Cancellation of streams, spawned calls and backoff sleeps.

use crate::integration::scripted::{
    client_with, completion_body, delta_frame, fast_policy, ScriptedTransport, Step,
};
use futures::StreamExt;
use openrouter_rust::{CancellationToken, ChatMessage, ErrorKind};
use std::time::Duration;

#[tokio::test]
async fn cancelling_stream_after_two_chunks_ends_it() {
    let frames = [delta_frame("a"), delta_frame("b"), delta_frame("c"), delta_frame("d")];
    let refs: Vec<&str> = frames[..2].iter().map(String::as_str).collect();
    // Two chunks, then the server goes quiet with the connection open.
    let transport = ScriptedTransport::new(vec![
        Step::sse_then_hang(&refs),
        Step::sse(&frames.iter().map(String::as_str).collect::<Vec<_>>()),
    ]);
    let client = client_with(&transport, fast_policy(3));

    let mut stream = client
        .stream_completion(vec![ChatMessage::user("go")], "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().content, "a");
    assert_eq!(stream.next().await.unwrap().unwrap().content, "b");

    let handle = stream.cancel_handle();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });
    // Blocked on the silent connection until the cancel fires.
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
    canceller.await.unwrap();

    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn cancelling_one_stream_leaves_client_usable() {
    let frames = [delta_frame("a"), delta_frame("b")];
    let refs: Vec<&str> = frames.iter().map(String::as_str).collect();
    let transport = ScriptedTransport::new(vec![
        Step::sse_then_hang(&refs),
        Step::ok(completion_body("still here")),
    ]);
    let client = client_with(&transport, fast_policy(0));

    let mut stream = client
        .stream_completion(vec![ChatMessage::user("go")], "openai/gpt-4o-mini", None)
        .await
        .unwrap();
    stream.cancel_handle().cancel();
    assert!(stream.next().await.is_none());

    let text = client.simple_completion("again", None).await.unwrap();
    assert_eq!(text, "still here");
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_stops_retrying() {
    let transport = ScriptedTransport::new(vec![
        Step::status(502, "bad gateway"),
        Step::ok(completion_body("unreachable")),
    ]);
    let client = client_with(&transport, fast_policy(3).base_delay(Duration::from_secs(10)));

    let handle = client.spawn(|c| async move { c.simple_completion("Hi", None).await });
    // First attempt fails at t=0, backoff sleeps 10 s.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.call_count(), 1);
    handle.cancel();

    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.attempts(), 1);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn caller_token_cancels_in_flight_call() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let client = client_with(&transport, fast_policy(3));
    let token = CancellationToken::new();
    let bound = client.with_cancel(token.clone());

    let call = tokio::spawn(async move { bound.simple_completion("Hi", None).await });
    tokio::time::sleep(Duration::from_secs(2)).await;
    token.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_retryable());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn spawned_calls_run_independently() {
    let transport = ScriptedTransport::new(vec![
        Step::ok(completion_body("one")),
        Step::ok(completion_body("two")),
    ]);
    let client = client_with(&transport, fast_policy(0));

    let a = client.spawn(|c| async move { c.simple_completion("1", None).await });
    let b = client.spawn(|c| async move { c.simple_completion("2", None).await });
    let mut results = vec![a.await.unwrap(), b.await.unwrap()];
    results.sort();
    assert_eq!(results, vec!["one".to_string(), "two".to_string()]);
}
