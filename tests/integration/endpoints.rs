//! Model catalogue and credits over the scripted transport.

use crate::integration::scripted::{client_with, fast_policy, ScriptedTransport, Step};
use openrouter_rust::ErrorKind;
use reqwest::Method;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

const MODELS: &str = r#"{
  "data": [
    {
      "id": "openai/gpt-4o-mini",
      "name": "OpenAI: GPT-4o-mini",
      "created": 1721260800,
      "description": "Cost-efficient small model",
      "context_length": 128000,
      "architecture": {"modality": "text+image->text"},
      "pricing": {"prompt": "0.00000015", "completion": "0.0000006", "request": "0", "image": "0.007225"},
      "top_provider": {"is_moderated": true}
    },
    {
      "id": "meta-llama/llama-3.1-8b-instruct:free",
      "name": "Meta: Llama 3.1 8B Instruct (free)",
      "context_length": 131072,
      "pricing": {"prompt": "0", "completion": "0"}
    }
  ]
}"#;

#[tokio::test]
async fn list_models_is_stable_across_calls() {
    let transport = ScriptedTransport::new(vec![Step::ok(MODELS), Step::ok(MODELS)]);
    let client = client_with(&transport, fast_policy(0));

    let first: HashSet<String> = client.list_models().await.unwrap().into_iter().map(|m| m.id).collect();
    let second: HashSet<String> = client.list_models().await.unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);

    let call = &transport.calls()[0];
    assert_eq!(call.request.method, Method::GET);
    assert_eq!(call.request.path, "/models");
    assert!(call.request.body.is_none());
}

#[tokio::test]
async fn model_pricing_is_decimal() {
    let transport = ScriptedTransport::new(vec![Step::ok(MODELS)]);
    let models = client_with(&transport, fast_policy(0)).list_models().await.unwrap();

    let mini = &models[0];
    assert_eq!(mini.context_length, Some(128000));
    assert_eq!(mini.pricing.as_ref().unwrap().prompt, Decimal::from_str("0.00000015").unwrap());
    assert_eq!(mini.pricing.as_ref().unwrap().image, Some(Decimal::from_str("0.007225").unwrap()));
    assert!(!mini.is_free());
    assert!(models[1].is_free());
}

#[tokio::test]
async fn balance_is_credits_minus_usage() {
    let transport = ScriptedTransport::new(vec![Step::ok(
        r#"{"data": {"total_credits": 25.5, "total_usage": 3.75}}"#,
    )]);
    let (balance, stats) = client_with(&transport, fast_policy(0))
        .get_balance_with_stats()
        .await
        .unwrap();
    assert_eq!(balance.total_credits, Decimal::from_str("25.5").unwrap());
    assert_eq!(balance.usage, Decimal::from_str("3.75").unwrap());
    assert_eq!(balance.balance, Decimal::from_str("21.75").unwrap());
    assert_eq!(stats.endpoint, "/credits");
    assert_eq!(stats.http_status, 200);
}

#[tokio::test]
async fn missing_credits_field_is_validation_error() {
    let transport = ScriptedTransport::new(vec![Step::ok(r#"{"data": {"total_credits": 1}}"#)]);
    let err = client_with(&transport, fast_policy(3)).get_balance().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.context().field_path.as_deref(), Some("credits.total_usage"));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn entry_without_pricing_does_not_fail_listing() {
    let body = r#"{"data": [
        {"id": "openrouter/auto", "name": "Auto Router", "context_length": 2000000},
        {"id": "openai/gpt-4o-mini", "name": "GPT-4o-mini", "pricing": {"prompt": "0.00000015", "completion": "0.0000006"}}
    ]}"#;
    let transport = ScriptedTransport::new(vec![Step::ok(body)]);
    let models = client_with(&transport, fast_policy(0)).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert!(models[0].pricing.is_none());
    assert!(!models[0].is_free());
    assert!(models[1].pricing.is_some());
}
