// Gemini provider tests against a local mock server

use mindmitra::providers::{GeminiProvider, GenerationConfig, ModelGateway};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

const PATH: &str = "/v1beta/models/gemini-pro:generateContent";

fn provider(base_url: &str) -> GeminiProvider {
    GeminiProvider::with_settings(
        "test-key".to_string(),
        base_url.to_string(),
        "gemini-pro".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_generate_sends_prompt_and_config() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_query(Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"generationConfig": {"maxOutputTokens": 200}})),
            Matcher::Regex(r#""text":"How are you today\?""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Doing well"}]},
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = provider(&server.url())
        .generate("How are you today?", &GenerationConfig::CHAT)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.first_text(), Some("Doing well"));
}

#[tokio::test]
async fn test_model_name_selects_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let response = provider(&server.url())
        .with_model("gemini-1.5-flash")
        .generate("hi", &GenerationConfig::ANALYSIS)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.candidates.is_empty());
}

#[tokio::test]
async fn test_error_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = provider(&server.url())
        .generate("hi", &GenerationConfig::CHAT)
        .await
        .unwrap_err();

    // One request only, no retries
    mock.assert_async().await;
    let message = format!("{:#}", err);
    assert!(message.contains("429"));
    assert!(message.contains("Resource has been exhausted"));
}

#[tokio::test]
async fn test_long_error_body_is_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(500)
        .with_body("x".repeat(5000))
        .create_async()
        .await;

    let err = provider(&server.url())
        .generate("hi", &GenerationConfig::CHAT)
        .await
        .unwrap_err();

    assert!(err.to_string().len() < 1000);
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let result = provider(&server.url())
        .generate("hi", &GenerationConfig::CHAT)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_unreachable_service_is_an_error() {
    let result = provider("http://127.0.0.1:1")
        .generate("hi", &GenerationConfig::CHAT)
        .await;

    assert!(result.is_err());
}
