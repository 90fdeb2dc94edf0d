use serde_json::json;
use std::time::Duration;
use stylegen::models::GenerateContentRequest;
use stylegen::{
    ContentGenerator, Controller, FailureKind, GeminiClient, GeminiConfig, GenerationOutcome,
    ImagePayload, StylegenError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/test-model:generateContent";

fn config(server: &MockServer) -> GeminiConfig {
    GeminiConfig::new()
        .with_api_base(format!("{}/v1beta", server.uri()))
        .with_model("test-model")
        .with_api_key("secret-key")
}

#[tokio::test]
async fn posts_prompt_with_key_and_modalities() {
    let server = MockServer::start().await;
    let body = json!({
        "candidates": [{
            "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "YWJj" } }] }
        }]
    });

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "secret-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "a fox" }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server)).unwrap();
    let raw = client
        .generate_content("secret-key", &GenerateContentRequest::user_prompt("a fox"))
        .await
        .unwrap();

    assert_eq!(raw, body);
    assert_eq!(client.model(), "test-model");
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server)).unwrap();
    let err = client
        .generate_content("bad", &GenerateContentRequest::user_prompt("a fox"))
        .await
        .unwrap_err();

    match err {
        StylegenError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_response_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server)).unwrap();
    let err = client
        .generate_content("secret-key", &GenerateContentRequest::user_prompt("a fox"))
        .await
        .unwrap_err();

    assert!(matches!(err, StylegenError::Response(_)));
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "A watercolor fox." },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "YWJj" } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = Controller::new(&config(&server)).unwrap();
    let outcome = controller.submit("fox", "watercolor").await;

    assert_eq!(
        outcome,
        GenerationOutcome::Succeeded {
            payload: ImagePayload::new("image/jpeg", "YWJj")
        }
    );
}

#[tokio::test]
async fn server_error_becomes_failed_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut controller = Controller::new(&config(&server)).unwrap();
    let outcome = controller.submit("fox", "watercolor").await;

    match outcome {
        GenerationOutcome::Failed { kind, message } => {
            assert_eq!(kind, FailureKind::Transport);
            assert!(message.contains("503"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn timeout_is_a_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "candidates": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = config(&server).with_timeout(Duration::from_millis(100));
    let mut controller = Controller::new(&config).unwrap();
    let outcome = controller.submit("fox", "watercolor").await;

    assert!(matches!(
        outcome,
        GenerationOutcome::Failed { kind: FailureKind::Transport, .. }
    ));
}
