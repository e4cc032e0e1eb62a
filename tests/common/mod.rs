//! Shared test utilities and fixtures
//!
//! Mock chat-completions servers and clients wired to them.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use triad_core::SessionController;
use triad_providers::ChatCompletionsClient;
use triad_providers::retry::RetryConfig;
use triad_types::{ApiKey, AzureEndpoint, Endpoint, GenerationProfile, OpenAiEndpoint, Provider};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEPLOYMENT: &str = "gpt4o";
pub const API_VERSION: &str = "2024-06-01";
pub const API_KEY: &str = "test-key";

pub const AZURE_PATH: &str = "/openai/deployments/gpt4o/chat/completions";

pub const METHODS_REPLY: &str = "1. MethodA: Hash set\nKeep seen rows in a set.\n\
2. MethodB: Sort and merge\nSort externally, drop neighbours.\n\
3. MethodC: Database constraint\nLet a unique index reject repeats.";

pub fn azure_endpoint(server: &MockServer) -> Endpoint {
    Endpoint::Azure(AzureEndpoint {
        endpoint: server.uri(),
        deployment: DEPLOYMENT.to_string(),
        api_version: API_VERSION.to_string(),
        api_key: ApiKey::new(API_KEY),
    })
}

pub fn openai_endpoint(server: &MockServer) -> Endpoint {
    Endpoint::OpenAI(OpenAiEndpoint {
        base_url: format!("{}/v1", server.uri()),
        model: "gpt-4o-mini".to_string(),
        api_key: ApiKey::new(API_KEY),
    })
}

/// No retries, so error tests see exactly one request.
pub fn client(endpoint: Endpoint) -> ChatCompletionsClient {
    let retry = RetryConfig {
        max_retries: 0,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        jitter_factor: 0.0,
    };
    ChatCompletionsClient::with_http_client(endpoint, reqwest::Client::new(), retry)
}

pub fn controller(server: &MockServer) -> SessionController<ChatCompletionsClient> {
    let endpoint = azure_endpoint(server);
    SessionController::new(client(endpoint), GenerationProfile::default())
        .with_provider(Provider::Azure)
}

pub fn completion(content: &str) -> Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": DEPLOYMENT,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

/// Mount one reply that is served once, in mount order.
pub async fn mount_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path(AZURE_PATH))
        .and(query_param("api-version", API_VERSION))
        .and(header("api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

pub async fn mount_error(server: &MockServer, status: u16, message: &str) {
    let body = serde_json::json!({
        "error": { "code": status.to_string(), "message": message }
    });
    Mock::given(method("POST"))
        .and(path(AZURE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// JSON bodies of every request the server received, oldest first.
pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json::<Value>().expect("request body is JSON"))
        .collect()
}

/// `(role, content)` pairs of one request body.
pub fn messages(body: &Value) -> Vec<(String, String)> {
    body["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .map(|m| {
            (
                m["role"].as_str().unwrap_or_default().to_string(),
                m["content"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}
