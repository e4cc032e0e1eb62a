//! Config file plus environment resolve to a working client.

use std::collections::HashMap;
use std::io::Write;

use tempfile::NamedTempFile;
use triad_config::{ConfigError, TriadConfig, resolve};
use triad_core::SessionController;
use triad_providers::retry::RetryConfig;
use triad_providers::{ChatClient, ChatCompletionsClient, ChatRequest};
use triad_types::{ChatMessage, Endpoint, GenerationParams, Provider, Temperature};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::completion;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[tokio::test]
async fn openai_config_reaches_the_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-from-env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  pong  ")))
        .expect(1)
        .mount(&server)
        .await;

    let file = write_config(
        "[app]\nprovider = \"openai\"\n\n\
         [openai]\napi_key = \"${TEST_OPENAI_KEY}\"\nbase_url = \"https://proxy.example.com/v1\"\nmodel = \"gpt-4o-mini\"\n\n\
         [generation.chat]\nmax_tokens = 64\ntemperature = 0.2\n",
    );
    let config = TriadConfig::load_from(file.path().to_path_buf()).unwrap();
    let resolved = resolve(Some(&config), &lookup(&[("TEST_OPENAI_KEY", "sk-from-env")])).unwrap();

    assert_eq!(resolved.endpoint.provider(), Provider::OpenAI);
    assert_eq!(resolved.generation.chat.max_output_tokens, 64);
    assert!((resolved.generation.chat.temperature.get() - 0.2).abs() < f32::EPSILON);

    // The mock server is plain http; point the resolved endpoint at it.
    let Endpoint::OpenAI(mut openai) = resolved.endpoint.clone() else {
        panic!("expected OpenAI");
    };
    assert_eq!(openai.base_url, "https://proxy.example.com/v1");
    openai.base_url = format!("{}/v1", server.uri());

    let client = ChatCompletionsClient::with_http_client(
        Endpoint::OpenAI(openai),
        reqwest::Client::new(),
        RetryConfig::default().with_max_retries(0),
    );
    let request = ChatRequest::new(
        vec![ChatMessage::user("ping")],
        GenerationParams::new(16, Temperature::from_const(0.0)),
    );
    assert_eq!(client.complete(&request).await.unwrap(), "pong");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = received[0].body_json().unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
}

#[test]
fn plain_http_base_url_is_a_config_error() {
    let file = write_config(
        "[app]\nprovider = \"openai\"\n\n[openai]\napi_key = \"sk-1\"\nbase_url = \"http://127.0.0.1:9/v1\"\n",
    );
    let config = TriadConfig::load_from(file.path().to_path_buf()).unwrap();
    let err = resolve(Some(&config), &lookup(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::InsecureUrl { var: "OPENAI_BASE_URL", .. }));
}

#[test]
fn environment_overrides_the_file() {
    let file = write_config(
        "[azure]\nendpoint = \"https://file.openai.azure.com\"\ndeployment = \"from-file\"\n\
         api_key = \"file-key\"\napi_version = \"2024-06-01\"\n",
    );
    let config = TriadConfig::load_from(file.path().to_path_buf()).unwrap();
    let resolved = resolve(
        Some(&config),
        &lookup(&[("AZURE_OPENAI_DEPLOYMENT", "from-env")]),
    )
    .unwrap();

    match resolved.endpoint {
        Endpoint::Azure(azure) => {
            assert_eq!(azure.deployment, "from-env");
            assert_eq!(azure.endpoint, "https://file.openai.azure.com");
            assert_eq!(azure.api_key.expose_secret(), "file-key");
        }
        Endpoint::OpenAI(_) => panic!("expected Azure"),
    }
}

#[test]
fn missing_settings_are_reported_together() {
    let err = resolve(None, &lookup(&[])).unwrap_err();
    match err {
        ConfigError::Missing { vars } => assert_eq!(vars.len(), 4),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_file_names_the_path() {
    let file = write_config("[app\nprovider = ");
    let err = TriadConfig::load_from(file.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn generation_profile_feeds_the_controller() {
    let file = write_config("[generation.methods]\nmax_tokens = 321\n");
    let config = TriadConfig::load_from(file.path().to_path_buf()).unwrap();
    let resolved = resolve(
        Some(&config),
        &lookup(&[("TRIAD_PROVIDER", "openai"), ("OPENAI_API_KEY", "k")]),
    )
    .unwrap();
    assert_eq!(resolved.generation.methods.max_output_tokens, 321);
    assert_eq!(resolved.generation.followup.max_output_tokens, 2000);

    let client = ChatCompletionsClient::with_http_client(
        resolved.endpoint.clone(),
        reqwest::Client::new(),
        RetryConfig::default(),
    );
    let session = SessionController::new(client, resolved.generation)
        .with_provider(resolved.endpoint.provider());
    assert_eq!(session.client().endpoint().model_label(), "gpt-4o-mini");
}
