//! Chat Completions API client.
//!
//! Azure OpenAI:
//! `POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={v}`
//! with an `api-key` header; the deployment selects the model.
//!
//! OpenAI-compatible:
//! `POST {base_url}/chat/completions` with `Authorization: Bearer`; the model
//! goes in the body.

use serde::{Deserialize, Serialize};

use triad_types::{ChatMessage, Endpoint};

use crate::retry::{RetryConfig, RetryOutcome, send_with_retry};
use crate::{ChatClient, ChatError, ChatRequest, ClientOptions, http_client, read_capped_error_body};

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn build_request_body<'a>(endpoint: &'a Endpoint, request: &'a ChatRequest) -> RequestBody<'a> {
    let model = match endpoint {
        Endpoint::Azure(_) => None,
        Endpoint::OpenAI(openai) => Some(openai.model.as_str()),
    };
    RequestBody {
        model,
        messages: &request.messages,
        max_tokens: request.params.max_output_tokens,
        temperature: request.params.temperature.get(),
    }
}

/// Extract the first choice's content, trimmed.
fn parse_reply(raw: &[u8]) -> Result<String, ChatError> {
    let response: CompletionResponse = serde_json::from_slice(raw)
        .map_err(|e| ChatError::MalformedResponse(format!("invalid JSON body: {e}")))?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(ChatError::MalformedResponse(
            "response contained no choices".to_string(),
        ));
    };

    let content = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(ChatError::EmptyReply {
            finish_reason: choice.finish_reason,
        });
    }
    Ok(content)
}

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    retry: RetryConfig,
}

impl ChatCompletionsClient {
    /// Client with the hardened HTTPS transport.
    pub fn new(endpoint: Endpoint, options: ClientOptions) -> Result<Self, ChatError> {
        let http = http_client(options.request_timeout)?;
        Ok(Self::with_http_client(endpoint, http, options.retry))
    }

    /// Client over a caller-supplied transport.
    #[must_use]
    pub fn with_http_client(endpoint: Endpoint, http: reqwest::Client, retry: RetryConfig) -> Self {
        Self {
            http,
            endpoint,
            retry,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request_builder(&self, url: &str, body: &RequestBody<'_>) -> reqwest::RequestBuilder {
        let builder = self.http.post(url).json(body);
        let secret = self.endpoint.api_key().expose_secret();
        match &self.endpoint {
            Endpoint::Azure(_) => builder.header("api-key", secret),
            Endpoint::OpenAI(_) => builder.bearer_auth(secret),
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = self.endpoint.chat_completions_url();
        let body = build_request_body(&self.endpoint, request);

        tracing::debug!(
            provider = self.endpoint.provider().as_str(),
            model = self.endpoint.model_label(),
            messages = request.messages.len(),
            max_tokens = request.params.max_output_tokens,
            "Sending chat completion request"
        );

        let response = match send_with_retry(|| self.request_builder(&url, &body), &self.retry).await
        {
            RetryOutcome::Success(response) => response,
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let raw = read_capped_error_body(response).await;
                return Err(ChatError::Status {
                    status,
                    message: crate::extract_error_message(&raw),
                });
            }
            RetryOutcome::ConnectionError { attempts, source } => {
                return Err(ChatError::Connection { attempts, source });
            }
            RetryOutcome::NonRetryable(source) => return Err(ChatError::Request(source)),
        };

        let raw = response.bytes().await.map_err(ChatError::Request)?;
        parse_reply(&raw)
    }
}

impl ChatClient for ChatCompletionsClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.send(request).await
    }
}
