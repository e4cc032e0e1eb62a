//! Chat-completion client behind the [`ChatClient`] boundary.
//!
//! # Architecture
//!
//! - [`ChatClient`] - the contract the session layer consumes: an ordered list of
//!   role-tagged messages plus generation parameters in, one reply string out.
//! - [`ChatCompletionsClient`] - the HTTP implementation, speaking the Chat
//!   Completions wire format to either Azure OpenAI or an OpenAI-compatible API.
//! - [`retry`] - transport-level retry with backoff.
//!
//! # Error Handling
//!
//! Every failure is a [`ChatError`]. The client never returns a partial reply:
//! a call either yields the full trimmed content or an error.

pub mod completions;
mod error;
pub mod retry;

pub use completions::ChatCompletionsClient;
pub use error::{ChatError, extract_error_message, read_capped_error_body};
pub use reqwest::StatusCode;
pub use triad_types;

use std::future::Future;
use std::time::Duration;

use triad_types::{ChatMessage, GenerationParams};

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// One chat call: messages in order, plus generation knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

impl ChatRequest {
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>, params: GenerationParams) -> Self {
        Self { messages, params }
    }
}

/// The opaque language-model service.
///
/// Implementations resolve to the assistant's reply content, already trimmed
/// and non-empty, or to a [`ChatError`].
pub trait ChatClient: Send + Sync {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ChatError>> + Send;
}

/// Transport knobs for [`ChatCompletionsClient::new`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub request_timeout: Duration,
    pub retry: retry::RetryConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: retry::RetryConfig::default(),
        }
    }
}

/// Hardened HTTPS client: no redirects, keepalive, bounded connect and request time.
pub fn http_client(request_timeout: Duration) -> Result<reqwest::Client, ChatError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .https_only(true)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .build()
        .map_err(ChatError::Client)
}
