//! Failure contract of the chat boundary.

use reqwest::StatusCode;
use serde_json::Value;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Everything that can go wrong in one chat call.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error(
        "model returned an empty reply (finish reason: {})",
        .finish_reason.as_deref().unwrap_or("unknown")
    )]
    EmptyReply { finish_reason: Option<String> },
}

impl ChatError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ChatError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403: the credential was rejected.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Read an error body, capped so a misbehaving server cannot exhaust memory.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Pull the human-readable message out of an OpenAI/Azure error envelope.
///
/// Falls back to the trimmed raw body when it is not JSON.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(payload) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };
    payload
        .pointer("/error/message")
        .or_else(|| payload.pointer("/message"))
        .and_then(Value::as_str)
        .map_or_else(|| trimmed.to_string(), ToString::to_string)
}
