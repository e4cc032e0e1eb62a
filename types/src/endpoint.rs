//! Where chat requests go and how they authenticate.

use serde::{Deserialize, Serialize};

/// Supported chat-completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Azure,
    OpenAI,
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::OpenAI => "openai",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Azure => "Azure OpenAI",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Environment variable that carries this provider's credential.
    #[must_use]
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Azure => "AZURE_OPENAI_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Parse provider from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" | "azure-openai" | "azure_openai" => Some(Provider::Azure),
            "openai" | "gpt" => Some(Provider::OpenAI),
            _ => None,
        }
    }
}

/// A credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureEndpoint {
    /// Resource URL, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub api_key: ApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiEndpoint {
    /// Base URL up to and including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub api_key: ApiKey,
}

/// Fully resolved backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Azure(AzureEndpoint),
    OpenAI(OpenAiEndpoint),
}

impl Endpoint {
    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            Endpoint::Azure(_) => Provider::Azure,
            Endpoint::OpenAI(_) => Provider::OpenAI,
        }
    }

    /// Deployment or model name, for display and logging.
    #[must_use]
    pub fn model_label(&self) -> &str {
        match self {
            Endpoint::Azure(azure) => &azure.deployment,
            Endpoint::OpenAI(openai) => &openai.model,
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &ApiKey {
        match self {
            Endpoint::Azure(azure) => &azure.api_key,
            Endpoint::OpenAI(openai) => &openai.api_key,
        }
    }

    /// Full chat-completions URL for this endpoint.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        match self {
            Endpoint::Azure(azure) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                azure.endpoint.trim_end_matches('/'),
                azure.deployment,
                azure.api_version
            ),
            Endpoint::OpenAI(openai) => {
                format!("{}/chat/completions", openai.base_url.trim_end_matches('/'))
            }
        }
    }
}
