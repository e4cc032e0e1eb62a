//! Session error taxonomy and user-facing error text.

use std::fmt::Write;

use thiserror::Error;
use triad_providers::ChatError;
use triad_types::{Provider, truncate_with_ellipsis};

/// An action was attempted without the input it needs. Nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter the problem you want to solve first.")]
    EmptyProblem,
    #[error("Generate the three methods first.")]
    NoMethods,
    #[error("Select a method first (1, 2 or 3).")]
    NoSelection,
    #[error("Type a question before sending.")]
    EmptyChatMessage,
    #[error("Fill in every field: {}.", .missing.join(", "))]
    IncompletePractice { missing: Vec<&'static str> },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] ChatError),
}

impl SessionError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// The last problem to show in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn from_error(err: &SessionError, provider: Provider) -> Self {
        let severity = if err.is_validation() {
            Severity::Warning
        } else {
            Severity::Error
        };
        Self {
            severity,
            message: format_session_error(err, provider),
        }
    }
}

/// Format a session error into a user-friendly message.
#[must_use]
pub fn format_session_error(err: &SessionError, provider: Provider) -> String {
    let upstream = match err {
        SessionError::Validation(validation) => return validation.to_string(),
        SessionError::Upstream(upstream) => upstream,
    };

    if upstream.is_auth() {
        let mut content = String::new();
        let _ = write!(
            content,
            "{} authentication failed.",
            provider.display_name()
        );
        content.push_str("\nFix: set ");
        content.push_str(provider.key_env_var());
        let config_hint = triad_config::config_path().map_or_else(
            || "~/.triad/config.toml".to_string(),
            |p| p.display().to_string(),
        );
        let _ = write!(
            content,
            " (env) or add it to {config_hint} under [{}], then restart.",
            provider.as_str()
        );
        if let ChatError::Status { status, .. } = upstream {
            let _ = write!(content, " ({status})");
        }
        return content;
    }

    match upstream {
        ChatError::Status { status, message } => {
            let detail = truncate_with_ellipsis(message, 200);
            let mut content = format!("Request failed ({status}).");
            if upstream.is_rate_limited() {
                content.push_str(" Rate limited; wait a moment and retry.");
            }
            if !detail.is_empty() {
                content.push_str(" Details: ");
                content.push_str(&detail);
            }
            content
        }
        other => format!(
            "Request failed. Details: {}",
            truncate_with_ellipsis(&other.to_string(), 200)
        ),
    }
}
