//! Error types
//!
//! Template errors are local and caused by bad caller input. Everything that
//! happens on the wire surfaces as a [`DlpError`].

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the path template engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder declared by the template has no binding.
    #[error("missing binding for placeholder `{0}`")]
    MissingBinding(String),

    /// A binding key is not a placeholder of the template.
    #[error("unknown binding `{0}`")]
    UnknownBinding(String),

    /// A bound value is empty or contains the segment separator.
    #[error("invalid value {value:?} for placeholder `{name}`")]
    InvalidValue { name: String, value: String },

    /// A candidate resource name does not fit the template.
    #[error("resource name {candidate:?} does not match template `{template}`")]
    Mismatch { template: String, candidate: String },

    /// The template pattern itself is malformed.
    #[error("invalid path template {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised by the client, the transport and the pager.
#[derive(Debug, Error)]
pub enum DlpError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Network or HTTP failure. `status` is `None` when no response arrived.
    #[error("transport error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The server returned a page that does not follow the list contract.
    #[error("malformed page response: {0}")]
    ServerPage(String),

    /// A single call exceeded its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// The request cannot be sent as built (e.g. a required field is empty).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DlpError {
    pub(crate) fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The library never retries on its own; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(code), ..
            } => *code == 429 || *code == 500 || *code == 502 || *code == 503 || *code == 504,
            _ => false,
        }
    }

    /// Short message suitable for showing to a user.
    /// Security: never echoes raw API error bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport {
                status: Some(code), ..
            } => match code {
                400 => "Invalid request. Check your parameters.".to_string(),
                401 => "Authentication failed. Run 'gcloud auth application-default login'."
                    .to_string(),
                403 => "Permission denied. Check your DLP IAM permissions.".to_string(),
                404 => "Resource not found.".to_string(),
                409 => "Resource conflict. The resource may already exist.".to_string(),
                429 => "Rate limit exceeded. Please try again later.".to_string(),
                500 | 502 | 503 | 504 => {
                    "DLP service temporarily unavailable. Please try again.".to_string()
                },
                _ => "Request failed. Check your network connection and try again.".to_string(),
            },
            Self::Transport { status: None, .. } => {
                "Request failed. Check your network connection and try again.".to_string()
            },
            Self::Timeout(_) => "The request timed out. Please try again.".to_string(),
            other => {
                let text = other.to_string();
                let sanitized: String = text
                    .chars()
                    .filter(|c| c.is_ascii_graphic() || *c == ' ')
                    .take(80)
                    .collect();
                if sanitized.len() < text.len() {
                    format!("{}...", sanitized)
                } else {
                    sanitized
                }
            },
        }
    }
}

pub type Result<T, E = DlpError> = std::result::Result<T, E>;
