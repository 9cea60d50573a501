// Registration error taxonomy
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Malformed or missing template/meta/artifact file
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Required attributes missing on a config about to be submitted
    #[error("invalid {resource} configuration ({} problem(s))", .messages.len())]
    Validation {
        resource: String,
        messages: Vec<String>,
    },

    /// Non-success response from the remote API
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("no widgets configured on dashboard {dashboard}")]
    NoWidgetsConfigured { dashboard: String },

    /// Connection-level failure before a status was received
    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistrationError {
    pub fn api(status: u16, body: &serde_json::Value) -> Self {
        let body = match body {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::Api { status, body }
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

/// A widget that could not be bound; non-fatal, the widget is dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingWarning {
    pub widget_id: String,
    pub reason: String,
}

impl BindingWarning {
    pub fn new(widget_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            widget_id: widget_id.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BindingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget {}: {}", self.widget_id, self.reason)
    }
}
