/// Error types shared across the content script
use thiserror::Error;

/// Failure of a collaborator call (chrome APIs, DOM, localStorage, JS bridge)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("tab {0} not found")]
    TabNotFound(i32),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("missing `{0}` in error context")]
    MissingContext(&'static str),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

/// Why a webhook POST failed, classified where the request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("{0}")]
    NetworkFailure(String),

    #[error("CORS request rejected: {0}")]
    CorsRejected(String),

    #[error("Webhook request failed: 404 Not Found")]
    NotFound,

    #[error("Webhook request failed: {status} {}", auth_reason(.status))]
    Unauthorized { status: u16 },

    #[error("Webhook request failed with status {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Other(String),
}

fn auth_reason(status: &u16) -> &'static str {
    if *status == 403 { "Forbidden" } else { "Unauthorized" }
}

impl WebhookError {
    /// Classify an HTTP status; `None` for success.
    pub fn from_status(status: u16) -> Option<WebhookError> {
        match status {
            200..=299 => None,
            404 => Some(WebhookError::NotFound),
            401 | 403 => Some(WebhookError::Unauthorized { status }),
            _ => Some(WebhookError::Status { status }),
        }
    }

    /// Classify an error that only arrived as text (a rejected `fetch`,
    /// or an error string reported from JS).
    pub fn from_message(message: &str) -> WebhookError {
        if message.contains("Failed to fetch") {
            WebhookError::NetworkFailure(message.to_string())
        } else if message.contains("CORS") {
            WebhookError::CorsRejected(message.to_string())
        } else if message.contains("404") {
            WebhookError::NotFound
        } else if message.contains("401") {
            WebhookError::Unauthorized { status: 401 }
        } else if message.contains("403") {
            WebhookError::Unauthorized { status: 403 }
        } else {
            WebhookError::Other(message.to_string())
        }
    }
}

/// Invalid webhook settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("no webhook endpoint configured")]
    MissingEndpoint,

    #[error("webhook forwarding is disabled")]
    Disabled,

    #[error("invalid webhook endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("unsupported endpoint scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),
}

/// Why a payload was not delivered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error("payload could not be encoded: {0}")]
    Payload(String),
}

/// The error value handed to the error handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Failure {
    #[default]
    Missing,
    Message(String),
    Script {
        message: String,
        stack: Option<String>,
    },
    Webhook(WebhookError),
}

impl Failure {
    pub fn message(&self) -> String {
        let message = match self {
            Failure::Missing => return "Unknown error".to_string(),
            Failure::Message(message) => message.clone(),
            Failure::Script { message, .. } => message.clone(),
            Failure::Webhook(err) => err.to_string(),
        };

        if message.is_empty() {
            "Unknown error".to_string()
        } else {
            message
        }
    }

    pub fn stack(&self) -> Option<String> {
        match self {
            Failure::Script { stack, .. } => stack.clone(),
            _ => None,
        }
    }

    /// Webhook classification of this failure, typed or sniffed from text.
    pub fn webhook_error(&self) -> WebhookError {
        match self {
            Failure::Webhook(err) => err.clone(),
            other => WebhookError::from_message(&other.message()),
        }
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Message(message.to_string())
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Message(message)
    }
}

impl From<WebhookError> for Failure {
    fn from(err: WebhookError) -> Self {
        Failure::Webhook(err)
    }
}

impl From<BridgeError> for Failure {
    fn from(err: BridgeError) -> Self {
        Failure::Message(err.to_string())
    }
}

impl From<Option<String>> for Failure {
    fn from(message: Option<String>) -> Self {
        message.map(Failure::Message).unwrap_or(Failure::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(WebhookError::from_status(200), None);
        assert_eq!(WebhookError::from_status(204), None);
        assert_eq!(WebhookError::from_status(404), Some(WebhookError::NotFound));
        assert_eq!(
            WebhookError::from_status(403),
            Some(WebhookError::Unauthorized { status: 403 })
        );
        assert_eq!(
            WebhookError::from_status(500),
            Some(WebhookError::Status { status: 500 })
        );
    }

    #[test]
    fn test_message_classification() {
        assert!(matches!(
            WebhookError::from_message("TypeError: Failed to fetch"),
            WebhookError::NetworkFailure(_)
        ));
        assert!(matches!(
            WebhookError::from_message("blocked by CORS policy"),
            WebhookError::CorsRejected(_)
        ));
        assert_eq!(
            WebhookError::from_message("Request failed: 404 Not Found"),
            WebhookError::NotFound
        );
        assert_eq!(
            WebhookError::from_message("HTTP 401"),
            WebhookError::Unauthorized { status: 401 }
        );
        assert_eq!(
            WebhookError::from_message("timeout"),
            WebhookError::Other("timeout".to_string())
        );
    }

    #[test]
    fn test_failure_message_defaults() {
        assert_eq!(Failure::Missing.message(), "Unknown error");
        assert_eq!(Failure::from("").message(), "Unknown error");
        assert_eq!(Failure::from(None::<String>).message(), "Unknown error");
        assert_eq!(Failure::from("boom").message(), "boom");
    }

    #[test]
    fn test_typed_webhook_failure_keeps_variant() {
        let failure = Failure::from(WebhookError::Unauthorized { status: 401 });
        assert_eq!(failure.webhook_error(), WebhookError::Unauthorized { status: 401 });
        assert_eq!(failure.message(), "Webhook request failed: 401 Unauthorized");
    }

    #[test]
    fn test_webhook_error_display() {
        assert_eq!(
            WebhookError::Unauthorized { status: 403 }.to_string(),
            "Webhook request failed: 403 Forbidden"
        );
        assert_eq!(
            WebhookError::from_message("TypeError: Failed to fetch").to_string(),
            "TypeError: Failed to fetch"
        );
    }

    #[test]
    fn test_stack_only_on_script_failures() {
        let failure = Failure::Script {
            message: "x is undefined".to_string(),
            stack: Some("at content.js:10".to_string()),
        };
        assert_eq!(failure.stack().as_deref(), Some("at content.js:10"));
        assert_eq!(Failure::from("plain").stack(), None);
    }
}
