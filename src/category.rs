/// Error categories and notice severity
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category an error is reported under.
///
/// Recovery dispatch only recognises the named variants; any other string
/// is kept verbatim in `Other` and recorded without recovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCategory {
    UnhandledPromise,
    GlobalError,
    ExtensionContext,
    SidebarInjection,
    WebhookRequest,
    StorageAccess,
    ContentScript,
    NetworkError,
    Other(String),
}

impl ErrorCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCategory::UnhandledPromise => "unhandled_promise",
            ErrorCategory::GlobalError => "global_error",
            ErrorCategory::ExtensionContext => "extension_context",
            ErrorCategory::SidebarInjection => "sidebar_injection",
            ErrorCategory::WebhookRequest => "webhook_request",
            ErrorCategory::StorageAccess => "storage_access",
            ErrorCategory::ContentScript => "content_script",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::Other(name) => name,
        }
    }

    pub fn parse(name: &str) -> ErrorCategory {
        match name {
            "unhandled_promise" => ErrorCategory::UnhandledPromise,
            "global_error" => ErrorCategory::GlobalError,
            "extension_context" => ErrorCategory::ExtensionContext,
            "sidebar_injection" => ErrorCategory::SidebarInjection,
            "webhook_request" => ErrorCategory::WebhookRequest,
            "storage_access" => ErrorCategory::StorageAccess,
            "content_script" => ErrorCategory::ContentScript,
            "network_error" => ErrorCategory::NetworkError,
            other => ErrorCategory::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCategory {
    fn from(name: &str) -> Self {
        ErrorCategory::parse(name)
    }
}

impl From<String> for ErrorCategory {
    fn from(name: String) -> Self {
        ErrorCategory::parse(&name)
    }
}

impl From<ErrorCategory> for String {
    fn from(category: ErrorCategory) -> Self {
        category.as_str().to_string()
    }
}

/// How loud a user notice is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    #[default]
    Error,
}

impl Severity {
    /// Anything that is not "warning" is shown as an error.
    pub fn parse(name: &str) -> Severity {
        if name.eq_ignore_ascii_case("warning") {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}
