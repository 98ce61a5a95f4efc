/// User-facing notices
use crate::category::Severity;
use crate::error::BridgeError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub dismiss_after: Duration,
}

impl Notice {
    pub fn new(title: &str, message: &str, severity: Severity, dismiss_after: Duration) -> Notice {
        Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            dismiss_after,
        }
    }

    /// "title: message", the form handed to the Webhook tab.
    pub fn combined(&self) -> String {
        format!("{}: {}", self.title, self.message)
    }
}

/// Somewhere a notice can be displayed when the Webhook tab can't show it.
pub trait NoticeSurface {
    fn present(&self, notice: &Notice) -> Result<(), BridgeError>;
}

/// Surface that only writes to the log (no document available).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNoticeSurface;

impl NoticeSurface for LogNoticeSurface {
    fn present(&self, notice: &Notice) -> Result<(), BridgeError> {
        log::info!("Notice [{:?}] {}", notice.severity, notice.combined());
        Ok(())
    }
}

/// The notices raised by recovery. Titles and wording are fixed so the
/// Webhook tab can match on them.
pub mod messages {
    pub const CONTEXT_LOST: (&str, &str) = (
        "Extension Context Lost",
        "The extension was reloaded or updated. Please refresh the page to keep using Tella Webhook.",
    );
    pub const SIDEBAR_FAILED: (&str, &str) = (
        "Sidebar Integration Failed",
        "Could not add the Webhook tab to the sidebar. The extension keeps working without it.",
    );
    pub const CORS: (&str, &str) = (
        "CORS Error",
        "The webhook endpoint does not accept requests from this page. Check the endpoint's CORS settings.",
    );
    pub const NOT_FOUND: (&str, &str) = (
        "Webhook Not Found",
        "The webhook URL returned 404. Please check the endpoint address.",
    );
    pub const AUTH_FAILED: (&str, &str) = (
        "Authentication Failed",
        "The webhook endpoint rejected the request. Check your credentials or access token.",
    );
    pub const NETWORK: (&str, &str) = (
        "Network Error",
        "Unable to reach the server. Please check your connection and try again.",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_message() {
        let notice = Notice::new("Network Error", "offline", Severity::Error, Duration::from_secs(8));
        assert_eq!(notice.combined(), "Network Error: offline");
    }

    #[test]
    fn test_log_surface_accepts_everything() {
        let notice = Notice::new("t", "m", Severity::Warning, Duration::ZERO);
        assert!(LogNoticeSurface.present(&notice).is_ok());
    }
}
