/// Interfaces of the components the error handler talks to
///
/// Each collaborator is injected into `ErrorHandler` at construction. The
/// browser implementations live in `crate::browser`; the `No*` types are
/// the defaults used when a capability is absent from the page.
use crate::error::BridgeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A browser tab as reported by the background script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i32,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Extension runtime: identity check and `chrome.storage.local`.
#[async_trait(?Send)]
pub trait HostRuntime {
    /// `false` once the extension has been reloaded under the page.
    fn is_context_valid(&self) -> bool;

    async fn storage_get(&self, key: &str) -> Result<Option<Value>, BridgeError>;

    async fn storage_set(&self, key: &str, value: Value) -> Result<(), BridgeError>;
}

/// Synchronous string store used when extension storage fails.
pub trait FallbackStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, BridgeError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), BridgeError>;
}

/// Store for pages where no fallback exists: reads nothing, refuses writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFallbackStore;

impl FallbackStore for NoFallbackStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, BridgeError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable("fallback store"))
    }
}

/// The component that adds the Webhook tab to the host sidebar.
pub trait SidebarInjector {
    fn reset_attempts(&self) {}

    fn retry_injection(&self) {}

    /// Whether the Webhook tab element is attached to the document.
    fn tab_attached(&self) -> bool {
        false
    }
}

/// No sidebar integration on this page.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSidebarInjector;

impl SidebarInjector for NoSidebarInjector {}

/// The Webhook tab UI, which may render errors inline.
pub trait WebhookInterface {
    /// Returns `true` when the message was shown.
    fn show_error(&self, _message: &str) -> bool {
        false
    }
}

/// No tab UI mounted; notices go to the floating surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWebhookInterface;

impl WebhookInterface for NoWebhookInterface {}

/// Tab lookups over the extension messaging channel.
#[async_trait(?Send)]
pub trait TabMessenger {
    async fn get_tab(&self, tab_id: i32) -> Result<TabInfo, BridgeError>;
}

/// Messaging unavailable: every tab is reported missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTabMessenger;

#[async_trait(?Send)]
impl TabMessenger for NoTabMessenger {
    async fn get_tab(&self, tab_id: i32) -> Result<TabInfo, BridgeError> {
        Err(BridgeError::TabNotFound(tab_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_defaults_are_inert() {
        assert_eq!(NoFallbackStore.get_item("k"), Ok(None));
        assert!(NoFallbackStore.set_item("k", "v").is_err());
        assert!(!NoSidebarInjector.tab_attached());
        assert!(!NoWebhookInterface.show_error("hello"));
        assert_eq!(
            block_on(NoTabMessenger.get_tab(4)),
            Err(BridgeError::TabNotFound(4))
        );
    }

    #[test]
    fn test_tab_info_without_title() {
        let tab: TabInfo = serde_json::from_str(r#"{"id": 3, "url": "https://www.tella.tv/video/abc"}"#).unwrap();
        assert_eq!(tab.id, 3);
        assert_eq!(tab.title, "");
    }
}
