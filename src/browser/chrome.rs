/// Collaborators backed by the extension APIs and page globals

use super::{js_error, js_error_message};
use crate::collaborators::{
    FallbackStore, HostRuntime, SidebarInjector, TabInfo, TabMessenger, WebhookInterface,
};
use crate::error::BridgeError;
use crate::webhook::WebhookTransport;
use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Element id of the injected Webhook tab
pub const WEBHOOK_TAB_ID: &str = "tella-webhook-tab";

// Import JS bridge functions
#[wasm_bindgen(module = "/content.js")]
extern "C" {
    fn isExtensionContextValid() -> bool;

    #[wasm_bindgen(catch)]
    async fn storageGet(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn fallbackGet(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn fallbackSet(key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    fn resetSidebarAttempts();

    fn retrySidebarInjection();

    #[wasm_bindgen(catch)]
    fn showWebhookError(message: &str) -> Result<bool, JsValue>;

    #[wasm_bindgen(catch)]
    async fn postWebhook(url: &str, body: &str) -> Result<JsValue, JsValue>;
}

/// `chrome.runtime` identity and `chrome.storage.local`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeRuntime;

#[async_trait(?Send)]
impl HostRuntime for ChromeRuntime {
    fn is_context_valid(&self) -> bool {
        isExtensionContextValid()
    }

    async fn storage_get(&self, key: &str) -> Result<Option<Value>, BridgeError> {
        let value = storageGet(key).await.map_err(js_error)?;

        if value.is_null() || value.is_undefined() {
            Ok(None)
        } else {
            serde_wasm_bindgen::from_value(value)
                .map(Some)
                .map_err(|e| BridgeError::Serialization(format!("{:?}", e)))
        }
    }

    async fn storage_set(&self, key: &str, value: Value) -> Result<(), BridgeError> {
        let value_js = serde::Serialize::serialize(
            &value,
            &serde_wasm_bindgen::Serializer::json_compatible(),
        )
        .map_err(|e| BridgeError::Serialization(format!("{:?}", e)))?;

        storageSet(key, value_js).await.map_err(js_error)
    }
}

/// `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFallbackStore;

impl FallbackStore for LocalFallbackStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, BridgeError> {
        fallbackGet(key).map(|value| value.as_string()).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        fallbackSet(key, value).map_err(js_error)
    }
}

/// `window.sidebarInjector` and the tab element it inserts
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowSidebarInjector;

impl SidebarInjector for WindowSidebarInjector {
    fn reset_attempts(&self) {
        resetSidebarAttempts();
    }

    fn retry_injection(&self) {
        retrySidebarInjection();
    }

    fn tab_attached(&self) -> bool {
        web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(WEBHOOK_TAB_ID))
            .is_some()
    }
}

/// `window.webhookInterface.showError`, when the tab UI is mounted
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowWebhookInterface;

impl WebhookInterface for WindowWebhookInterface {
    /// A throwing `showError` counts as not shown.
    fn show_error(&self, message: &str) -> bool {
        showWebhookError(message).unwrap_or_else(|e| {
            log::warn!("Webhook tab failed to show error: {}", js_error_message(&e));
            false
        })
    }
}

/// Tab lookups answered by the background script
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeTabMessenger;

#[async_trait(?Send)]
impl TabMessenger for RuntimeTabMessenger {
    async fn get_tab(&self, tab_id: i32) -> Result<TabInfo, BridgeError> {
        let tab_js = getTab(tab_id).await.map_err(|e| {
            log::debug!("Tab lookup failed: {}", js_error_message(&e));
            BridgeError::TabNotFound(tab_id)
        })?;

        serde_wasm_bindgen::from_value(tab_js)
            .map_err(|e| BridgeError::Serialization(format!("{:?}", e)))
    }
}

/// `fetch` POST with a JSON body
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

#[async_trait(?Send)]
impl WebhookTransport for FetchTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<u16, BridgeError> {
        let status = postWebhook(url, body).await.map_err(js_error)?;

        status
            .as_f64()
            .map(|status| status as u16)
            .ok_or_else(|| BridgeError::Runtime(format!("unexpected status {:?}", status)))
    }
}
