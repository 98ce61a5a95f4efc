/// Webhook settings persisted in chrome.storage.local

use crate::category::ErrorCategory;
use crate::collaborators::HostRuntime;
use crate::error::SettingsError;
use crate::error_log::ErrorContext;
use crate::handler::{ErrorHandler, Recovery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;
use url::Url;

/// Storage key of the settings object
pub const SETTINGS_KEY: &str = "webhook_settings";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookSettings {
    pub endpoint: String,
    pub enabled: bool,
    pub last_sent: Option<DateTime<Utc>>,
}

impl WebhookSettings {
    pub fn new(endpoint: &str) -> Self {
        WebhookSettings {
            endpoint: endpoint.trim().to_string(),
            enabled: true,
            last_sent: None,
        }
    }

    /// The endpoint to POST to, if forwarding is possible at all.
    pub fn target(&self) -> Result<Url, SettingsError> {
        if !self.enabled {
            return Err(SettingsError::Disabled);
        }
        validate_endpoint(&self.endpoint)
    }

    pub fn mark_sent(&mut self, at: DateTime<Utc>) {
        self.last_sent = Some(at);
    }
}

/// Accept only absolute http(s) URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, SettingsError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(SettingsError::MissingEndpoint);
    }

    let url = Url::parse(endpoint).map_err(|e| SettingsError::InvalidEndpoint(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SettingsError::UnsupportedScheme(other.to_string())),
    }
}

/// Reads and writes `WebhookSettings`, falling back through the error
/// handler when extension storage is unavailable.
pub struct SettingsStore {
    runtime: Rc<dyn HostRuntime>,
    handler: Rc<ErrorHandler>,
}

impl SettingsStore {
    pub fn new(runtime: Rc<dyn HostRuntime>, handler: Rc<ErrorHandler>) -> Self {
        SettingsStore { runtime, handler }
    }

    pub async fn load(&self) -> WebhookSettings {
        let stored = match self.runtime.storage_get(SETTINGS_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                let report = self
                    .handler
                    .report(ErrorCategory::StorageAccess, e, storage_context("read", None))
                    .await;
                match report.recovery {
                    Recovery::FallbackRead(value) => value,
                    _ => None,
                }
            }
        };

        match stored {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed webhook settings: {}", e);
                WebhookSettings::default()
            }),
            None => WebhookSettings::default(),
        }
    }

    /// Returns `false` only when neither storage nor the fallback took the write.
    pub async fn save(&self, settings: &WebhookSettings) -> bool {
        let value = match serde_json::to_value(settings) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize webhook settings: {}", e);
                return false;
            }
        };

        match self.runtime.storage_set(SETTINGS_KEY, value.clone()).await {
            Ok(()) => true,
            Err(e) => {
                let report = self
                    .handler
                    .report(ErrorCategory::StorageAccess, e, storage_context("write", Some(value)))
                    .await;
                matches!(report.recovery, Recovery::FallbackWritten(true))
            }
        }
    }
}

fn storage_context(operation: &str, value: Option<Value>) -> ErrorContext {
    let mut context = ErrorContext::new();
    context.insert("operation".to_string(), Value::from(operation));
    context.insert("key".to_string(), Value::from(SETTINGS_KEY));
    if let Some(value) = value {
        context.insert("value".to_string(), value);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FallbackStore;
    use crate::config::HandlerConfig;
    use crate::error::BridgeError;
    use crate::scheduler::testing::ManualScheduler;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeStorage {
        broken: Cell<bool>,
        items: RefCell<HashMap<String, Value>>,
    }

    #[async_trait(?Send)]
    impl HostRuntime for FakeStorage {
        fn is_context_valid(&self) -> bool {
            true
        }

        async fn storage_get(&self, key: &str) -> Result<Option<Value>, BridgeError> {
            if self.broken.get() {
                return Err(BridgeError::Runtime("Extension context invalidated".to_string()));
            }
            Ok(self.items.borrow().get(key).cloned())
        }

        async fn storage_set(&self, key: &str, value: Value) -> Result<(), BridgeError> {
            if self.broken.get() {
                return Err(BridgeError::Runtime("Extension context invalidated".to_string()));
            }
            self.items.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        items: RefCell<HashMap<String, String>>,
    }

    impl FallbackStore for MemoryStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, BridgeError> {
            Ok(self.items.borrow().get(key).cloned())
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), BridgeError> {
            self.items.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn create_store() -> (SettingsStore, Rc<FakeStorage>, Rc<ErrorHandler>) {
        let storage = Rc::new(FakeStorage::default());
        let handler = Rc::new(
            ErrorHandler::new(
                HandlerConfig::default(),
                storage.clone(),
                Rc::new(ManualScheduler::default()),
            )
            .with_fallback_store(Rc::new(MemoryStore::default())),
        );
        (SettingsStore::new(storage.clone(), handler.clone()), storage, handler)
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("http://localhost:3000/webhook").is_ok());
        assert!(validate_endpoint(" https://hooks.example.com/abc ").is_ok());
        assert_eq!(validate_endpoint(""), Err(SettingsError::MissingEndpoint));
        assert!(matches!(
            validate_endpoint("ftp://example.com"),
            Err(SettingsError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(SettingsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_disabled_settings_have_no_target() {
        let mut settings = WebhookSettings::new("http://localhost:3000");
        assert!(settings.target().is_ok());

        settings.enabled = false;
        assert_eq!(settings.target(), Err(SettingsError::Disabled));
    }

    #[test]
    fn test_load_defaults_when_empty() {
        let (store, _, handler) = create_store();

        let settings = block_on(store.load());

        assert_eq!(settings, WebhookSettings::default());
        assert!(handler.entries().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let (store, _, _) = create_store();
        let settings = WebhookSettings::new("http://localhost:3000/webhook");

        assert!(block_on(store.save(&settings)));
        let loaded = block_on(store.load());

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_broken_storage_goes_through_fallback() {
        let (store, storage, handler) = create_store();
        storage.broken.set(true);
        let settings = WebhookSettings::new("http://localhost:3000/webhook");

        assert!(block_on(store.save(&settings)));
        let loaded = block_on(store.load());

        assert_eq!(loaded, settings);
        let operations: Vec<String> = handler
            .entries()
            .iter()
            .map(|e| e.context["operation"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(operations, vec!["write", "read"]);
        assert!(handler
            .entries()
            .iter()
            .all(|e| e.category == ErrorCategory::StorageAccess));
    }

    #[test]
    fn test_malformed_settings_fall_back_to_default() {
        let (store, storage, _) = create_store();
        storage
            .items
            .borrow_mut()
            .insert(SETTINGS_KEY.to_string(), Value::from("garbage"));

        assert_eq!(block_on(store.load()), WebhookSettings::default());
    }
}
