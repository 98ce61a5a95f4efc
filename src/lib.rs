/// Tella Webhook - content script for forwarding Tella page data to a webhook
/// Built with Rust + WASM + Yew

pub mod browser;
pub mod category;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod error_log;
pub mod handler;
pub mod notice;
pub mod scheduler;
pub mod settings;
pub mod summary;
pub mod ui;
pub mod webhook;

use browser::chrome::{
    ChromeRuntime, FetchTransport, LocalFallbackStore, RuntimeTabMessenger, WindowSidebarInjector,
    WindowWebhookInterface,
};
use browser::listeners::GlobalListeners;
use browser::timers::BrowserScheduler;
use browser::toast::DomNoticeSurface;
use browser::{context_from_js, failure_from_js};
use category::{ErrorCategory, Severity};
use collaborators::HostRuntime;
use config::HandlerConfig;
use handler::{ErrorHandler, Recovery};
use scheduler::{RetryDecision, Scheduler};
use serde::Serialize;
use settings::{SettingsStore, WebhookSettings};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use webhook::WebhookForwarder;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportOutcome {
    id: String,
    retry: Option<RetryDecision>,
}

/// The content script's error handler and webhook plumbing, exported to JS.
#[wasm_bindgen]
pub struct TellaWebhook {
    handler: Rc<ErrorHandler>,
    settings: Rc<SettingsStore>,
    forwarder: Rc<WebhookForwarder>,
    listeners: Option<GlobalListeners>,
}

#[wasm_bindgen]
impl TellaWebhook {
    /// `config` is an optional partial `HandlerConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TellaWebhook, JsValue> {
        let config: HandlerConfig = if config.is_undefined() || config.is_null() {
            HandlerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let scheduler: Rc<dyn Scheduler> = Rc::new(BrowserScheduler::new().map_err(to_js_error)?);
        let runtime: Rc<dyn HostRuntime> = Rc::new(ChromeRuntime);

        let handler = Rc::new(
            ErrorHandler::new(config, runtime.clone(), scheduler.clone())
                .with_fallback_store(Rc::new(LocalFallbackStore))
                .with_sidebar_injector(Rc::new(WindowSidebarInjector))
                .with_webhook_interface(Rc::new(WindowWebhookInterface))
                .with_tab_messenger(Rc::new(RuntimeTabMessenger))
                .with_notice_surface(Rc::new(DomNoticeSurface::new(scheduler))),
        );

        let listeners = match GlobalListeners::install(handler.clone()) {
            Ok(listeners) => Some(listeners),
            Err(e) => {
                log::warn!("Global error listeners not installed: {}", e);
                None
            }
        };

        log::info!("Tella Webhook content script ready");
        Ok(TellaWebhook {
            settings: Rc::new(SettingsStore::new(runtime, handler.clone())),
            forwarder: Rc::new(WebhookForwarder::new(Rc::new(FetchTransport), handler.clone())),
            handler,
            listeners,
        })
    }

    /// Resolves to the id of the recorded entry.
    #[wasm_bindgen(js_name = handleError)]
    pub fn handle_error(&self, category: String, error: JsValue, context: JsValue) -> js_sys::Promise {
        let handler = self.handler.clone();
        let failure = failure_from_js(&error);
        let context = context_from_js(context);

        future_to_promise(async move {
            let id = handler.handle_error(category, failure, context).await;
            Ok(JsValue::from_str(&id))
        })
    }

    /// Resolves to `{ id, retry }`; `retry` is set once a retry signal
    /// fired and the caller should re-run the failed operation.
    #[wasm_bindgen(js_name = reportWithRetry)]
    pub fn report_with_retry(&self, category: String, error: JsValue, context: JsValue) -> js_sys::Promise {
        let handler = self.handler.clone();
        let failure = failure_from_js(&error);
        let context = context_from_js(context);

        future_to_promise(async move {
            let report = handler.report(ErrorCategory::from(category), failure, context).await;
            let retry = match report.recovery {
                Recovery::Retry(signal) => Some(signal.wait().await),
                _ => None,
            };
            to_js(&ReportOutcome {
                id: report.id,
                retry,
            })
        })
    }

    #[wasm_bindgen(js_name = showErrorMessage)]
    pub fn show_error_message(&self, title: &str, message: &str, severity: &str) {
        self.handler.show_error_message(title, message, Severity::parse(severity));
    }

    #[wasm_bindgen(js_name = checkSystemHealth)]
    pub fn check_system_health(&self) -> js_sys::Promise {
        let handler = self.handler.clone();
        future_to_promise(async move { to_js(&handler.check_system_health().await) })
    }

    #[wasm_bindgen(js_name = getErrorSummary)]
    pub fn get_error_summary(&self) -> js_sys::Promise {
        let handler = self.handler.clone();
        future_to_promise(async move { to_js(&handler.get_error_summary().await) })
    }

    #[wasm_bindgen(js_name = clearErrors)]
    pub fn clear_errors(&self) {
        self.handler.clear_errors();
    }

    #[wasm_bindgen(js_name = loadSettings)]
    pub fn load_settings(&self) -> js_sys::Promise {
        let settings = self.settings.clone();
        future_to_promise(async move { to_js(&settings.load().await) })
    }

    /// Rejects when the endpoint is not a usable http(s) URL.
    #[wasm_bindgen(js_name = saveSettings)]
    pub fn save_settings(&self, settings: JsValue) -> js_sys::Promise {
        let store = self.settings.clone();

        future_to_promise(async move {
            let settings: WebhookSettings = serde_wasm_bindgen::from_value(settings)?;
            if settings.enabled {
                settings::validate_endpoint(&settings.endpoint).map_err(to_js_error)?;
            }
            Ok(JsValue::from_bool(store.save(&settings).await))
        })
    }

    /// POST `payload` to the configured webhook; resolves to the HTTP status.
    pub fn forward(&self, payload: JsValue) -> js_sys::Promise {
        let store = self.settings.clone();
        let forwarder = self.forwarder.clone();

        future_to_promise(async move {
            let payload: serde_json::Value = serde_wasm_bindgen::from_value(payload)?;
            let mut settings = store.load().await;

            let status = forwarder
                .forward(&settings, &payload)
                .await
                .map_err(to_js_error)?;

            settings.mark_sent(chrono::Utc::now());
            store.save(&settings).await;
            Ok(JsValue::from(status))
        })
    }

    /// Remove the global listeners. The handler stays usable.
    pub fn dispose(&mut self) {
        if let Some(listeners) = self.listeners.take() {
            listeners.dispose();
        }
    }
}
