/// Window-level listeners for errors nothing else caught

use super::{failure_from_js, js_error, js_error_message};
use crate::category::ErrorCategory;
use crate::error::{BridgeError, Failure};
use crate::error_log::ErrorContext;
use crate::handler::ErrorHandler;
use serde_json::Value;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ErrorEvent, PromiseRejectionEvent, Window};

/// Installed `unhandledrejection` and `error` listeners. Call `dispose`
/// when the content script shuts down.
pub struct GlobalListeners {
    window: Window,
    on_rejection: Closure<dyn FnMut(PromiseRejectionEvent)>,
    on_error: Closure<dyn FnMut(ErrorEvent)>,
}

impl GlobalListeners {
    pub fn install(handler: Rc<ErrorHandler>) -> Result<Self, BridgeError> {
        let window = web_sys::window().ok_or(BridgeError::Unavailable("window"))?;

        let rejection_handler = handler.clone();
        let on_rejection = Closure::wrap(Box::new(move |event: PromiseRejectionEvent| {
            // Keep the page's console free of the default report
            event.prevent_default();

            let failure = failure_from_js(&event.reason());
            let handler = rejection_handler.clone();
            spawn_local(async move {
                handler
                    .handle_error(ErrorCategory::UnhandledPromise, failure, ErrorContext::new())
                    .await;
            });
        }) as Box<dyn FnMut(PromiseRejectionEvent)>);

        let on_error = Closure::wrap(Box::new(move |event: ErrorEvent| {
            let error = event.error();
            let failure = if error.is_falsy() {
                Failure::from(event.message())
            } else {
                failure_from_js(&error)
            };

            let mut context = ErrorContext::new();
            let filename = event.filename();
            if !filename.is_empty() {
                context.insert("filename".to_string(), Value::from(filename));
                context.insert("lineno".to_string(), Value::from(event.lineno()));
                context.insert("colno".to_string(), Value::from(event.colno()));
            }

            let handler = handler.clone();
            spawn_local(async move {
                handler
                    .handle_error(ErrorCategory::GlobalError, failure, context)
                    .await;
            });
        }) as Box<dyn FnMut(ErrorEvent)>);

        window
            .add_event_listener_with_callback("unhandledrejection", on_rejection.as_ref().unchecked_ref())
            .map_err(js_error)?;
        window
            .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
            .map_err(js_error)?;

        log::debug!("Global error listeners installed");
        Ok(GlobalListeners {
            window,
            on_rejection,
            on_error,
        })
    }

    pub fn dispose(self) {
        let removed = [
            self.window.remove_event_listener_with_callback(
                "unhandledrejection",
                self.on_rejection.as_ref().unchecked_ref(),
            ),
            self.window
                .remove_event_listener_with_callback("error", self.on_error.as_ref().unchecked_ref()),
        ];

        for result in removed {
            if let Err(e) = result {
                log::warn!("Failed to remove listener: {}", js_error_message(&e));
            }
        }
        log::debug!("Global error listeners removed");
    }
}
