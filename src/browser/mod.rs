/// Browser implementations of the collaborator traits
pub mod chrome;
pub mod listeners;
pub mod timers;
pub mod toast;

use crate::error::{BridgeError, Failure};
use crate::error_log::ErrorContext;
use wasm_bindgen::prelude::*;

/// Best-effort text of a thrown JS value.
pub fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub(crate) fn js_error(err: JsValue) -> BridgeError {
    BridgeError::Runtime(js_error_message(&err))
}

/// Convert whatever JS threw or rejected with into a `Failure`.
pub fn failure_from_js(value: &JsValue) -> Failure {
    if value.is_falsy() {
        return Failure::Missing;
    }

    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        let stack = js_sys::Reflect::get(error, &JsValue::from_str("stack"))
            .ok()
            .and_then(|stack| stack.as_string());
        return Failure::Script {
            message: String::from(error.message()),
            stack,
        };
    }

    if let Some(text) = value.as_string() {
        return Failure::Message(text);
    }

    // Error-like objects that aren't Error instances
    let message = if value.is_object() {
        js_sys::Reflect::get(value, &JsValue::from_str("message"))
            .ok()
            .and_then(|message| message.as_string())
    } else {
        None
    };
    Failure::Message(message.unwrap_or_else(|| format!("{:?}", value)))
}

/// Decode a JS context object; anything unreadable becomes an empty context.
pub fn context_from_js(value: JsValue) -> ErrorContext {
    if value.is_undefined() || value.is_null() {
        return ErrorContext::new();
    }

    serde_wasm_bindgen::from_value(value).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable error context: {:?}", e);
        ErrorContext::new()
    })
}
