/// setTimeout-backed scheduler
use super::js_error_message;
use crate::error::BridgeError;
use crate::scheduler::{Scheduler, TimerHandle};
use futures::future::LocalBoxFuture;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Window;

#[derive(Debug, Clone)]
pub struct BrowserScheduler {
    window: Window,
}

impl BrowserScheduler {
    pub fn new() -> Result<Self, BridgeError> {
        web_sys::window()
            .map(|window| BrowserScheduler { window })
            .ok_or(BridgeError::Unavailable("window"))
    }
}

fn timeout_ms(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let callback = Closure::once_into_js(move || task());

        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout_ms(delay))
        {
            Ok(id) => {
                let window = self.window.clone();
                TimerHandle::new(move || window.clear_timeout_with_handle(id))
            }
            Err(e) => {
                log::error!("setTimeout failed: {}", js_error_message(&e));
                TimerHandle::detached()
            }
        }
    }

    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        let window = self.window.clone();
        let ms = timeout_ms(delay);

        Box::pin(async move {
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms) {
                    log::error!("setTimeout failed, not waiting: {}", js_error_message(&e));
                    let _ = resolve.call0(&JsValue::NULL);
                }
            });

            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("Sleep interrupted: {}", js_error_message(&e));
            }
        })
    }
}
