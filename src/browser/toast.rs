/// Floating notices rendered straight into the host page

use super::js_error;
use crate::error::BridgeError;
use crate::notice::{Notice, NoticeSurface};
use crate::scheduler::Scheduler;
use crate::ui::notice::{FloatingNotice, FloatingNoticeProps, FADE_MS};
use std::rc::Rc;
use std::time::Duration;

const HOST_CLASS: &str = "tella-webhook-notice";

/// Mounts a `FloatingNotice` per notice and removes it after it faded out.
pub struct DomNoticeSurface {
    scheduler: Rc<dyn Scheduler>,
}

impl DomNoticeSurface {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        DomNoticeSurface { scheduler }
    }
}

impl NoticeSurface for DomNoticeSurface {
    fn present(&self, notice: &Notice) -> Result<(), BridgeError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(BridgeError::Unavailable("document"))?;
        let body = document.body().ok_or(BridgeError::Unavailable("document body"))?;

        let host = document.create_element("div").map_err(js_error)?;
        host.set_class_name(HOST_CLASS);
        body.append_child(&host).map_err(js_error)?;

        let visible_ms = u64::try_from(notice.dismiss_after.as_millis()).unwrap_or(u64::MAX);
        let props = FloatingNoticeProps {
            title: notice.title.clone(),
            message: notice.message.clone(),
            severity: notice.severity,
            visible_ms,
        };
        let app = yew::Renderer::<FloatingNotice>::with_root_and_props(host.clone(), props).render();

        // Dropping the handle keeps the removal scheduled
        let _ = self.scheduler.schedule(
            notice.dismiss_after + Duration::from_millis(FADE_MS),
            Box::new(move || {
                app.destroy();
                host.remove();
            }),
        );
        Ok(())
    }
}
