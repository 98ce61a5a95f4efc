/// Floating notification shown when the Webhook tab can't display errors

use crate::browser::timers::BrowserScheduler;
use crate::category::Severity;
use crate::scheduler::{Scheduler, TimerHandle};
use std::time::Duration;
use yew::prelude::*;

/// Fade-in/fade-out transition length
pub const FADE_MS: u64 = 300;

#[derive(Properties, PartialEq)]
pub struct FloatingNoticeProps {
    pub title: String,
    pub message: String,
    #[prop_or_default]
    pub severity: Severity,
    /// How long the notice stays visible before fading out.
    pub visible_ms: u64,
}

/// Background and accent colors per severity
pub fn palette(severity: Severity) -> (&'static str, &'static str) {
    match severity {
        Severity::Warning => ("#fff3e0", "#ff9800"),
        Severity::Error => ("#ffebee", "#f44336"),
    }
}

pub fn notice_style(severity: Severity, visible: bool) -> String {
    let (bg_color, border_color) = palette(severity);
    let (opacity, offset) = if visible { (1, 0) } else { (0, -12) };

    format!(
        "position: fixed; top: 20px; right: 20px; z-index: 2147483647; max-width: 360px; \
         padding: 12px 16px; border-radius: 6px; background-color: {}; border-left: 4px solid {}; \
         box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); font-family: system-ui, sans-serif; \
         font-size: 14px; color: #333; opacity: {}; transform: translateY({}px); \
         transition: opacity {}ms ease, transform {}ms ease;",
        bg_color, border_color, opacity, offset, FADE_MS, FADE_MS
    )
}

#[function_component(FloatingNotice)]
pub fn floating_notice(props: &FloatingNoticeProps) -> Html {
    let visible = use_state(|| false);

    // Fade in right away, fade out once the visible time is up
    {
        let visible = visible.clone();
        let visible_ms = props.visible_ms;

        use_effect_with((), move |_| {
            let mut timers: Vec<TimerHandle> = Vec::new();

            match BrowserScheduler::new() {
                Ok(scheduler) => {
                    let show = visible.clone();
                    timers.push(scheduler.schedule(
                        Duration::from_millis(10),
                        Box::new(move || show.set(true)),
                    ));
                    timers.push(scheduler.schedule(
                        Duration::from_millis(visible_ms),
                        Box::new(move || visible.set(false)),
                    ));
                }
                Err(e) => log::warn!("Notice timers unavailable: {}", e),
            }

            move || timers.into_iter().for_each(TimerHandle::cancel)
        });
    }

    html! {
        <div role="alert" style={notice_style(props.severity, *visible)}>
            <strong>{&props.title}</strong>
            <p style="margin: 4px 0 0 0; line-height: 1.4;">{&props.message}</p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_by_severity() {
        assert_eq!(palette(Severity::Warning), ("#fff3e0", "#ff9800"));
        assert_eq!(palette(Severity::Error), ("#ffebee", "#f44336"));
    }

    #[test]
    fn test_style_reflects_visibility() {
        let hidden = notice_style(Severity::Error, false);
        let shown = notice_style(Severity::Error, true);

        assert!(hidden.contains("opacity: 0;"));
        assert!(shown.contains("opacity: 1;"));
        assert!(shown.contains("position: fixed;"));
        assert!(shown.contains("#f44336"));
    }
}
