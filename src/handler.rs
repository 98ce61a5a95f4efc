/// Central error sink with categorized recovery
///
/// Every component of the content script reports failures here. The handler
/// records them in a bounded log, then runs the recovery registered for the
/// category: retries with linear backoff, a fallback store for storage
/// failures, or a notice for the user. Reporting never fails.
use crate::category::{ErrorCategory, Severity};
use crate::collaborators::{
    FallbackStore, HostRuntime, NoFallbackStore, NoSidebarInjector, NoTabMessenger,
    NoWebhookInterface, SidebarInjector, TabMessenger, WebhookInterface,
};
use crate::config::HandlerConfig;
use crate::error::{BridgeError, Failure, WebhookError};
use crate::error_log::{self, ErrorContext, ErrorEntry, ErrorLog};
use crate::notice::{messages, LogNoticeSurface, Notice, NoticeSurface};
use crate::scheduler::{RetrySignal, Scheduler, TimerHandle};
use crate::summary::{ErrorSummary, HealthSnapshot};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Outcome of the recovery step
#[derive(Debug)]
pub enum Recovery {
    /// No strategy for the category, or nothing to do.
    None,
    Notified(Notice),
    /// Sidebar injection will be retried when the timer fires.
    RetryScheduled { delay: Duration, handle: TimerHandle },
    /// The caller should await the signal and retry its operation.
    Retry(RetrySignal),
    FallbackRead(Option<Value>),
    FallbackWritten(bool),
    /// The retry target is gone; nothing was scheduled.
    Aborted,
    /// Recovery itself failed (already logged).
    Failed(String),
}

/// Result of `ErrorHandler::report`
#[derive(Debug)]
pub struct Report {
    pub id: String,
    pub recovery: Recovery,
}

pub struct ErrorHandler {
    config: HandlerConfig,
    log: RefCell<ErrorLog>,
    runtime: Rc<dyn HostRuntime>,
    scheduler: Rc<dyn Scheduler>,
    fallback: Rc<dyn FallbackStore>,
    sidebar: Rc<dyn SidebarInjector>,
    webhook_ui: Rc<dyn WebhookInterface>,
    tabs: Rc<dyn TabMessenger>,
    notices: Rc<dyn NoticeSurface>,
}

impl ErrorHandler {
    pub fn new(
        config: HandlerConfig,
        runtime: Rc<dyn HostRuntime>,
        scheduler: Rc<dyn Scheduler>,
    ) -> ErrorHandler {
        ErrorHandler {
            log: RefCell::new(ErrorLog::new(config.max_errors)),
            config,
            runtime,
            scheduler,
            fallback: Rc::new(NoFallbackStore),
            sidebar: Rc::new(NoSidebarInjector),
            webhook_ui: Rc::new(NoWebhookInterface),
            tabs: Rc::new(NoTabMessenger),
            notices: Rc::new(LogNoticeSurface),
        }
    }

    pub fn with_fallback_store(mut self, fallback: Rc<dyn FallbackStore>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_sidebar_injector(mut self, sidebar: Rc<dyn SidebarInjector>) -> Self {
        self.sidebar = sidebar;
        self
    }

    pub fn with_webhook_interface(mut self, webhook_ui: Rc<dyn WebhookInterface>) -> Self {
        self.webhook_ui = webhook_ui;
        self
    }

    pub fn with_tab_messenger(mut self, tabs: Rc<dyn TabMessenger>) -> Self {
        self.tabs = tabs;
        self
    }

    pub fn with_notice_surface(mut self, notices: Rc<dyn NoticeSurface>) -> Self {
        self.notices = notices;
        self
    }

    /// Record an error, run its recovery, and return the entry id.
    pub async fn handle_error(
        &self,
        category: impl Into<ErrorCategory>,
        failure: impl Into<Failure>,
        context: ErrorContext,
    ) -> String {
        self.report(category, failure, context).await.id
    }

    /// Like `handle_error`, but also hands back the recovery outcome.
    pub async fn report(
        &self,
        category: impl Into<ErrorCategory>,
        failure: impl Into<Failure>,
        context: ErrorContext,
    ) -> Report {
        let failure = failure.into();
        let entry = self.record(category.into(), &failure, context);
        log::error!("[{}] {}", entry.category, entry.message);

        let recovery = match self.attempt_recovery(&entry, &failure).await {
            Ok(recovery) => recovery,
            Err(err) => {
                log::error!("Recovery for {} failed: {}", entry.category, err);
                Recovery::Failed(err.to_string())
            }
        };

        Report {
            id: entry.id,
            recovery,
        }
    }

    fn record(&self, category: ErrorCategory, failure: &Failure, context: ErrorContext) -> ErrorEntry {
        let entry = ErrorEntry::new(category, failure, context, Utc::now());
        self.log.borrow_mut().push(entry.clone());
        entry
    }

    async fn attempt_recovery(
        &self,
        entry: &ErrorEntry,
        failure: &Failure,
    ) -> Result<Recovery, BridgeError> {
        let context = &entry.context;
        match &entry.category {
            ErrorCategory::ExtensionContext => Ok(self.recover_extension_context()),
            ErrorCategory::SidebarInjection => Ok(self.recover_sidebar_injection(context)),
            ErrorCategory::WebhookRequest => Ok(self.recover_webhook_request(failure, context)),
            ErrorCategory::StorageAccess => self.recover_storage_access(context),
            ErrorCategory::ContentScript => Ok(self.recover_content_script(context).await),
            ErrorCategory::NetworkError => Ok(self.recover_network_error(context)),
            other => {
                log::info!("No recovery strategy for category: {}", other);
                Ok(Recovery::None)
            }
        }
    }

    fn recover_extension_context(&self) -> Recovery {
        if self.runtime.is_context_valid() {
            return Recovery::None;
        }

        let (title, message) = messages::CONTEXT_LOST;
        Recovery::Notified(self.show_error_message(title, message, Severity::Error))
    }

    fn recover_sidebar_injection(&self, context: &ErrorContext) -> Recovery {
        let retry_count = error_log::retry_count(context);

        if retry_count >= self.config.sidebar_max_retries {
            log::warn!("Sidebar injection failed after {} retries", retry_count);
            let (title, message) = messages::SIDEBAR_FAILED;
            return Recovery::Notified(self.show_error_message(title, message, Severity::Warning));
        }

        let delay = self.config.sidebar_retry_delay(retry_count);
        log::info!(
            "Retrying sidebar injection in {}ms (attempt {})",
            delay.as_millis(),
            retry_count + 1
        );

        let sidebar = self.sidebar.clone();
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                sidebar.reset_attempts();
                sidebar.retry_injection();
            }),
        );

        Recovery::RetryScheduled { delay, handle }
    }

    fn recover_webhook_request(&self, failure: &Failure, context: &ErrorContext) -> Recovery {
        let notice = match failure.webhook_error() {
            WebhookError::NetworkFailure(_) => {
                let mut context = context.clone();
                context.insert("type".to_string(), Value::from("webhook_network"));
                return self.recover_network_error(&context);
            }
            WebhookError::CorsRejected(_) => messages::CORS,
            WebhookError::NotFound => messages::NOT_FOUND,
            WebhookError::Unauthorized { .. } => messages::AUTH_FAILED,
            err @ (WebhookError::Status { .. } | WebhookError::Other(_)) => {
                log::warn!("Webhook request failed: {}", err);
                return Recovery::None;
            }
        };

        let (title, message) = notice;
        Recovery::Notified(self.show_error_message(title, message, Severity::Error))
    }

    fn recover_storage_access(&self, context: &ErrorContext) -> Result<Recovery, BridgeError> {
        match error_log::context_str(context, "operation") {
            Some("read") => {
                let key = error_log::context_str(context, "key")
                    .ok_or(BridgeError::MissingContext("key"))?;
                let stored = self.fallback.get_item(&self.config.fallback_key(key))?;

                let value = stored.and_then(|json| match serde_json::from_str::<Value>(&json) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        log::warn!("Discarding unreadable fallback value for {}: {}", key, err);
                        None
                    }
                });
                log::info!("Read {} from fallback storage", key);
                Ok(Recovery::FallbackRead(value))
            }
            Some("write") => {
                let key = error_log::context_str(context, "key")
                    .ok_or(BridgeError::MissingContext("key"))?;
                let value = context.get("value").cloned().unwrap_or(Value::Null);
                let json = serde_json::to_string(&value)?;

                self.fallback.set_item(&self.config.fallback_key(key), &json)?;
                log::info!("Wrote {} to fallback storage", key);
                Ok(Recovery::FallbackWritten(true))
            }
            other => {
                log::error!("Storage access failed, no fallback for operation {:?}", other);
                Ok(Recovery::None)
            }
        }
    }

    async fn recover_content_script(&self, context: &ErrorContext) -> Recovery {
        if let Some(tab_id) = error_log::tab_id(context) {
            let tab = match self.tabs.get_tab(tab_id).await {
                Ok(tab) => tab,
                Err(err) => {
                    log::warn!("Not retrying content script: {}", err);
                    return Recovery::Aborted;
                }
            };

            if Some(tab.url.as_str()) != error_log::context_str(context, "expectedUrl") {
                log::warn!("Not retrying content script: tab {} navigated to {}", tab_id, tab.url);
                return Recovery::Aborted;
            }
        }

        let delay = self.config.content_script_retry_delay();
        let retry_count = error_log::retry_count(context).saturating_add(1);
        log::info!("Content script retry signalled in {}ms", delay.as_millis());
        Recovery::Retry(RetrySignal::new(&*self.scheduler, delay, retry_count))
    }

    fn recover_network_error(&self, context: &ErrorContext) -> Recovery {
        let retry_count = error_log::retry_count(context);

        if retry_count >= self.config.network_max_retries {
            let (title, message) = messages::NETWORK;
            return Recovery::Notified(self.show_error_message(title, message, Severity::Error));
        }

        let delay = self.config.network_retry_delay(retry_count);
        log::info!(
            "Network retry {} in {}ms ({})",
            retry_count + 1,
            delay.as_millis(),
            error_log::context_str(context, "type").unwrap_or("network")
        );
        Recovery::Retry(RetrySignal::new(&*self.scheduler, delay, retry_count + 1))
    }

    /// Show a notice in the Webhook tab, or as a floating notification
    /// when the tab can't display it.
    pub fn show_error_message(&self, title: &str, message: &str, severity: Severity) -> Notice {
        let notice = Notice::new(title, message, severity, self.config.notice_duration());

        if self.webhook_ui.show_error(&notice.combined()) {
            return notice;
        }

        match severity {
            Severity::Warning => log::warn!("{}", notice.combined()),
            Severity::Error => log::error!("{}", notice.combined()),
        }

        if let Err(err) = self.notices.present(&notice) {
            log::error!("Failed to show error notification: {}", err);
        }
        notice
    }

    pub async fn check_system_health(&self) -> HealthSnapshot {
        self.health_at(Utc::now()).await
    }

    async fn health_at(&self, now: DateTime<Utc>) -> HealthSnapshot {
        let storage_access = match self.runtime.storage_get("test").await {
            Ok(_) => true,
            Err(err) => {
                log::debug!("Storage check failed: {}", err);
                false
            }
        };

        HealthSnapshot {
            timestamp: now,
            extension_context: self.runtime.is_context_valid(),
            storage_access,
            sidebar_injected: self.sidebar.tab_attached(),
            recent_errors: self
                .log
                .borrow()
                .count_recent(now, self.config.health_window()),
        }
    }

    pub async fn get_error_summary(&self) -> ErrorSummary {
        self.summary_at(Utc::now()).await
    }

    async fn summary_at(&self, now: DateTime<Utc>) -> ErrorSummary {
        let system_health = self.health_at(now).await;
        let log = self.log.borrow();

        ErrorSummary {
            total_errors: log.len(),
            categories: log.category_counts(),
            recent_errors: log.recent(now, self.config.summary_window()),
            system_health,
        }
    }

    pub fn clear_errors(&self) {
        self.log.borrow_mut().clear();
        log::info!("Error log cleared");
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.log.borrow().entries().cloned().collect()
    }
}
