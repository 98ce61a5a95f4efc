/// Forwarding page data to the configured webhook
use crate::category::ErrorCategory;
use crate::error::{BridgeError, ForwardError, WebhookError};
use crate::error_log::ErrorContext;
use crate::handler::{ErrorHandler, Recovery};
use crate::settings::WebhookSettings;
use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;

/// HTTP POST of a JSON body; resolves to the response status.
#[async_trait(?Send)]
pub trait WebhookTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<u16, BridgeError>;
}

pub struct WebhookForwarder {
    transport: Rc<dyn WebhookTransport>,
    handler: Rc<ErrorHandler>,
}

impl WebhookForwarder {
    pub fn new(transport: Rc<dyn WebhookTransport>, handler: Rc<ErrorHandler>) -> Self {
        WebhookForwarder { transport, handler }
    }

    /// POST `payload` to the configured endpoint.
    ///
    /// Failures are reported under `webhook_request`. When the handler asks
    /// for a retry (network failures), the request is re-sent after the
    /// signalled delay until it succeeds or the retries run out.
    pub async fn forward(&self, settings: &WebhookSettings, payload: &Value) -> Result<u16, ForwardError> {
        let url = settings.target()?;
        let body = serde_json::to_string(payload).map_err(|e| ForwardError::Payload(e.to_string()))?;
        let mut retry_count = 0;

        loop {
            let err = match self.send(url.as_str(), &body).await {
                Ok(status) => {
                    log::info!("Webhook accepted payload ({})", status);
                    return Ok(status);
                }
                Err(err) => err,
            };

            let mut context = ErrorContext::new();
            context.insert("url".to_string(), Value::from(url.as_str()));
            context.insert("retryCount".to_string(), Value::from(retry_count));

            let report = self
                .handler
                .report(ErrorCategory::WebhookRequest, err.clone(), context)
                .await;

            match report.recovery {
                Recovery::Retry(signal) => {
                    retry_count = signal.wait().await.retry_count;
                    log::info!("Re-sending webhook payload (retry {})", retry_count);
                }
                _ => return Err(err.into()),
            }
        }
    }

    async fn send(&self, url: &str, body: &str) -> Result<u16, WebhookError> {
        let status = self.transport.post_json(url, body).await.map_err(|e| match e {
            BridgeError::Runtime(message) => WebhookError::from_message(&message),
            other => WebhookError::Other(other.to_string()),
        })?;

        match WebhookError::from_status(status) {
            Some(err) => Err(err),
            None => Ok(status),
        }
    }
}
