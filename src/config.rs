/// Error handler configuration
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix of every key written to the fallback store.
pub const FALLBACK_KEY_PREFIX: &str = "tella_webhook_";

/// Tunables of the error handler. Every field has a default, so the JS
/// side may pass a partial object (or nothing at all).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandlerConfig {
    pub max_errors: usize,
    pub sidebar_max_retries: u32,
    pub sidebar_retry_step_ms: u64,
    pub network_max_retries: u32,
    pub network_retry_step_ms: u64,
    pub content_script_retry_ms: u64,
    pub notice_duration_ms: u64,
    pub health_window_ms: i64,
    pub summary_window_ms: i64,
    pub fallback_key_prefix: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            max_errors: 50,
            sidebar_max_retries: 3,
            sidebar_retry_step_ms: 2000,
            network_max_retries: 2,
            network_retry_step_ms: 1000,
            content_script_retry_ms: 1000,
            notice_duration_ms: 8000,
            health_window_ms: 300_000,
            summary_window_ms: 3_600_000,
            fallback_key_prefix: FALLBACK_KEY_PREFIX.to_string(),
        }
    }
}

impl HandlerConfig {
    /// Linear backoff: attempt `retry_count + 1` waits that many steps.
    pub fn sidebar_retry_delay(&self, retry_count: u32) -> Duration {
        Duration::from_millis((u64::from(retry_count) + 1).saturating_mul(self.sidebar_retry_step_ms))
    }

    pub fn network_retry_delay(&self, retry_count: u32) -> Duration {
        Duration::from_millis((u64::from(retry_count) + 1).saturating_mul(self.network_retry_step_ms))
    }

    pub fn content_script_retry_delay(&self) -> Duration {
        Duration::from_millis(self.content_script_retry_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    /// Negative windows count as empty.
    pub fn health_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.health_window_ms.max(0))
    }

    pub fn summary_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.summary_window_ms.max(0))
    }

    pub fn fallback_key(&self, key: &str) -> String {
        format!("{}{}", self.fallback_key_prefix, key)
    }
}
