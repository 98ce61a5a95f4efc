/// Health and diagnostic snapshots returned to the JS side
use crate::error_log::ErrorEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time view of the content script's collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub extension_context: bool,
    pub storage_access: bool,
    pub sidebar_injected: bool,
    pub recent_errors: usize,
}

/// Diagnostic summary of the error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub total_errors: usize,
    pub categories: HashMap<String, usize>,
    pub recent_errors: Vec<ErrorEntry>,
    pub system_health: HealthSnapshot,
}
