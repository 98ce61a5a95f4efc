/// Error entries and the bounded in-memory log
use crate::category::ErrorCategory;
use crate::error::Failure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Free-form auxiliary fields supplied with a report (`retryCount`,
/// `operation`, `tabId`, ...).
pub type ErrorContext = Map<String, Value>;

/// One reported error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub id: String,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub context: ErrorContext,
    pub timestamp: DateTime<Utc>,
    // Reserved: nothing marks an entry resolved yet.
    pub resolved: bool,
}

impl ErrorEntry {
    pub fn new(
        category: ErrorCategory,
        failure: &Failure,
        context: ErrorContext,
        timestamp: DateTime<Utc>,
    ) -> ErrorEntry {
        ErrorEntry {
            id: entry_id(timestamp),
            category,
            message: failure.message(),
            stack: failure.stack(),
            context,
            timestamp,
            resolved: false,
        }
    }
}

/// Millisecond timestamp in hex plus a random tie-break.
fn entry_id(timestamp: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{:x}-{}", timestamp.timestamp_millis(), &random[..9])
}

/// Insertion-ordered log that keeps only the newest `max_errors` entries
#[derive(Debug, Clone)]
pub struct ErrorLog {
    entries: VecDeque<ErrorEntry>,
    max_errors: usize,
}

impl ErrorLog {
    pub fn new(max_errors: usize) -> Self {
        ErrorLog {
            entries: VecDeque::new(),
            max_errors,
        }
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        self.entries.push_back(entry);

        while self.entries.len() > self.max_errors {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    /// Occurrences per category name
    pub fn category_counts(&self) -> HashMap<String, usize> {
        self.entries
            .iter()
            .fold(HashMap::new(), |mut counts, entry| {
                *counts.entry(entry.category.to_string()).or_insert(0) += 1;
                counts
            })
    }

    /// Entries strictly newer than `now - window`, oldest first.
    pub fn recent(&self, now: DateTime<Utc>, window: chrono::Duration) -> Vec<ErrorEntry> {
        self.within(now, window).cloned().collect()
    }

    pub fn count_recent(&self, now: DateTime<Utc>, window: chrono::Duration) -> usize {
        self.within(now, window).count()
    }

    // A window reaching past the representable range covers every entry
    fn within(
        &self,
        now: DateTime<Utc>,
        window: chrono::Duration,
    ) -> impl Iterator<Item = &ErrorEntry> {
        let cutoff = now.checked_sub_signed(window);
        self.entries
            .iter()
            .filter(move |entry| cutoff.is_none_or(|cutoff| entry.timestamp > cutoff))
    }
}

/// `retryCount` from a context; missing or malformed counts as 0.
pub fn retry_count(context: &ErrorContext) -> u32 {
    context
        .get("retryCount")
        .and_then(Value::as_u64)
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

pub fn context_str<'a>(context: &'a ErrorContext, key: &str) -> Option<&'a str> {
    context.get(key).and_then(Value::as_str)
}

pub fn tab_id(context: &ErrorContext) -> Option<i32> {
    context
        .get("tabId")
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_at(message: &str, category: ErrorCategory, timestamp: DateTime<Utc>) -> ErrorEntry {
        ErrorEntry::new(category, &Failure::from(message), ErrorContext::new(), timestamp)
    }

    fn entry(message: &str) -> ErrorEntry {
        entry_at(message, ErrorCategory::NetworkError, Utc::now())
    }

    #[test]
    fn test_new_entry_fields() {
        let mut context = ErrorContext::new();
        context.insert("operation".to_string(), json!("read"));
        let now = Utc::now();

        let entry = ErrorEntry::new(ErrorCategory::StorageAccess, &Failure::Missing, context, now);

        assert_eq!(entry.message, "Unknown error");
        assert_eq!(entry.stack, None);
        assert_eq!(entry.timestamp, now);
        assert!(!entry.resolved);
        assert_eq!(context_str(&entry.context, "operation"), Some("read"));
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let now = Utc::now();
        let a = entry_at("a", ErrorCategory::GlobalError, now);
        let b = entry_at("b", ErrorCategory::GlobalError, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_log_keeps_most_recent_in_order() {
        let mut log = ErrorLog::new(3);
        for i in 0..7 {
            log.push(entry(&format!("error {}", i)));
            assert!(log.len() <= 3);
        }

        let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["error 4", "error 5", "error 6"]);
    }

    #[test]
    fn test_clear() {
        let mut log = ErrorLog::new(50);
        log.push(entry("a"));
        log.push(entry("b"));

        log.clear();

        assert!(log.is_empty());
        assert!(log.category_counts().is_empty());
    }

    #[test]
    fn test_category_counts_sum_to_total() {
        let mut log = ErrorLog::new(50);
        let now = Utc::now();
        log.push(entry_at("a", ErrorCategory::NetworkError, now));
        log.push(entry_at("b", ErrorCategory::NetworkError, now));
        log.push(entry_at("c", ErrorCategory::from("custom"), now));

        let counts = log.category_counts();

        assert_eq!(counts.get("network_error"), Some(&2));
        assert_eq!(counts.get("custom"), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), log.len());
    }

    #[test]
    fn test_recent_window() {
        let mut log = ErrorLog::new(50);
        let now = Utc::now();
        log.push(entry_at("old", ErrorCategory::GlobalError, now - chrono::Duration::minutes(10)));
        log.push(entry_at("new", ErrorCategory::GlobalError, now - chrono::Duration::minutes(1)));

        let recent = log.recent(now, chrono::Duration::minutes(5));

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "new");
        assert_eq!(log.count_recent(now, chrono::Duration::hours(1)), 2);
    }

    #[test]
    fn test_window_past_time_range_counts_everything() {
        let mut log = ErrorLog::new(50);
        let now = Utc::now();
        log.push(entry_at("old", ErrorCategory::GlobalError, now - chrono::Duration::days(400)));
        log.push(entry_at("new", ErrorCategory::GlobalError, now));

        let window = chrono::Duration::milliseconds(9_000_000_000_000_000);

        assert_eq!(log.count_recent(now, window), 2);
        assert_eq!(log.recent(now, window).len(), 2);
    }

    #[test]
    fn test_context_helpers() {
        let mut context = ErrorContext::new();
        assert_eq!(retry_count(&context), 0);
        assert_eq!(tab_id(&context), None);

        context.insert("retryCount".to_string(), json!(2));
        context.insert("tabId".to_string(), json!(17));
        assert_eq!(retry_count(&context), 2);
        assert_eq!(tab_id(&context), Some(17));

        context.insert("retryCount".to_string(), json!("two"));
        assert_eq!(retry_count(&context), 0);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = entry("boom");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["category"], "network_error");
        assert_eq!(json["resolved"], false);
        assert!(json.get("stack").is_none());

        let back: ErrorEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
