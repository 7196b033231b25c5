//! Bounded in-memory log of executed queries.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

/// Default number of entries kept when nothing is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One executed statement, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub parameters: Vec<Value>,
    pub executed_at: String,
    /// Seconds.
    pub execution_time: f64,
    /// Rows returned for queries, rows changed for everything else.
    pub rows_affected: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Fixed-capacity ring of log entries; the oldest entry is evicted first.
#[derive(Debug)]
pub struct QueryHistory {
    entries: VecDeque<QueryLogEntry>,
    capacity: usize,
}

impl QueryHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: QueryLogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<QueryLogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query: &str) -> QueryLogEntry {
        QueryLogEntry {
            query: query.to_string(),
            parameters: vec![],
            executed_at: "2024-01-01T00:00:00+00:00".to_string(),
            execution_time: 0.0,
            rows_affected: 0,
            success: true,
            error_message: None,
        }
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut history = QueryHistory::new(3);
        for i in 0..10 {
            history.push(entry(&format!("SELECT {}", i)));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = QueryHistory::new(2);
        history.push(entry("a"));
        history.push(entry("b"));
        history.push(entry("c"));
        let recent = history.recent(10);
        let queries: Vec<&str> = recent.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["c", "b"]);
    }

    #[test]
    fn test_recent_respects_limit() {
        let mut history = QueryHistory::default();
        for i in 0..5 {
            history.push(entry(&i.to_string()));
        }
        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "4");
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = QueryHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(entry("x"));
        history.push(entry("y"));
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
    }
}
