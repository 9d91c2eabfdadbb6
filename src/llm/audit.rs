//! Audit log - keeps the most recent generated-and-executed queries
//!
//! In-memory only; a restart starts clean. Never consulted during
//! generation, so it is a trail, not a cache.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One successful run: what was asked, what ran, what came back
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID
    pub id: String,

    /// Original natural-language prompt
    pub prompt: String,

    /// Validated SQL that was executed
    pub sql: String,

    /// Rows returned
    pub row_count: usize,

    /// Wall-clock duration of the whole run (milliseconds)
    pub duration_ms: u64,

    /// Unix timestamp (seconds)
    pub timestamp: u64,
}

/// Bounded in-memory audit log
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    max_entries: usize,
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    /// Record a completed run, returning the entry id
    pub fn record(
        &self,
        prompt: impl Into<String>,
        sql: impl Into<String>,
        row_count: usize,
        duration_ms: u64,
    ) -> String {
        let entry_id = uuid::Uuid::new_v4().to_string();

        let entry = AuditEntry {
            id: entry_id.clone(),
            prompt: prompt.into(),
            sql: sql.into(),
            row_count,
            duration_ms,
            timestamp: Self::now_timestamp(),
        };

        let mut entries = self.entries.write().unwrap();
        entries.push(entry);

        // Evict oldest at capacity
        if entries.len() > self.max_entries {
            entries.remove(0);
        }

        entry_id
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().unwrap().clone()
    }

    fn now_timestamp() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(100)
    }
}
