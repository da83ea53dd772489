//! Diagnostics trace.
//!
//! Every pipeline stage records what it did and why into an append-only,
//! ordered log that ships with the final result. The builder is owned by
//! the orchestrator; stages hand back entry deltas that get folded in, so
//! ordering is preserved without shared mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Info,
    Warn,
    Error,
}

/// One diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Stage that produced the entry (e.g. `"detect"`, `"pdf-text"`).
    pub stage: String,
    /// Human-readable detail.
    pub detail: String,
    /// Severity.
    pub status: TraceStatus,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

impl TraceEntry {
    /// Create an entry stamped now.
    pub fn new(stage: impl Into<String>, detail: impl Into<String>, status: TraceStatus) -> Self {
        Self {
            stage: stage.into(),
            detail: detail.into(),
            status,
            timestamp: Utc::now(),
        }
    }

    /// Info-level entry.
    pub fn info(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(stage, detail, TraceStatus::Info)
    }

    /// Warn-level entry.
    pub fn warn(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(stage, detail, TraceStatus::Warn)
    }

    /// Error-level entry.
    pub fn error(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(stage, detail, TraceStatus::Error)
    }
}

/// Append-only collector for trace entries, owned by the orchestrator.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    entries: Vec<TraceEntry>,
}

impl TraceBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an info entry.
    pub fn info(&mut self, stage: &str, detail: impl Into<String>) {
        self.entries.push(TraceEntry::info(stage, detail));
    }

    /// Append a warn entry.
    pub fn warn(&mut self, stage: &str, detail: impl Into<String>) {
        self.entries.push(TraceEntry::warn(stage, detail));
    }

    /// Append an error entry.
    pub fn error(&mut self, stage: &str, detail: impl Into<String>) {
        self.entries.push(TraceEntry::error(stage, detail));
    }

    /// Fold in a delta returned by a stage, preserving its order.
    pub fn extend(&mut self, delta: Vec<TraceEntry>) {
        self.entries.extend(delta);
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the builder, yielding the ordered log.
    pub fn finish(self) -> Vec<TraceEntry> {
        self.entries
    }
}
