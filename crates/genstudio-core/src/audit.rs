//! Audit trail for credential attempts
//!
//! Every attempt made by the requester produces exactly one [`AuditEntry`].
//! Sinks are fire-and-forget: recording never fails the caller.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Error,
}

/// One recorded attempt or summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    /// Caller-supplied label for the operation
    pub context: String,
    pub description: String,
    /// Redacted credential identity, e.g. `Shared Credential #2 (...a9f3)`
    pub redacted_detail: String,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn success(
        context: impl Into<String>,
        description: impl Into<String>,
        redacted_detail: impl Into<String>,
    ) -> Self {
        Self::new(context, description, redacted_detail, AuditStatus::Success, None)
    }

    pub fn error(
        context: impl Into<String>,
        description: impl Into<String>,
        redacted_detail: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self::new(
            context,
            description,
            redacted_detail,
            AuditStatus::Error,
            Some(error_detail.into()),
        )
    }

    fn new(
        context: impl Into<String>,
        description: impl Into<String>,
        redacted_detail: impl Into<String>,
        status: AuditStatus,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            context: context.into(),
            description: description.into(),
            redacted_detail: redacted_detail.into(),
            status,
            error_detail,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == AuditStatus::Error
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        match entry.status {
            AuditStatus::Success => tracing::info!(
                context = %entry.context,
                credential = %entry.redacted_detail,
                "{}",
                entry.description
            ),
            AuditStatus::Error => tracing::warn!(
                context = %entry.context,
                credential = %entry.redacted_detail,
                error = entry.error_detail.as_deref().unwrap_or_default(),
                "{}",
                entry.description
            ),
        }
    }
}

/// Keeps entries in memory so callers can inspect the full trail.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn errors(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.is_error())
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().push(entry);
    }
}

/// Forwards every entry to each wrapped sink in order.
#[derive(Clone, Default)]
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AuditSink for FanoutAuditSink {
    fn record(&self, entry: AuditEntry) {
        for sink in &self.sinks {
            sink.record(entry.clone());
        }
    }
}
