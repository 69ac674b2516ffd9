//! Audit trail for AI requests
//!
//! Every gateway invocation produces one `AuditRecord`. Sinks may fail or
//! stall; the gateway bounds each append with a timeout and only logs the
//! outcome, so the caller's result never depends on the audit trail.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::error::AuditError;
use crate::models::OperationKind;

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: Uuid,
    pub business_id: String,
    pub kind: OperationKind,
    /// The live service answered with a valid payload
    pub success: bool,
    /// The caller received fallback output
    pub degraded: bool,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Emits each record as a structured `tracing` event
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        info!(
            target: "insight_gateway::audit",
            request_id = %record.request_id,
            business_id = %record.business_id,
            kind = record.kind.as_str(),
            success = record.success,
            degraded = record.degraded,
            latency_ms = record.latency_ms,
            "ai request audited"
        );
        Ok(())
    }
}

/// Append-only JSON-lines file
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    // Serializes appends so concurrent lines never interleave.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlAuditSink {
    /// Create the sink, creating parent directories when missing
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        Ok(Self {
            path,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps records in memory, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Rejected("memory sink lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(business_id: &str) -> AuditRecord {
        AuditRecord {
            request_id: Uuid::new_v4(),
            business_id: business_id.to_string(),
            kind: OperationKind::Payment,
            success: false,
            degraded: true,
            latency_ms: 12,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_collects() {
        let sink = MemoryAuditSink::new();
        sink.record(&sample("a")).await.unwrap();
        sink.record(&sample("b")).await.unwrap();

        let ids: Vec<String> = sink.records().into_iter().map(|r| r.business_id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_lines() {
        let dir = std::env::temp_dir().join(format!("insight-audit-{}", Uuid::new_v4()));
        let sink = JsonlAuditSink::open(dir.join("nested/audit.jsonl")).await.unwrap();

        let first = sample("biz-1");
        let second = sample("biz-2");
        sink.record(&first).await.unwrap();
        sink.record(&second).await.unwrap();

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let parsed: Vec<AuditRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, vec![first, second]);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
