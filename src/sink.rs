use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::models::Record;

/// SinkError
///
/// Failure reported by a persistence sink. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database write failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

// 1. RecordSink Contract
/// RecordSink
///
/// Optional durable-storage collaborator. The create handler hands every newly inserted
/// record to the sink; a failure is logged and does not change the response, since the
/// in-memory store remains the source of truth.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist(&self, record: &Record) -> Result<(), SinkError>;
}

/// SinkState
///
/// The concrete type used to share the sink across the application state.
pub type SinkState = Arc<dyn RecordSink>;

// 2. Postgres implementation
/// PostgresSink
///
/// Writes records into a `records (id, title, author)` table.
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSink for PostgresSink {
    async fn persist(&self, record: &Record) -> Result<(), SinkError> {
        let id = i64::try_from(record.id)
            .map_err(|_| SinkError::Unavailable(format!("id {} out of range", record.id)))?;

        sqlx::query("INSERT INTO records (id, title, author) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&record.title)
            .bind(&record.author)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// 3. No-op implementation
/// NoopSink
///
/// Used when no `DATABASE_URL` is configured.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl RecordSink for NoopSink {
    async fn persist(&self, _record: &Record) -> Result<(), SinkError> {
        Ok(())
    }
}

// 4. Recording implementation (for tests)
/// MemorySink
///
/// Keeps every persisted record so tests can assert on what the handlers sent.
/// `new_failing` simulates an unreachable backend.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub should_fail: bool,
    persisted: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn persisted(&self) -> Vec<Record> {
        match self.persisted.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn persist(&self, record: &Record) -> Result<(), SinkError> {
        if self.should_fail {
            return Err(SinkError::Unavailable("simulated failure".to_string()));
        }
        match self.persisted.lock() {
            Ok(mut guard) => guard.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record {
            id: 3,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
        }
    }

    #[tokio::test]
    async fn memory_sink_records_writes() {
        let sink = MemorySink::new();
        sink.persist(&record()).await.unwrap();
        assert_eq!(sink.persisted(), vec![record()]);
    }

    #[tokio::test]
    async fn failing_sink_reports_error() {
        let sink = MemorySink::new_failing();
        assert!(sink.persist(&record()).await.is_err());
        assert!(sink.persisted().is_empty());
    }
}
