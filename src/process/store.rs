//! Process record stores
//!
//! Records are keyed by the *local* pid of the storing side. They are created on
//! the first valid message of an exchange and never deleted, so terminal
//! records stay readable.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::Process;
use crate::error::ProtocolError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ProtocolError {
    fn from(e: StoreError) -> Self {
        ProtocolError::Store(e.to_string())
    }
}

/// Record store capability
///
/// Implementations only need plain get/put: per-pid atomicity is enforced by
/// the executor's locks.
#[async_trait]
pub trait RecordStore<P: Process>: Send + Sync {
    async fn get(&self, pid: &str) -> Result<Option<P>, StoreError>;

    /// Insert or replace the record stored under `pid`
    async fn put(&self, pid: &str, record: P) -> Result<(), StoreError>;
}

/// In-memory store (not crash safe)
pub struct MemoryRecordStore<P> {
    records: DashMap<String, P>,
}

impl<P> MemoryRecordStore<P> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<P> Default for MemoryRecordStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Process> RecordStore<P> for MemoryRecordStore<P> {
    async fn get(&self, pid: &str) -> Result<Option<P>, StoreError> {
        Ok(self.records.get(pid).map(|r| r.value().clone()))
    }

    async fn put(&self, pid: &str, record: P) -> Result<(), StoreError> {
        self.records.insert(pid.to_string(), record);
        Ok(())
    }
}
