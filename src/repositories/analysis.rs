//! Analysis repository
//!
//! Records are addressed externally by `request_id`; a per-session index backs
//! history listing and eviction.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::AnalysisRecord;

/// Analysis repository trait
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Store a new record; request IDs must be unique
    async fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord>;

    /// Get record by its external request ID
    async fn get_by_request_id(&self, request_id: Uuid) -> Result<Option<AnalysisRecord>>;

    /// All records of a session, newest first
    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<AnalysisRecord>>;

    /// Remove every record owned by a session
    async fn delete_by_session(&self, session_id: Uuid) -> Result<usize>;

    /// Sessions that currently own at least one entry
    async fn session_ids(&self) -> Result<Vec<Uuid>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

#[derive(Default)]
struct AnalysisTable {
    records: HashMap<Uuid, AnalysisRecord>,
    by_session: HashMap<Uuid, Vec<Uuid>>,
}

/// In-memory analysis repository
#[derive(Default)]
pub struct MemoryAnalysisRepository {
    table: RwLock<AnalysisTable>,
}

impl MemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn AnalysisRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl AnalysisRepository for MemoryAnalysisRepository {
    async fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord> {
        let mut table = self.table.write().await;
        if table.records.contains_key(&record.request_id) {
            bail!("Analysis request id {} already exists", record.request_id);
        }
        table
            .by_session
            .entry(record.session_id)
            .or_default()
            .push(record.request_id);
        table.records.insert(record.request_id, record.clone());
        Ok(record)
    }

    async fn get_by_request_id(&self, request_id: Uuid) -> Result<Option<AnalysisRecord>> {
        Ok(self.table.read().await.records.get(&request_id).cloned())
    }

    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<AnalysisRecord>> {
        let table = self.table.read().await;
        let mut records: Vec<AnalysisRecord> = table
            .by_session
            .get(&session_id)
            .map(|ids| ids.iter().filter_map(|id| table.records.get(id).cloned()).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_by_session(&self, session_id: Uuid) -> Result<usize> {
        let mut table = self.table.write().await;
        let ids = table.by_session.remove(&session_id).unwrap_or_default();
        let mut removed = 0;
        for id in ids {
            if table.records.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn session_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.table.read().await.by_session.keys().copied().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().await.records.len())
    }
}
