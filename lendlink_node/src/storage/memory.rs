// In-memory storage for development and tests
use super::{claim_id, StoredRecord, TxStore};
use crate::builder::TransactionPayload;
use crate::error::LinkResult;
use async_trait::async_trait;
use chrono::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent map keyed by link id. Nothing survives a restart.
pub struct MemoryStore {
    records: DashMap<String, StoredRecord>,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
        }
    }

    /// Number of rows, expired ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TxStore for MemoryStore {
    async fn put(&self, payload: TransactionPayload) -> LinkResult<String> {
        claim_id(|candidate| match self.records.entry(candidate.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(StoredRecord::new(candidate.to_string(), payload.clone(), self.ttl)?);
                Ok(true)
            }
        })
    }

    async fn get(&self, id: &str) -> LinkResult<Option<StoredRecord>> {
        Ok(self
            .records
            .get(id)
            .filter(|r| !r.is_expired())
            .map(|r| r.value().clone()))
    }

    async fn mark_confirmed(
        &self,
        id: &str,
        tx_hash: &str,
        approval_tx_hash: Option<&str>,
    ) -> LinkResult<bool> {
        match self.records.get_mut(id) {
            Some(mut record) => {
                record.confirm(tx_hash.to_string(), approval_tx_hash.map(str::to_string));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> LinkResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
