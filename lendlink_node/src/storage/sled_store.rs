// sled-backed deep-link storage
use super::{claim_id, StoredRecord, TxStore};
use crate::builder::TransactionPayload;
use crate::error::{LinkError, LinkResult};
use async_trait::async_trait;
use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration as StdDuration;
use tracing::warn;

const KEY_PREFIX: &str = "tx:";

/// sled handle (Arc so clone is cheap) plus the link lifetime.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    ttl: Duration,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str, ttl: Duration) -> LinkResult<Self> {
        Ok(Self {
            db: open_db(path)?,
            ttl,
        })
    }

    /// Wrap an already opened database (tests use `sled::Config::temporary`).
    pub fn from_db(db: sled::Db, ttl: Duration) -> Self {
        Self {
            db: Arc::new(db),
            ttl,
        }
    }

    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }

    /// Row lookup that ignores expiry.
    fn load(&self, id: &str) -> LinkResult<Option<StoredRecord>> {
        get_json(&self.db, Self::key(id))
    }

    /// fsync off the async workers.
    async fn flush(&self) -> LinkResult<()> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || db.flush())
            .await
            .map_err(|e| LinkError::Storage(format!("flush task failed: {}", e)))??;
        Ok(())
    }
}

/// Open DB with retry/backoff (helps on transient file locks during restarts)
pub fn open_db(path: &str) -> LinkResult<Arc<sled::Db>> {
    let max_attempts = 8u32;
    let mut attempt = 0u32;
    let mut wait = 250u64;
    loop {
        match sled::open(path) {
            Ok(db) => return Ok(Arc::new(db)),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(LinkError::Storage(format!(
                        "failed to open sled DB at '{}': {} (attempts={})",
                        path, e, attempt
                    )));
                }
                warn!(
                    "open_db attempt {}/{} failed: {}, retrying in {}ms",
                    attempt, max_attempts, e, wait
                );
                sleep(StdDuration::from_millis(wait));
                wait = std::cmp::min(wait * 2, 2000);
            }
        }
    }
}

/// Put a serializable value under a key. Callers flush.
fn put_json<K: AsRef<[u8]>, V: Serialize>(db: &sled::Db, key: K, val: &V) -> LinkResult<()> {
    let bytes = serde_json::to_vec(val)?;
    db.insert(key, bytes)?;
    Ok(())
}

/// Get and deserialize a value stored under a key.
fn get_json<K: AsRef<[u8]>, T: DeserializeOwned>(db: &sled::Db, key: K) -> LinkResult<Option<T>> {
    match db.get(key)? {
        Some(ivec) => Ok(Some(serde_json::from_slice::<T>(&ivec)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl TxStore for SledStore {
    async fn put(&self, payload: TransactionPayload) -> LinkResult<String> {
        let id = claim_id(|candidate| {
            let record = StoredRecord::new(candidate.to_string(), payload.clone(), self.ttl)?;
            let bytes = serde_json::to_vec(&record)?;
            // insert-if-absent, so two writers can never share an id
            let swapped = self
                .db
                .compare_and_swap(Self::key(candidate), None as Option<&[u8]>, Some(bytes))?;
            Ok(swapped.is_ok())
        })?;
        self.flush().await?;
        Ok(id)
    }

    async fn get(&self, id: &str) -> LinkResult<Option<StoredRecord>> {
        Ok(self.load(id)?.filter(|r| !r.is_expired()))
    }

    async fn mark_confirmed(
        &self,
        id: &str,
        tx_hash: &str,
        approval_tx_hash: Option<&str>,
    ) -> LinkResult<bool> {
        let mut record = match self.load(id)? {
            Some(r) => r,
            None => return Ok(false),
        };
        record.confirm(tx_hash.to_string(), approval_tx_hash.map(str::to_string));
        put_json(&self.db, Self::key(id), &record)?;
        self.flush().await?;
        Ok(true)
    }

    async fn ping(&self) -> LinkResult<()> {
        self.db.size_on_disk()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
