// Storage abstraction layer - sled for real deployments, in-memory map for dev/tests
use crate::builder::TransactionPayload;
use crate::error::{LinkError, LinkResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub mod memory;
pub mod sled_store;

// Re-exports
pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Default lifetime of a deep link.
pub const DEFAULT_TTL_SECS: i64 = 900;

/// Longest lifetime a link may be configured with (30 days).
pub const MAX_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Length of generated link ids.
pub const ID_LEN: usize = 8;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Persisted deep-link row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub payload: TransactionPayload,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds. Reads after this instant treat the row as absent.
    pub expires_at: i64,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub approval_tx_hash: Option<String>,
}

impl StoredRecord {
    pub fn new(id: String, payload: TransactionPayload, ttl: Duration) -> LinkResult<Self> {
        let now = Utc::now().timestamp_millis();
        let expires_at = now.checked_add(ttl.num_milliseconds()).ok_or_else(|| {
            LinkError::Storage(format!("link lifetime of {}s is out of range", ttl.num_seconds()))
        })?;
        Ok(Self {
            id,
            payload,
            created_at: now,
            expires_at,
            success: false,
            tx_hash: None,
            approval_tx_hash: None,
        })
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }

    /// Overwrites any earlier confirmation.
    pub fn confirm(&mut self, tx_hash: String, approval_tx_hash: Option<String>) {
        self.success = true;
        self.tx_hash = Some(tx_hash);
        self.approval_tx_hash = approval_tx_hash;
    }
}

/// Transient deep-link store. Implementations must be safe to share across handlers.
#[async_trait]
pub trait TxStore: Send + Sync {
    /// Persist a freshly built payload and return its link id.
    async fn put(&self, payload: TransactionPayload) -> LinkResult<String>;

    /// Fetch a live record. Expired rows read as `None` but stay on disk.
    async fn get(&self, id: &str) -> LinkResult<Option<StoredRecord>>;

    /// Record the on-chain result. Returns `false` when the id was never stored.
    async fn mark_confirmed(
        &self,
        id: &str,
        tx_hash: &str,
        approval_tx_hash: Option<&str>,
    ) -> LinkResult<bool>;

    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> LinkResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Random short id over `[a-z0-9]`.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ID_CHARSET.len());
            ID_CHARSET[idx] as char
        })
        .collect()
}

/// Ids are only ever produced by `generate_id`; anything else cannot exist.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| ID_CHARSET.contains(&b))
}

/// Draw ids until `try_claim` manages to insert under one of them.
/// The closure returns `true` once the row is written under `candidate`.
pub(crate) fn claim_id<F>(mut try_claim: F) -> LinkResult<String>
where
    F: FnMut(&str) -> LinkResult<bool>,
{
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate_id();
        if try_claim(&id)? {
            return Ok(id);
        }
    }
    Err(LinkError::Storage(
        "could not allocate a unique link id".into(),
    ))
}

/// Storage mode enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    Sled,
    Memory,
}

impl StorageMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "mem" | "inmemory" => StorageMode::Memory,
            _ => StorageMode::Sled,
        }
    }
}

/// Create storage backend based on mode
pub fn create_storage(
    mode: &StorageMode,
    sled_path: &str,
    ttl: Duration,
) -> LinkResult<Arc<dyn TxStore>> {
    match mode {
        StorageMode::Sled => {
            let store = SledStore::open(sled_path, ttl)?;
            info!("💾 Using sled storage at {}", sled_path);
            Ok(Arc::new(store))
        }
        StorageMode::Memory => {
            info!("💾 Using in-memory storage (records are lost on restart)");
            Ok(Arc::new(MemoryStore::new(ttl)))
        }
    }
}
