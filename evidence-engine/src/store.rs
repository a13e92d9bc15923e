//! Pool storage.
//!
//! The engine reads pool snapshots from a [`PoolStore`] and writes them back
//! with a compare-and-swap on [`Pool::version`], so several engines may share
//! one store without losing updates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use evidence_core::Pool;

/// Error types for pool storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Pool not found
    #[error("Pool not found: {0}")]
    NotFound(String),

    /// Pool ID already taken
    #[error("Pool already exists: {0}")]
    AlreadyExists(String),

    /// Snapshot is stale
    #[error("Version conflict on pool {pool_id}: expected {expected}, found {actual}")]
    Conflict {
        pool_id: String,
        expected: u64,
        actual: u64,
    },

    /// Backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage for pool snapshots.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Get the current snapshot of a pool.
    async fn get(&self, pool_id: &str) -> Result<Option<Pool>, StoreError>;

    /// Insert a new pool.
    async fn insert(&self, pool: Pool) -> Result<(), StoreError>;

    /// Write back a modified snapshot.
    ///
    /// `pool.version` must equal the stored version; the stored copy gets
    /// `version + 1`, which is also returned.
    async fn save(&self, pool: Pool) -> Result<Pool, StoreError>;

    /// All pools.
    async fn list(&self) -> Result<Vec<Pool>, StoreError>;
}

/// In-memory pool store.
#[derive(Clone, Default)]
pub struct InMemoryPoolStore {
    pools: Arc<RwLock<HashMap<String, Pool>>>,
}

impl InMemoryPoolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pools.
    pub async fn count(&self) -> usize {
        let pools = self.pools.read().await;
        pools.len()
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn get(&self, pool_id: &str) -> Result<Option<Pool>, StoreError> {
        let pools = self.pools.read().await;
        Ok(pools.get(pool_id).cloned())
    }

    async fn insert(&self, pool: Pool) -> Result<(), StoreError> {
        let mut pools = self.pools.write().await;
        if pools.contains_key(&pool.id) {
            return Err(StoreError::AlreadyExists(pool.id));
        }
        debug!(pool_id = %pool.id, "Stored new pool");
        pools.insert(pool.id.clone(), pool);
        Ok(())
    }

    async fn save(&self, mut pool: Pool) -> Result<Pool, StoreError> {
        let mut pools = self.pools.write().await;
        let stored = pools
            .get_mut(&pool.id)
            .ok_or_else(|| StoreError::NotFound(pool.id.clone()))?;

        if stored.version != pool.version {
            return Err(StoreError::Conflict {
                pool_id: pool.id,
                expected: pool.version,
                actual: stored.version,
            });
        }

        pool.version += 1;
        *stored = pool.clone();
        Ok(pool)
    }

    async fn list(&self) -> Result<Vec<Pool>, StoreError> {
        let pools = self.pools.read().await;
        let mut all: Vec<Pool> = pools.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryPoolStore::new();
        store.insert(Pool::new("pool-1", "Acme", 75, 0)).await.unwrap();

        let pool = store.get("pool-1").await.unwrap().unwrap();
        assert_eq!(pool.name, "Acme");
        assert!(store.get("pool-2").await.unwrap().is_none());

        let err = store.insert(Pool::new("pool-1", "Again", 75, 0)).await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("pool-1".to_string()));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = InMemoryPoolStore::new();
        store.insert(Pool::new("pool-1", "Acme", 75, 0)).await.unwrap();

        let mut snapshot = store.get("pool-1").await.unwrap().unwrap();
        snapshot.description = "updated".to_string();
        let saved = store.save(snapshot).await.unwrap();
        assert_eq!(saved.version, 1);

        let current = store.get("pool-1").await.unwrap().unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.description, "updated");
    }

    #[tokio::test]
    async fn test_stale_snapshot_conflicts() {
        let store = InMemoryPoolStore::new();
        store.insert(Pool::new("pool-1", "Acme", 75, 0)).await.unwrap();

        let first = store.get("pool-1").await.unwrap().unwrap();
        let second = first.clone();

        store.save(first).await.unwrap();
        let err = store.save(second).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                pool_id: "pool-1".to_string(),
                expected: 0,
                actual: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_save_unknown_pool() {
        let store = InMemoryPoolStore::new();
        let err = store.save(Pool::new("ghost", "Ghost", 75, 0)).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("ghost".to_string()));
    }

    #[test]
    fn test_clones_share_pools() {
        let store = InMemoryPoolStore::new();
        let handle = store.clone();

        tokio_test::block_on(async {
            handle.insert(Pool::new("pool-1", "Acme", 75, 0)).await.unwrap();
            assert_eq!(store.count().await, 1);
            assert!(store.get("pool-1").await.unwrap().is_some());
        });
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let store = InMemoryPoolStore::new();
        store.insert(Pool::new("b", "B", 75, 20)).await.unwrap();
        store.insert(Pool::new("a", "A", 75, 10)).await.unwrap();

        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
