//! Simulated ledger for development and testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use evidence_core::{Pool, Shard};

use super::traits::*;

/// A message accepted by the simulated ledger.
#[derive(Debug, Clone)]
pub struct AnchoredEntry {
    pub tx_id: String,
    pub message: LedgerMessage,
}

/// In-memory ledger.
///
/// Accepts every message after an optional delay and hands out `DAG_` ids.
pub struct SimulatedLedger {
    latency: Duration,
    available: AtomicBool,
    entries: Arc<RwLock<Vec<AnchoredEntry>>>,
}

impl SimulatedLedger {
    /// Create a ledger with no latency.
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Create a ledger that waits `latency` per submission.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            available: AtomicBool::new(true),
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Toggle availability at runtime.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Everything anchored so far, in submission order.
    pub async fn entries(&self) -> Vec<AnchoredEntry> {
        let entries = self.entries.read().await;
        entries.clone()
    }

    /// Number of anchored messages.
    pub async fn anchored_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    async fn submit(&self, message: LedgerMessage) -> Result<String, LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("Simulated ledger disabled".to_string()));
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let tx_id = format!("DAG_{}", uuid::Uuid::new_v4().simple());
        debug!(tx_id = %tx_id, pool_id = %message.pool_id(), "Simulated ledger submission");

        let mut entries = self.entries.write().await;
        entries.push(AnchoredEntry {
            tx_id: tx_id.clone(),
            message,
        });

        Ok(tx_id)
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Simulated
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn anchor_pool(&self, pool: &Pool) -> Result<String, LedgerError> {
        self.submit(LedgerMessage::create_pool(pool)).await
    }

    async fn anchor_shard(&self, shard: &Shard) -> Result<String, LedgerError> {
        self.submit(LedgerMessage::add_shard(shard)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_anchoring() {
        let ledger = SimulatedLedger::new();
        let pool = Pool::new("pool-1", "Acme", 75, 0);

        assert!(ledger.is_available().await);
        assert_eq!(ledger.mode(), LedgerMode::Simulated);

        let tx = ledger.anchor_pool(&pool).await.unwrap();
        assert!(tx.starts_with("DAG_"));

        let entries = ledger.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tx_id, tx);
        assert_eq!(entries[0].message.pool_id(), "pool-1");
    }

    #[tokio::test]
    async fn test_simulated_unavailable() {
        let ledger = SimulatedLedger::new().with_available(false);
        let pool = Pool::new("pool-1", "Acme", 75, 0);

        assert!(!ledger.is_available().await);
        let err = ledger.anchor_pool(&pool).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));
        assert_eq!(ledger.anchored_count().await, 0);

        ledger.set_available(true);
        assert!(ledger.anchor_pool(&pool).await.is_ok());
    }

    #[tokio::test]
    async fn test_simulated_latency() {
        let ledger = SimulatedLedger::with_latency(Duration::from_millis(20));
        let pool = Pool::new("pool-1", "Acme", 75, 0);

        let started = tokio::time::Instant::now();
        ledger.anchor_pool(&pool).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
