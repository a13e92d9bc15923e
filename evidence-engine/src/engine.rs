//! EvidenceEngine - the upload and lifecycle entry point.
//!
//! Wires the pure core (validator, scorer, aggregator) to its collaborators:
//! the pool store, the ledger and the token registry.
//!
//! Every mutation of a pool runs under that pool's lock, so concurrent uploads
//! to one pool are serialized while different pools proceed in parallel. The
//! store write is additionally a compare-and-swap on the pool version; a
//! conflict restarts the operation from a fresh snapshot.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use evidence_core::{
    CredibilityScorer, Pool, PoolAggregator, PoolStatus, Resolution, ShardCandidate,
    ShardValidator, ValidationError,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::ledger::{ledger_from_config, LedgerClient};
use crate::store::{InMemoryPoolStore, PoolStore};
use crate::tokens::TokenRegistry;
use crate::types::{EngineError, NewPool, PoolEvent, Result, UploadReceipt};

type PoolLocks = DashMap<String, Arc<Mutex<()>>>;

/// Exclusive hold on one pool.
///
/// Dropping it releases the pool and removes the map entry once no other
/// task holds or waits on it.
struct PoolGuard<'a> {
    locks: &'a PoolLocks,
    pool_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.pool_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// The evidence engine.
pub struct EvidenceEngine {
    /// Configuration
    config: EngineConfig,
    /// Strength and status rules
    aggregator: PoolAggregator,
    /// Pool snapshots
    store: Arc<dyn PoolStore>,
    /// Network anchoring
    ledger: Arc<dyn LedgerClient>,
    /// Narrative tokens
    tokens: Arc<TokenRegistry>,
    /// Time source
    clock: Arc<dyn Clock>,
    /// One lock per pool
    locks: PoolLocks,
    /// Lifecycle notifications
    events: broadcast::Sender<PoolEvent>,
}

impl EvidenceEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create with custom configuration.
    ///
    /// Uses an in-memory store, the configured ledger strategy and the system clock.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let scorer = CredibilityScorer::with_weights(config.scoring.clone());
        let aggregator = PoolAggregator::with_policy(config.aggregation.clone(), scorer);
        let ledger = ledger_from_config(&config.ledger)?;
        let tokens = Arc::new(TokenRegistry::new(config.tokens.default_royalty_bps));
        let (events, _) = broadcast::channel(config.events.channel_capacity);

        Ok(Self {
            config,
            aggregator,
            store: Arc::new(InMemoryPoolStore::new()),
            ledger,
            tokens,
            clock: Arc::new(SystemClock),
            locks: DashMap::new(),
            events,
        })
    }

    /// Use a different pool store.
    pub fn with_store(mut self, store: Arc<dyn PoolStore>) -> Self {
        self.store = store;
        self
    }

    /// Use a different ledger client.
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Use a shared token registry.
    pub fn with_tokens(mut self, tokens: Arc<TokenRegistry>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the token registry.
    pub fn tokens(&self) -> &Arc<TokenRegistry> {
        &self.tokens
    }

    /// Subscribe to pool lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    /// Open a new pool.
    pub async fn create_pool(&self, request: NewPool) -> Result<Pool> {
        let threshold = PoolAggregator::check_threshold(
            request
                .threshold
                .unwrap_or(self.aggregator.policy().default_threshold as u32),
        )?;
        let id = request
            .id
            .unwrap_or_else(|| format!("pool-{}", uuid::Uuid::new_v4().simple()));

        let _guard = self.lock_pool(&id).await;

        if self.store.get(&id).await?.is_some() {
            return Err(crate::store::StoreError::AlreadyExists(id).into());
        }

        let mut pool = Pool::new(id, request.name, threshold, self.clock.now_ms())
            .with_description(request.description)
            .with_creator(request.creator);
        pool.company = request.company;

        let tx_id = self.ledger.anchor_pool(&pool).await?;
        self.store.insert(pool.clone()).await?;

        info!(
            pool_id = %pool.id,
            threshold = threshold,
            tx_id = %tx_id,
            "Created pool"
        );
        self.emit(PoolEvent::PoolCreated {
            pool_id: pool.id.clone(),
            threshold,
        });

        Ok(pool)
    }

    /// Validate, score and aggregate an upload, then anchor and persist it.
    pub async fn upload_shard(&self, candidate: ShardCandidate) -> Result<UploadReceipt> {
        self.require_pool(&candidate.pool_id).await?;
        let _guard = self.lock_pool(&candidate.pool_id).await;

        let mut attempt = 0;
        loop {
            match self.try_upload(&candidate).await {
                Err(e) if e.is_conflict() && attempt < self.config.store.max_conflict_retries => {
                    attempt += 1;
                    warn!(
                        pool_id = %candidate.pool_id,
                        attempt = attempt,
                        "Pool changed underneath upload, retrying"
                    );
                }
                result => return result,
            }
        }
    }

    async fn try_upload(&self, candidate: &ShardCandidate) -> Result<UploadReceipt> {
        let now = self.clock.now_ms();
        let snapshot = self.store.get(&candidate.pool_id).await?;

        let shard = ShardValidator::validate(candidate, snapshot.as_ref(), now)?;
        let mut pool =
            snapshot.ok_or_else(|| ValidationError::PoolNotFound(candidate.pool_id.clone()))?;

        let outcome = self.aggregator.add_shard(&mut pool, shard.clone(), now)?;
        debug!(
            pool_id = %pool.id,
            shard_id = %shard.id,
            strength = outcome.strength,
            "Aggregated shard"
        );

        let ledger_tx = self.ledger.anchor_shard(&shard).await?;

        let token = self.config.tokens.mint_on_upload.then(|| {
            self.tokens
                .prepare(&shard.content_hash, &pool.id, None, &shard.uploader_id)
        });
        if let Some(token) = &token {
            pool.tokens.push(token.id.clone());
        }

        let pool = self.store.save(pool).await?;

        let token_id = match token {
            Some(token) => Some(self.tokens.register(token).await),
            None => None,
        };

        let stored = pool
            .shard(&shard.id)
            .cloned()
            .unwrap_or(shard);

        self.emit(PoolEvent::ShardAdded {
            pool_id: pool.id.clone(),
            shard_id: stored.id.clone(),
            strength: pool.strength,
        });
        if outcome.auction_triggered {
            info!(
                pool_id = %pool.id,
                strength = pool.strength,
                threshold = pool.threshold_percent,
                "Pool ready for lawyer auction"
            );
            self.emit(PoolEvent::AuctionReady {
                pool_id: pool.id.clone(),
                strength: pool.strength,
                threshold: pool.threshold_percent,
            });
        }

        Ok(UploadReceipt {
            shard: stored,
            pool_strength: pool.strength,
            pool_status: pool.status,
            auction_triggered: outcome.auction_triggered,
            ledger_tx,
            token_id,
        })
    }

    /// Record the winning lawyer and move the pool from auction to filing.
    pub async fn begin_filing(&self, pool_id: &str, lawyer_id: &str) -> Result<Pool> {
        let pool = self
            .advance(pool_id, PoolStatus::Filing, |pool| {
                pool.winner = Some(lawyer_id.to_string());
            })
            .await?;

        info!(pool_id = %pool_id, lawyer_id = %lawyer_id, "Filing started");
        self.emit(PoolEvent::FilingStarted {
            pool_id: pool_id.to_string(),
            lawyer_id: lawyer_id.to_string(),
        });
        Ok(pool)
    }

    /// Record the outcome and close the pool.
    pub async fn close_pool(&self, pool_id: &str, resolution: Resolution) -> Result<Pool> {
        let pool = self
            .advance(pool_id, PoolStatus::Closed, |pool| {
                pool.resolution = Some(resolution);
            })
            .await?;

        info!(pool_id = %pool_id, resolution = ?resolution, "Pool closed");
        self.emit(PoolEvent::PoolClosed {
            pool_id: pool_id.to_string(),
            resolution,
        });
        Ok(pool)
    }

    /// Apply a forward transition under the pool lock.
    async fn advance<F>(&self, pool_id: &str, to: PoolStatus, update: F) -> Result<Pool>
    where
        F: Fn(&mut Pool),
    {
        self.require_pool(pool_id).await?;
        let _guard = self.lock_pool(pool_id).await;

        let mut attempt = 0;
        loop {
            let mut pool = self.require_pool(pool_id).await?;
            self.aggregator.transition(&mut pool, to)?;
            update(&mut pool);

            match self.store.save(pool).await.map_err(EngineError::from) {
                Err(e) if e.is_conflict() && attempt < self.config.store.max_conflict_retries => {
                    attempt += 1;
                    warn!(pool_id = %pool_id, attempt = attempt, "Pool changed underneath transition, retrying");
                }
                result => return result,
            }
        }
    }

    /// Current snapshot of a pool.
    pub async fn pool(&self, pool_id: &str) -> Result<Option<Pool>> {
        Ok(self.store.get(pool_id).await?)
    }

    /// All pools.
    pub async fn pools(&self) -> Result<Vec<Pool>> {
        Ok(self.store.list().await?)
    }

    /// Whether a pool's strength has reached its threshold.
    pub async fn auction_ready(&self, pool_id: &str) -> Result<bool> {
        let pool = self.require_pool(pool_id).await?;
        Ok(self.aggregator.is_auction_ready(&pool))
    }

    async fn require_pool(&self, pool_id: &str) -> Result<Pool> {
        self.store
            .get(pool_id)
            .await?
            .ok_or_else(|| ValidationError::PoolNotFound(pool_id.to_string()).into())
    }

    async fn lock_pool(&self, pool_id: &str) -> PoolGuard<'_> {
        let lock = Arc::clone(
            &self
                .locks
                .entry(pool_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );

        PoolGuard {
            locks: &self.locks,
            pool_id: pool_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn emit(&self, event: PoolEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}
