//! Pool strength aggregation and the pool status machine.
//!
//! Strength is count based: `min(100, shard_count * 15)`. It does not look at
//! individual credibility scores, which are tracked per shard only.
//!
//! ```text
//! active ──(strength >= threshold)──▶ auction ──(lawyer)──▶ filing ──(outcome)──▶ closed
//! ```
//!
//! Only `active → auction` fires automatically, on a shard addition. The other
//! transitions are requested by the caller through [`PoolAggregator::transition`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scorer::CredibilityScorer;
use crate::types::{Pool, PoolStatus, Shard};

/// Error types for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    /// Pool is filing or closed
    #[error("Pool {pool_id} is {status} and not accepting shards")]
    PoolNotAcceptingShards { pool_id: String, status: PoolStatus },

    /// Same content already present in the pool
    #[error("Duplicate shard {content_hash} in pool {pool_id}")]
    DuplicateShard { pool_id: String, content_hash: String },

    /// Shard belongs to another pool
    #[error("Shard for pool {shard_pool_id} cannot be added to pool {pool_id}")]
    ForeignShard { pool_id: String, shard_pool_id: String },

    /// Requested transition is not a forward step
    #[error("Pool {pool_id} cannot move from {from} to {to}")]
    InvalidTransition {
        pool_id: String,
        from: PoolStatus,
        to: PoolStatus,
    },

    /// Threshold outside 0-100
    #[error("Threshold must be in [0, 100], got {0}")]
    InvalidThreshold(u32),
}

/// Aggregation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationPolicy {
    /// Strength contributed by each shard
    pub strength_per_shard: u32,
    /// Threshold for pools created without one
    pub default_threshold: u8,
    /// Reject shards whose content hash is already in the pool
    pub reject_duplicates: bool,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            strength_per_shard: 15,
            default_threshold: 75,
            reject_duplicates: true,
        }
    }
}

/// Result of adding a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOutcome {
    pub previous_status: PoolStatus,
    pub status: PoolStatus,
    pub strength: u8,
    /// The addition moved the pool from active to auction
    pub auction_triggered: bool,
}

/// Applies shard additions and status transitions to pools.
#[derive(Debug, Clone, Default)]
pub struct PoolAggregator {
    policy: AggregationPolicy,
    scorer: CredibilityScorer,
}

impl PoolAggregator {
    /// Create with default policy and weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom policy and scorer.
    pub fn with_policy(policy: AggregationPolicy, scorer: CredibilityScorer) -> Self {
        Self { policy, scorer }
    }

    /// Get the policy in use.
    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Get the scorer in use.
    pub fn scorer(&self) -> &CredibilityScorer {
        &self.scorer
    }

    /// Check a requested threshold.
    pub fn check_threshold(threshold: u32) -> Result<u8, AggregationError> {
        u8::try_from(threshold)
            .ok()
            .filter(|t| *t <= 100)
            .ok_or(AggregationError::InvalidThreshold(threshold))
    }

    /// Strength implied by the pool's current shard set.
    pub fn recompute_strength(&self, pool: &Pool) -> u8 {
        let raw = (pool.shard_count() as u64).saturating_mul(self.policy.strength_per_shard as u64);
        raw.min(100) as u8
    }

    /// Whether the pool's strength has reached its threshold.
    pub fn is_auction_ready(&self, pool: &Pool) -> bool {
        pool.strength >= pool.threshold_percent
    }

    /// Append a shard, rescore the pool and fire `active → auction` if due.
    ///
    /// On error the pool is left untouched.
    pub fn add_shard(
        &self,
        pool: &mut Pool,
        shard: Shard,
        now_ms: i64,
    ) -> Result<AggregationOutcome, AggregationError> {
        if !pool.status.accepts_shards() {
            return Err(AggregationError::PoolNotAcceptingShards {
                pool_id: pool.id.clone(),
                status: pool.status,
            });
        }
        if shard.pool_id != pool.id {
            return Err(AggregationError::ForeignShard {
                pool_id: pool.id.clone(),
                shard_pool_id: shard.pool_id,
            });
        }
        if self.policy.reject_duplicates && pool.contains_hash(&shard.content_hash) {
            return Err(AggregationError::DuplicateShard {
                pool_id: pool.id.clone(),
                content_hash: shard.content_hash,
            });
        }

        let previous_status = pool.status;

        pool.shards.push(shard);
        self.scorer.rescore_all(&mut pool.shards, now_ms);
        pool.strength = self.recompute_strength(pool);

        let auction_triggered =
            pool.status == PoolStatus::Active && self.is_auction_ready(pool);
        if auction_triggered {
            pool.status = PoolStatus::Auction;
            debug!(
                pool_id = %pool.id,
                strength = pool.strength,
                threshold = pool.threshold_percent,
                "Pool reached auction threshold"
            );
        }

        Ok(AggregationOutcome {
            previous_status,
            status: pool.status,
            strength: pool.strength,
            auction_triggered,
        })
    }

    /// Move the pool one step forward.
    ///
    /// `active → auction` is only allowed once the pool is auction ready.
    pub fn transition(&self, pool: &mut Pool, to: PoolStatus) -> Result<(), AggregationError> {
        let allowed = pool.status.can_transition_to(to)
            && (to != PoolStatus::Auction || self.is_auction_ready(pool));

        if !allowed {
            return Err(AggregationError::InvalidTransition {
                pool_id: pool.id.clone(),
                from: pool.status,
                to,
            });
        }

        pool.status = to;
        Ok(())
    }
}
