//! Evidence aggregation core.
//!
//! Pure domain logic for evidence pools, with no I/O and no async:
//!
//! - [`ShardValidator`]: checks a candidate upload and fingerprints its payload
//! - [`CredibilityScorer`]: 0-100 score from recency, proof and corroboration
//! - [`PoolAggregator`]: count-based pool strength and the status machine
//!
//! # Example
//!
//! ```
//! use evidence_core::{Pool, PoolAggregator, PoolStatus, ShardCandidate, ShardValidator};
//!
//! let aggregator = PoolAggregator::new();
//! let mut pool = Pool::new("pool-1", "Acme Corp", 15, 0);
//!
//! let candidate = ShardCandidate::from_bytes("pool-1", "anon-1", b"invoice.pdf".to_vec());
//! let shard = ShardValidator::validate(&candidate, Some(&pool), 0).unwrap();
//! let outcome = aggregator.add_shard(&mut pool, shard, 0).unwrap();
//!
//! assert!(outcome.auction_triggered);
//! assert_eq!(pool.status, PoolStatus::Auction);
//! ```

pub mod aggregator;
pub mod scorer;
pub mod types;
pub mod validator;

// Re-export main types
pub use aggregator::{AggregationError, AggregationOutcome, AggregationPolicy, PoolAggregator};
pub use scorer::{CredibilityScorer, ScoreBreakdown, ScoringWeights};
pub use types::*;
pub use validator::{compute_hash, ShardValidator, ValidationError};
