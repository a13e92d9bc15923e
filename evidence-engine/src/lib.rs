//! Evidence Engine - pooled whistleblower evidence
//!
//! Runs the pure rules of `evidence-core` against shared state:
//!
//! - **Serialized uploads**: one lock per pool, version-checked writes
//! - **Ledger anchoring**: simulated or Constellation network
//! - **Narrative tokens**: one per accepted shard, with forks and remixes
//! - **Lifecycle events**: broadcast on creation, upload, auction, filing and close
//!
//! # Example
//!
//! ```no_run
//! use evidence_core::ShardCandidate;
//! use evidence_engine::{EvidenceEngine, NewPool};
//!
//! # async fn run() -> evidence_engine::Result<()> {
//! let engine = EvidenceEngine::new()?;
//! let pool = engine.create_pool(NewPool::new("Acme Corp Tax Fraud", "alice")).await?;
//!
//! let receipt = engine
//!     .upload_shard(ShardCandidate::from_bytes(&pool.id, "anon-1", b"ledger.xlsx".to_vec()))
//!     .await?;
//! println!("score {} strength {}", receipt.shard.credibility_score, receipt.pool_strength);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod store;
pub mod tokens;
pub mod types;

// Re-export main types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use engine::EvidenceEngine;
pub use ledger::{LedgerClient, LedgerError, LedgerMode};
pub use store::{InMemoryPoolStore, PoolStore, StoreError};
pub use tokens::{NarrativeToken, TokenError, TokenRegistry};
pub use types::*;
