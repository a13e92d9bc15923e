//! Core traits for ledger clients.
//!
//! Pools and shards are anchored on the Constellation network as data
//! application messages. [`LedgerClient`] hides whether that happens for real
//! or is simulated in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use evidence_core::{Pool, Shard};

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Ledger is not reachable or disabled
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Ledger rejected the submission
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Which ledger strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
    /// In-memory simulation
    #[default]
    Simulated,
    /// Constellation network over HTTP
    Live,
}

impl LedgerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Live => "live",
        }
    }
}

/// Core trait for ledger clients.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Strategy implemented by this client.
    fn mode(&self) -> LedgerMode;

    /// Check if the ledger is currently reachable.
    async fn is_available(&self) -> bool;

    /// Anchor a newly created pool. Returns the transaction ID.
    async fn anchor_pool(&self, pool: &Pool) -> Result<String, LedgerError>;

    /// Anchor an accepted shard. Returns the transaction ID.
    async fn anchor_shard(&self, shard: &Shard) -> Result<String, LedgerError>;
}

/// Data application message submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerMessage {
    CreatePool {
        #[serde(rename = "poolId")]
        pool_id: String,
        creator: String,
        company: Option<String>,
        name: String,
        description: String,
        threshold: u8,
        timestamp: i64,
    },
    AddShard {
        #[serde(rename = "poolId")]
        pool_id: String,
        #[serde(rename = "shardId")]
        shard_id: String,
        hash: String,
        uploader: String,
        #[serde(rename = "hasProof")]
        has_proof: bool,
        timestamp: i64,
    },
}

impl LedgerMessage {
    /// Message announcing a pool.
    pub fn create_pool(pool: &Pool) -> Self {
        Self::CreatePool {
            pool_id: pool.id.clone(),
            creator: pool.creator.clone(),
            company: pool.company.as_ref().map(|c| c.name.clone()),
            name: pool.name.clone(),
            description: pool.description.clone(),
            threshold: pool.threshold_percent,
            timestamp: pool.created_at,
        }
    }

    /// Message announcing a shard.
    pub fn add_shard(shard: &Shard) -> Self {
        Self::AddShard {
            pool_id: shard.pool_id.clone(),
            shard_id: shard.id.clone(),
            hash: shard.content_hash.clone(),
            uploader: shard.uploader_id.clone(),
            has_proof: shard.has_proof,
            timestamp: shard.created_at,
        }
    }

    /// Pool the message is about.
    pub fn pool_id(&self) -> &str {
        match self {
            Self::CreatePool { pool_id, .. } | Self::AddShard { pool_id, .. } => pool_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let pool = Pool::new("pool-1", "Acme", 75, 1_000).with_creator("alice");
        let json = serde_json::to_value(LedgerMessage::create_pool(&pool)).unwrap();

        assert_eq!(json["CreatePool"]["poolId"], "pool-1");
        assert_eq!(json["CreatePool"]["creator"], "alice");
        assert_eq!(json["CreatePool"]["threshold"], 75);
        assert!(json["CreatePool"]["company"].is_null());
    }

    #[test]
    fn test_mode_serde() {
        let mode: LedgerMode = serde_json::from_str("\"live\"").unwrap();
        assert_eq!(mode, LedgerMode::Live);
        assert_eq!(LedgerMode::default().as_str(), "simulated");
    }
}
