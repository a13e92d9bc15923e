//! Core types for the evidence engine.

use serde::{Deserialize, Serialize};

use evidence_core::{
    AggregationError, Company, PoolStatus, Resolution, Shard, ValidationError,
};

use crate::ledger::LedgerError;
use crate::store::StoreError;
use crate::tokens::TokenError;

/// Request to open a new pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPool {
    /// Pool ID; generated when absent
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Case description
    pub description: String,
    /// Target company
    pub company: Option<Company>,
    /// Creator ID
    pub creator: String,
    /// Auction threshold (0-100); the configured default when absent
    pub threshold: Option<u32>,
}

impl NewPool {
    /// Create a request with a name and creator.
    pub fn new(name: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creator: creator.into(),
            ..Default::default()
        }
    }

    /// Use a fixed pool ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the target company.
    pub fn with_company(mut self, company: Company) -> Self {
        self.company = Some(company);
        self
    }

    /// Set the auction threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Result of an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// The stored shard with its current score
    pub shard: Shard,
    /// Pool strength after the upload
    pub pool_strength: u8,
    /// Pool status after the upload
    pub pool_status: PoolStatus,
    /// This upload opened the auction
    pub auction_triggered: bool,
    /// Ledger transaction anchoring the shard
    pub ledger_tx: String,
    /// Narrative token minted for the shard
    pub token_id: Option<String>,
}

/// Pool lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A pool was opened
    PoolCreated { pool_id: String, threshold: u8 },
    /// A shard was accepted
    ShardAdded {
        pool_id: String,
        shard_id: String,
        strength: u8,
    },
    /// Strength reached the threshold; fired once per pool
    AuctionReady {
        pool_id: String,
        strength: u8,
        threshold: u8,
    },
    /// A lawyer was selected
    FilingStarted { pool_id: String, lawyer_id: String },
    /// The case was resolved
    PoolClosed {
        pool_id: String,
        resolution: Resolution,
    },
}

impl PoolEvent {
    /// Pool the event is about.
    pub fn pool_id(&self) -> &str {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::ShardAdded { pool_id, .. }
            | Self::AuctionReady { pool_id, .. }
            | Self::FilingStarted { pool_id, .. }
            | Self::PoolClosed { pool_id, .. } => pool_id,
        }
    }
}

/// Error types for the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Upload failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Pool rejected the shard or transition
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// Pool store failure, including version conflicts
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger anchoring failed
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Token operation failed
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the operation lost a race and may be retried with a fresh snapshot.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict { .. }))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
