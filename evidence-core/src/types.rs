//! Core types for evidence pools.
//!
//! A pool collects evidence shards for one whistleblower case. Shards are
//! append-only; the pool's strength and status are derived from them.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the web frontend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Lifecycle status of a pool.
///
/// Ordered: a pool only ever moves forward through these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Collecting evidence
    Active,
    /// Strength reached the threshold, lawyer auction open
    Auction,
    /// Lawyer selected, claim being filed
    Filing,
    /// Award granted or claim rejected
    Closed,
}

impl PoolStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Auction => "auction",
            Self::Filing => "filing",
            Self::Closed => "closed",
        }
    }

    /// Whether shards may still be added in this state.
    pub fn accepts_shards(&self) -> bool {
        matches!(self, Self::Active | Self::Auction)
    }

    /// The only state this one may advance to.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Auction),
            Self::Auction => Some(Self::Filing),
            Self::Filing => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Check if a transition to `to` is a legal single forward step.
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }
}

impl Default for PoolStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a closed pool was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Claim succeeded and an award was granted
    Awarded,
    /// Claim was rejected
    Rejected,
}

/// A scalar metadata value.
///
/// Metadata is restricted to strings, numbers and booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag
    Flag(bool),
    /// Numeric value
    Number(f64),
    /// Free text
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Typed key-value metadata attached to shards and tokens.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The company a pool's case is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Company {
    /// Legal name
    pub name: String,
    /// Employer Identification Number
    pub ein: String,
    /// Headquarters location
    pub headquarters: String,
    /// Industry sector
    pub industry: String,
}

/// A single unit of submitted evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Shard {
    /// Unique shard ID
    pub id: String,
    /// Hex digest of the payload
    pub content_hash: String,
    /// Owning pool
    pub pool_id: String,
    /// Pseudonymous contributor
    pub uploader_id: String,
    /// Whether a verifiable proof accompanies the shard
    pub has_proof: bool,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Derived credibility (0-100)
    pub credibility_score: u8,
    /// Typed metadata
    #[serde(default)]
    pub attributes: Attributes,
}

/// A named collection of shards pursuing one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Pool {
    /// Unique pool ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Case description
    pub description: String,
    /// Target company
    pub company: Option<Company>,
    /// Creator ID
    pub creator: String,
    /// Strength at which the lawyer auction opens (0-100)
    pub threshold_percent: u8,
    /// Shards in upload order
    pub shards: Vec<Shard>,
    /// Derived strength (0-100)
    pub strength: u8,
    /// Lifecycle status
    pub status: PoolStatus,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Narrative token IDs minted for this pool
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Winning lawyer, set when filing starts
    pub winner: Option<String>,
    /// Outcome, set when the pool closes
    pub resolution: Option<Resolution>,
    /// Mutation counter for optimistic concurrency
    #[serde(default)]
    pub version: u64,
}

impl Pool {
    /// Create a new, empty, active pool.
    ///
    /// Thresholds above 100 are clamped to 100. Use
    /// [`PoolAggregator::check_threshold`](crate::PoolAggregator::check_threshold)
    /// to reject them instead.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        threshold_percent: u8,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            company: None,
            creator: String::new(),
            threshold_percent: threshold_percent.min(100),
            shards: Vec::new(),
            strength: 0,
            status: PoolStatus::Active,
            created_at,
            tokens: Vec::new(),
            winner: None,
            resolution: None,
            version: 0,
        }
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

    /// Set the creator.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Number of shards in the pool.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Check whether a shard with this content hash is already present.
    pub fn contains_hash(&self, content_hash: &str) -> bool {
        self.shards.iter().any(|s| s.content_hash == content_hash)
    }

    /// Look up a shard by ID.
    pub fn shard(&self, shard_id: &str) -> Option<&Shard> {
        self.shards.iter().find(|s| s.id == shard_id)
    }
}

/// Payload of a shard candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardPayload {
    /// Raw payload bytes, hashed by the validator
    Bytes(Vec<u8>),
    /// Precomputed hex digest, used as-is
    Digest(String),
}

/// An upload that has not been validated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardCandidate {
    /// Target pool
    pub pool_id: String,
    /// Pseudonymous contributor
    pub uploader_id: String,
    /// Payload or digest
    pub payload: ShardPayload,
    /// Whether a verifiable proof accompanies the upload
    pub has_proof: bool,
    /// Typed metadata
    pub attributes: Attributes,
}

impl ShardCandidate {
    /// Candidate carrying raw payload bytes.
    pub fn from_bytes(
        pool_id: impl Into<String>,
        uploader_id: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            uploader_id: uploader_id.into(),
            payload: ShardPayload::Bytes(bytes.into()),
            has_proof: false,
            attributes: Attributes::new(),
        }
    }

    /// Candidate carrying a digest computed by the caller.
    pub fn from_digest(
        pool_id: impl Into<String>,
        uploader_id: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            uploader_id: uploader_id.into(),
            payload: ShardPayload::Digest(digest.into()),
            has_proof: false,
            attributes: Attributes::new(),
        }
    }

    /// Mark whether a proof accompanies the upload.
    pub fn with_proof(mut self, has_proof: bool) -> Self {
        self.has_proof = has_proof;
        self
    }

    /// Attach a metadata attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
