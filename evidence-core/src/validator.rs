//! Shard validation and content fingerprinting.
//!
//! Turns a [`ShardCandidate`] into a [`Shard`] against a snapshot of its
//! target pool. Validation is pure: nothing is stored here.

use sha2::{Digest, Sha256};

use crate::types::{Pool, PoolStatus, Shard, ShardCandidate, ShardPayload};

/// Error types for shard validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Referenced pool does not exist
    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    /// Pool is filing or closed
    #[error("Pool {pool_id} is {status} and closed to new evidence")]
    PoolClosed { pool_id: String, status: PoolStatus },

    /// Nothing to fingerprint
    #[error("Empty payload for pool {0}")]
    EmptyPayload(String),

    /// Uploader ID missing
    #[error("Missing uploader for pool {0}")]
    MissingUploader(String),
}

/// Validates shard candidates.
pub struct ShardValidator;

impl ShardValidator {
    /// Validate a candidate against its pool snapshot and build the shard.
    ///
    /// `pool` is the caller's resolution of `candidate.pool_id`; `None` or a
    /// snapshot of a different pool is reported as [`ValidationError::PoolNotFound`].
    /// A supplied digest is taken as-is and not re-hashed.
    pub fn validate(
        candidate: &ShardCandidate,
        pool: Option<&Pool>,
        created_at: i64,
    ) -> Result<Shard, ValidationError> {
        let pool = pool
            .filter(|p| p.id == candidate.pool_id)
            .ok_or_else(|| ValidationError::PoolNotFound(candidate.pool_id.clone()))?;

        if !pool.status.accepts_shards() {
            return Err(ValidationError::PoolClosed {
                pool_id: pool.id.clone(),
                status: pool.status,
            });
        }

        let content_hash = match &candidate.payload {
            ShardPayload::Bytes(bytes) if !bytes.is_empty() => compute_hash(bytes),
            ShardPayload::Digest(digest) if !digest.trim().is_empty() => digest.trim().to_string(),
            _ => return Err(ValidationError::EmptyPayload(pool.id.clone())),
        };

        if candidate.uploader_id.trim().is_empty() {
            return Err(ValidationError::MissingUploader(pool.id.clone()));
        }

        Ok(Shard {
            id: uuid::Uuid::new_v4().to_string(),
            content_hash,
            pool_id: pool.id.clone(),
            uploader_id: candidate.uploader_id.clone(),
            has_proof: candidate.has_proof,
            created_at,
            credibility_score: 0,
            attributes: candidate.attributes.clone(),
        })
    }
}

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
