//! Narrative tokens.
//!
//! Each accepted shard can be represented by a narrative token, an IP asset
//! owned by the uploader that carries royalties. Tokens can be transferred,
//! forked with new metadata, and remixed into a master token for a pool.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use evidence_core::{AttributeValue, Attributes};

/// Error types for token operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Token not found
    #[error("Token not found: {0}")]
    NotFound(String),

    /// Remix parent belongs to another pool
    #[error("Token {token_id} does not belong to pool {pool_id}")]
    PoolMismatch { token_id: String, pool_id: String },

    /// Remix without parents
    #[error("Remix requires at least one parent token")]
    EmptyRemix,
}

/// Token metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Display name
    pub name: String,
    /// Typed attributes
    pub attributes: Attributes,
}

impl TokenMetadata {
    /// Default metadata for a shard token.
    pub fn for_shard(shard_hash: &str) -> Self {
        let prefix: String = shard_hash.chars().take(8).collect();
        let mut attributes = Attributes::new();
        attributes.insert("type".to_string(), AttributeValue::from("evidence"));

        Self {
            name: format!("Shard-{prefix}"),
            attributes,
        }
    }
}

/// Partial metadata applied when forking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    /// Replacement name
    pub name: Option<String>,
    /// Attributes to add or overwrite
    pub attributes: Attributes,
}

/// A narrative token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeToken {
    /// Unique token ID
    pub id: String,
    /// Pool the evidence belongs to
    pub pool_id: String,
    /// Content hash of the underlying shard; empty for remixes
    pub shard_hash: String,
    /// Metadata
    pub metadata: TokenMetadata,
    /// Royalty in basis points
    pub royalty_bps: u32,
    /// Current owner
    pub owner: String,
    /// Tokens this one was forked or remixed from
    #[serde(default)]
    pub parents: Vec<String>,
}

/// In-memory token registry.
pub struct TokenRegistry {
    tokens: Arc<RwLock<HashMap<String, NarrativeToken>>>,
    default_royalty_bps: u32,
}

impl TokenRegistry {
    /// Create a registry minting with `default_royalty_bps`.
    pub fn new(default_royalty_bps: u32) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            default_royalty_bps,
        }
    }

    /// Build a token for a shard without registering it.
    pub fn prepare(
        &self,
        shard_hash: &str,
        pool_id: &str,
        metadata: Option<TokenMetadata>,
        owner: &str,
    ) -> NarrativeToken {
        NarrativeToken {
            id: format!("token-{}", uuid::Uuid::new_v4().simple()),
            pool_id: pool_id.to_string(),
            shard_hash: shard_hash.to_string(),
            metadata: metadata.unwrap_or_else(|| TokenMetadata::for_shard(shard_hash)),
            royalty_bps: self.default_royalty_bps,
            owner: owner.to_string(),
            parents: Vec::new(),
        }
    }

    /// Register a prepared token.
    pub async fn register(&self, token: NarrativeToken) -> String {
        let id = token.id.clone();
        debug!(token_id = %id, pool_id = %token.pool_id, "Registered narrative token");

        let mut tokens = self.tokens.write().await;
        tokens.insert(id.clone(), token);
        id
    }

    /// Mint a token for a shard.
    pub async fn mint(
        &self,
        shard_hash: &str,
        pool_id: &str,
        metadata: Option<TokenMetadata>,
        owner: &str,
    ) -> String {
        let token = self.prepare(shard_hash, pool_id, metadata, owner);
        self.register(token).await
    }

    /// Get a token by ID.
    pub async fn get(&self, token_id: &str) -> Option<NarrativeToken> {
        let tokens = self.tokens.read().await;
        tokens.get(token_id).cloned()
    }

    /// Royalty of a token, zero if unknown.
    pub async fn royalties(&self, token_id: &str) -> u32 {
        let tokens = self.tokens.read().await;
        tokens.get(token_id).map(|t| t.royalty_bps).unwrap_or(0)
    }

    /// Transfer a token to a new owner.
    pub async fn transfer(&self, token_id: &str, to: &str) -> Result<(), TokenError> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(token_id)
            .ok_or_else(|| TokenError::NotFound(token_id.to_string()))?;

        info!(token_id = %token_id, from = %token.owner, to = %to, "Transferring token");
        token.owner = to.to_string();
        Ok(())
    }

    /// Fork a token with patched metadata.
    pub async fn fork(&self, token_id: &str, patch: MetadataPatch) -> Result<String, TokenError> {
        let mut tokens = self.tokens.write().await;
        let original = tokens
            .get(token_id)
            .ok_or_else(|| TokenError::NotFound(token_id.to_string()))?;

        let mut metadata = original.metadata.clone();
        if let Some(name) = patch.name {
            metadata.name = name;
        }
        metadata.attributes.extend(patch.attributes);

        let fork = NarrativeToken {
            id: format!("fork-{}", uuid::Uuid::new_v4().simple()),
            metadata,
            parents: vec![original.id.clone()],
            ..original.clone()
        };

        let id = fork.id.clone();
        tokens.insert(id.clone(), fork);
        Ok(id)
    }

    /// Combine a pool's tokens into one master token.
    pub async fn remix(
        &self,
        parent_ids: &[String],
        name: impl Into<String>,
        pool_id: &str,
        owner: &str,
    ) -> Result<String, TokenError> {
        if parent_ids.is_empty() {
            return Err(TokenError::EmptyRemix);
        }

        let mut tokens = self.tokens.write().await;
        for parent_id in parent_ids {
            let parent = tokens
                .get(parent_id)
                .ok_or_else(|| TokenError::NotFound(parent_id.clone()))?;
            if parent.pool_id != pool_id {
                return Err(TokenError::PoolMismatch {
                    token_id: parent_id.clone(),
                    pool_id: pool_id.to_string(),
                });
            }
        }

        let mut attributes = Attributes::new();
        attributes.insert("type".to_string(), AttributeValue::from("master"));
        attributes.insert("parents".to_string(), AttributeValue::from(parent_ids.len() as i64));

        let master = NarrativeToken {
            id: format!("master-{}", uuid::Uuid::new_v4().simple()),
            pool_id: pool_id.to_string(),
            shard_hash: String::new(),
            metadata: TokenMetadata {
                name: name.into(),
                attributes,
            },
            royalty_bps: self.default_royalty_bps,
            owner: owner.to_string(),
            parents: parent_ids.to_vec(),
        };

        info!(
            token_id = %master.id,
            pool_id = %pool_id,
            parents = parent_ids.len(),
            "Remixed tokens into master"
        );

        let id = master.id.clone();
        tokens.insert(id.clone(), master);
        Ok(id)
    }

    /// All tokens of a pool.
    pub async fn by_pool(&self, pool_id: &str) -> Vec<NarrativeToken> {
        let tokens = self.tokens.read().await;
        tokens.values().filter(|t| t.pool_id == pool_id).cloned().collect()
    }

    /// Number of registered tokens.
    pub async fn count(&self) -> usize {
        let tokens = self.tokens.read().await;
        tokens.len()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(100)
    }
}
