//! Configuration for the evidence engine.

use serde::{Deserialize, Serialize};

use evidence_core::{AggregationPolicy, ScoringWeights};

use crate::ledger::LedgerMode;
use crate::types::{EngineError, Result};

/// Configuration for an [`EvidenceEngine`](crate::EvidenceEngine).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Credibility point values
    pub scoring: ScoringWeights,
    /// Strength and deduplication rules
    pub aggregation: AggregationPolicy,
    /// Pool store settings
    pub store: StoreConfig,
    /// Ledger anchoring
    pub ledger: LedgerConfig,
    /// Narrative token minting
    pub tokens: TokenConfig,
    /// Event broadcasting
    pub events: EventConfig,
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(format!("YAML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        for (name, value) in [
            ("scoring.recency_max_points", s.recency_max_points),
            ("scoring.recency_decay_per_day", s.recency_decay_per_day),
            ("scoring.proof_points", s.proof_points),
            ("scoring.corroboration_points", s.corroboration_points),
            ("scoring.corroboration_cap", s.corroboration_cap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }
        if s.corroboration_cap > 100.0 {
            return Err(EngineError::Config(format!(
                "scoring.corroboration_cap must be <= 100, got {}",
                s.corroboration_cap
            )));
        }

        if self.aggregation.strength_per_shard == 0 {
            return Err(EngineError::Config(
                "aggregation.strength_per_shard must be > 0".to_string(),
            ));
        }
        if self.aggregation.default_threshold > 100 {
            return Err(EngineError::Config(format!(
                "aggregation.default_threshold must be in [0, 100], got {}",
                self.aggregation.default_threshold
            )));
        }

        if self.ledger.mode == LedgerMode::Live && self.ledger.l1_url.trim().is_empty() {
            return Err(EngineError::Config(
                "ledger.l1_url is required in live mode".to_string(),
            ));
        }
        if self.ledger.request_timeout_ms == 0 {
            return Err(EngineError::Config(
                "ledger.request_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(EngineError::Config(
                "events.channel_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pool store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Retries of a whole upload after a version conflict
    pub max_conflict_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Simulated or live anchoring
    pub mode: LedgerMode,
    /// Global L0 endpoint
    pub l0_url: String,
    /// Data L1 endpoint
    pub l1_url: String,
    /// Metagraph ID, empty for none
    pub metagraph_id: String,
    /// Artificial latency of the simulated ledger (ms)
    pub simulated_latency_ms: u64,
    /// HTTP timeout of the live ledger (ms)
    pub request_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Simulated,
            l0_url: "https://l0-lb-testnet.constellationnetwork.io".to_string(),
            l1_url: "https://l0-lb-testnet.constellationnetwork.io".to_string(),
            metagraph_id: String::new(),
            simulated_latency_ms: 0,
            request_timeout_ms: 10_000,
        }
    }
}

/// Narrative token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Mint one token per accepted shard
    pub mint_on_upload: bool,
    /// Royalty for new tokens, basis points
    pub default_royalty_bps: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            mint_on_upload: true,
            default_royalty_bps: 100, // 1%
        }
    }
}

/// Event channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast buffer per subscriber
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}
