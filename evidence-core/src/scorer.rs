//! Credibility scoring for evidence shards.
//!
//! A shard's score is the sum of three components, rounded and clamped to
//! `[0, 100]`:
//!
//! - **Recency** (up to 40): decays by 5 points per day of age, zero after 8 days
//! - **Proof** (flat 30): awarded when a verifiable proof accompanies the shard
//! - **Cross-validation** (up to 30): 10 per corroborating sibling, i.e. another
//!   shard of the same pool with a different content hash
//!
//! Scoring is a pure function of the shard, its siblings and `now`.

use serde::{Deserialize, Serialize};

use crate::types::Shard;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Point values for the credibility components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Recency points for a brand-new shard
    pub recency_max_points: f64,
    /// Recency points lost per day of age
    pub recency_decay_per_day: f64,
    /// Points for an accompanying proof
    pub proof_points: f64,
    /// Points per corroborating sibling
    pub corroboration_points: f64,
    /// Cap on cross-validation points
    pub corroboration_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency_max_points: 40.0,
            recency_decay_per_day: 5.0,
            proof_points: 30.0,
            corroboration_points: 10.0,
            corroboration_cap: 30.0,
        }
    }
}

/// Per-component view of a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub proof: f64,
    pub cross_validation: f64,
    /// Rounded, clamped total
    pub total: u8,
}

/// Computes shard credibility scores.
#[derive(Debug, Clone, Default)]
pub struct CredibilityScorer {
    weights: ScoringWeights,
}

impl CredibilityScorer {
    /// Create a scorer with the default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scorer with custom weights.
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Get the weights in use.
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a shard against its siblings at `now_ms`.
    pub fn score(&self, shard: &Shard, siblings: &[Shard], now_ms: i64) -> u8 {
        self.breakdown(shard, siblings, now_ms).total
    }

    /// Score a shard and return each component.
    pub fn breakdown(&self, shard: &Shard, siblings: &[Shard], now_ms: i64) -> ScoreBreakdown {
        let recency = self.recency(shard, now_ms);
        let proof = if shard.has_proof { self.weights.proof_points } else { 0.0 };
        let cross_validation = self.cross_validation(shard, siblings);

        let total = (recency + proof + cross_validation).round().clamp(0.0, 100.0) as u8;

        ScoreBreakdown {
            recency,
            proof,
            cross_validation,
            total,
        }
    }

    /// Recompute every shard's score against the whole set.
    pub fn rescore_all(&self, shards: &mut [Shard], now_ms: i64) {
        let view: &[Shard] = shards;
        let scores: Vec<u8> = view.iter().map(|s| self.score(s, view, now_ms)).collect();

        for (shard, score) in shards.iter_mut().zip(scores) {
            shard.credibility_score = score;
        }
    }

    fn recency(&self, shard: &Shard, now_ms: i64) -> f64 {
        // Shards stamped in the future count as brand new
        let age_hours = now_ms.saturating_sub(shard.created_at).max(0) as f64 / MS_PER_HOUR;
        (self.weights.recency_max_points - (age_hours / 24.0) * self.weights.recency_decay_per_day)
            .max(0.0)
    }

    fn cross_validation(&self, shard: &Shard, siblings: &[Shard]) -> f64 {
        let corroborating = siblings
            .iter()
            .filter(|s| s.pool_id == shard.pool_id && s.content_hash != shard.content_hash)
            .count();

        (corroborating as f64 * self.weights.corroboration_points).min(self.weights.corroboration_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;

    const NOW: i64 = 1_700_000_000_000;
    const HOUR: i64 = 3_600_000;

    fn shard(hash: &str, has_proof: bool, created_at: i64) -> Shard {
        Shard {
            id: format!("shard-{hash}"),
            content_hash: hash.to_string(),
            pool_id: "pool-1".to_string(),
            uploader_id: "anon".to_string(),
            has_proof,
            created_at,
            credibility_score: 0,
            attributes: Attributes::new(),
        }
    }

    fn siblings(n: usize) -> Vec<Shard> {
        (0..n).map(|i| shard(&format!("sib-{i}"), false, NOW)).collect()
    }

    #[test]
    fn test_fresh_proven_shard_with_two_corroborators() {
        let scorer = CredibilityScorer::new();
        let s = shard("target", true, NOW);

        let b = scorer.breakdown(&s, &siblings(2), NOW);
        assert_eq!(b.recency, 40.0);
        assert_eq!(b.proof, 30.0);
        assert_eq!(b.cross_validation, 20.0);
        assert_eq!(b.total, 90);
    }

    #[test]
    fn test_recency_decays_to_zero_after_eight_days() {
        let scorer = CredibilityScorer::new();

        let one_day = shard("a", false, NOW - 24 * HOUR);
        assert_eq!(scorer.breakdown(&one_day, &[], NOW).recency, 35.0);

        let eight_days = shard("b", false, NOW - 192 * HOUR);
        assert_eq!(scorer.breakdown(&eight_days, &[], NOW).recency, 0.0);

        let month = shard("c", false, NOW - 720 * HOUR);
        assert_eq!(scorer.score(&month, &[], NOW), 0);
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let scorer = CredibilityScorer::new();
        let s = shard("a", false, NOW + 5 * HOUR);
        assert_eq!(scorer.breakdown(&s, &[], NOW).recency, 40.0);
    }

    #[test]
    fn test_recency_is_monotonic() {
        let scorer = CredibilityScorer::new();
        let sibs = siblings(1);

        let mut previous = u8::MAX;
        for hours in (0..240).step_by(7) {
            let s = shard("target", true, NOW - hours * HOUR);
            let score = scorer.score(&s, &sibs, NOW);
            assert!(score <= previous, "score rose at {hours}h");
            previous = score;
        }
    }

    #[test]
    fn test_proof_never_lowers_score() {
        let scorer = CredibilityScorer::new();
        for age in [0, 13, 100, 500] {
            for n in 0..5 {
                let sibs = siblings(n);
                let without = scorer.score(&shard("t", false, NOW - age * HOUR), &sibs, NOW);
                let with = scorer.score(&shard("t", true, NOW - age * HOUR), &sibs, NOW);
                assert!(with >= without);
                assert!(with <= 100);
            }
        }
    }

    #[test]
    fn test_cross_validation_saturates_at_three() {
        let scorer = CredibilityScorer::new();
        let s = shard("target", true, NOW);

        let three = scorer.score(&s, &siblings(3), NOW);
        let four = scorer.score(&s, &siblings(4), NOW);
        let ten = scorer.score(&s, &siblings(10), NOW);

        assert_eq!(three, 100);
        assert_eq!(four, three);
        assert_eq!(ten, three);
    }

    #[test]
    fn test_same_hash_and_foreign_pool_do_not_corroborate() {
        let scorer = CredibilityScorer::new();
        let s = shard("target", false, NOW);

        let mut duplicate = shard("target", false, NOW);
        duplicate.id = "shard-dup".to_string();
        let mut foreign = shard("other", false, NOW);
        foreign.pool_id = "pool-2".to_string();

        let sibs = vec![s.clone(), duplicate, foreign];
        assert_eq!(scorer.breakdown(&s, &sibs, NOW).cross_validation, 0.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = CredibilityScorer::new();
        let s = shard("target", true, NOW - 31 * HOUR);
        let sibs = siblings(2);

        assert_eq!(scorer.score(&s, &sibs, NOW), scorer.score(&s, &sibs, NOW));
    }

    #[test]
    fn test_rounding() {
        let scorer = CredibilityScorer::new();
        // 40 - (12/24)*5 = 37.5, rounds away from zero
        let s = shard("a", false, NOW - 12 * HOUR);
        assert_eq!(scorer.score(&s, &[], NOW), 38);
    }

    #[test]
    fn test_rescore_all() {
        let scorer = CredibilityScorer::new();
        let mut shards = vec![
            shard("a", true, NOW),
            shard("b", false, NOW),
            shard("c", false, NOW - 192 * HOUR),
        ];

        scorer.rescore_all(&mut shards, NOW);

        assert_eq!(shards[0].credibility_score, 40 + 30 + 20);
        assert_eq!(shards[1].credibility_score, 40 + 20);
        assert_eq!(shards[2].credibility_score, 20);
    }
}
