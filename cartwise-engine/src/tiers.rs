//! Tier Selector
//!
//! Picks the winner from a scored candidate set, finds its cheaper and
//! premium/ethical neighbors, and labels the winner's price tier. Tier
//! labeling never re-selects the winner; it only annotates it.

use std::cmp::Ordering;
use tracing::debug;

use crate::error::EngineError;
use crate::scoring::compare_scored;
use crate::types::{ScoredCandidate, Tier};

/// Tier selection outcome for one ingredient
#[derive(Debug, Clone)]
pub struct TierSelection {
    /// The winning candidate
    pub winner: ScoredCandidate,
    /// Runner-up by the same total order (for the trace's margin)
    pub runner_up: Option<ScoredCandidate>,
    /// Lowest-priced candidate strictly below the winner's price
    pub cheaper_neighbor: Option<String>,
    /// Highest-scoring organic candidate distinct from the winner
    pub premium_neighbor: Option<String>,
    /// Winner's price-tier label
    pub tier: Tier,
}

/// Select the winner and its neighbors from a scored set.
///
/// The set must be non-empty (the filter guarantees this upstream). Two
/// distinct candidates comparing equal under the full tie-break order means
/// duplicate product ids; that is reported as [`EngineError::TieBreakExhausted`]
/// rather than silently picking one.
pub fn select_tiers(
    ingredient_key: &str,
    scored: &[ScoredCandidate],
) -> Result<TierSelection, EngineError> {
    if scored.is_empty() {
        return Err(EngineError::NoCandidatesAvailable {
            ingredient: ingredient_key.to_string(),
        });
    }

    let mut ranked: Vec<&ScoredCandidate> = scored.iter().collect();
    ranked.sort_by(|a, b| compare_scored(a, b));

    if ranked.len() >= 2 && compare_scored(ranked[0], ranked[1]) == Ordering::Equal {
        return Err(EngineError::TieBreakExhausted {
            ingredient: ingredient_key.to_string(),
            left: ranked[0].candidate.id.clone(),
            right: ranked[1].candidate.id.clone(),
        });
    }

    let winner = ranked[0].clone();
    let runner_up = ranked.get(1).map(|s| (*s).clone());

    let cheaper_neighbor = cheaper_neighbor(&winner, scored);
    let premium_neighbor = premium_neighbor(&winner, &ranked);
    let tier = price_tier(&winner, scored);

    debug!(
        ingredient = %ingredient_key,
        winner = %winner.candidate.id,
        tier = tier.as_str(),
        cheaper = ?cheaper_neighbor,
        premium = ?premium_neighbor,
        "tier selection complete"
    );

    Ok(TierSelection {
        winner,
        runner_up,
        cheaper_neighbor,
        premium_neighbor,
        tier,
    })
}

/// The strictly-lower-priced candidate with the lowest price (product id
/// breaks exact price ties for determinism)
fn cheaper_neighbor(winner: &ScoredCandidate, scored: &[ScoredCandidate]) -> Option<String> {
    scored
        .iter()
        .filter(|s| s.candidate.price < winner.candidate.price)
        .min_by(|a, b| {
            a.candidate
                .price
                .total_cmp(&b.candidate.price)
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        })
        .map(|s| s.candidate.id.clone())
}

/// The highest-scoring organic candidate distinct from the winner
fn premium_neighbor(winner: &ScoredCandidate, ranked: &[&ScoredCandidate]) -> Option<String> {
    ranked
        .iter()
        .filter(|s| s.candidate.organic && s.candidate.id != winner.candidate.id)
        .map(|s| s.candidate.id.clone())
        .next()
}

/// Tier from the winner's position in the considered price distribution:
/// bottom third → cheaper, top third → conscious, middle → balanced.
///
/// A single-candidate set is balanced; a one-point distribution has no
/// thirds.
fn price_tier(winner: &ScoredCandidate, scored: &[ScoredCandidate]) -> Tier {
    let n = scored.len();
    if n <= 1 {
        return Tier::Balanced;
    }
    let below = scored
        .iter()
        .filter(|s| s.candidate.price < winner.candidate.price)
        .count();
    let fraction = below as f64 / n as f64;
    if fraction < 1.0 / 3.0 {
        Tier::Cheaper
    } else if fraction >= 2.0 / 3.0 {
        Tier::Conscious
    } else {
        Tier::Balanced
    }
}
