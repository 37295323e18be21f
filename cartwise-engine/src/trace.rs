//! Decision Trace Builder
//!
//! A read-only projection over the per-ingredient pipeline outputs:
//! retrieval/consideration counts by vendor, every score breakdown and
//! elimination reason, the winner's margin over the runner-up, and the
//! top-magnitude score drivers. Built write-once after each decision is
//! final; nothing in the pipeline consults it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::filter::FilterOutcome;
use crate::tiers::TierSelection;
use crate::types::{EliminatedCandidate, ScoredCandidate};

/// Number of top-magnitude drivers surfaced per decision
const DRIVER_LIMIT: usize = 3;

/// One factor's contribution to the winning score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDriver {
    /// Factor name ("safety", "locality", ...)
    pub factor: String,
    /// The factor's signed delta
    pub delta: f32,
}

/// Audit record for one ingredient's decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientTrace {
    /// Canonical ingredient key
    pub ingredient_key: String,
    /// Vendor id → candidates retrieved for the key
    pub retrieved_by_vendor: BTreeMap<String, u32>,
    /// Vendor id → candidates that survived filtering
    pub considered_by_vendor: BTreeMap<String, u32>,
    /// Every scored candidate with its full breakdown
    pub scored: Vec<ScoredCandidate>,
    /// Every eliminated candidate with its reason
    pub eliminated: Vec<EliminatedCandidate>,
    /// Winning candidate id, when a decision was reached
    pub winner_id: Option<String>,
    /// Winner's score margin over the runner-up (absent for single-candidate
    /// sets and undecided ingredients)
    pub margin: Option<f32>,
    /// Top-magnitude score drivers of the winner, strongest first
    pub drivers: Vec<ScoreDriver>,
    /// The form constraint was relaxed to rescue the candidate set
    pub form_relaxed: bool,
}

/// Audit record for a full decision run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Per-ingredient traces, in input order
    pub ingredients: Vec<IngredientTrace>,
}

/// Build one ingredient's trace from the pipeline outputs.
///
/// `selection` is absent when the ingredient never reached tier selection
/// (no candidates, or all eliminated).
pub fn build_ingredient_trace(
    ingredient_key: &str,
    filter: &FilterOutcome,
    scored: &[ScoredCandidate],
    selection: Option<&TierSelection>,
) -> IngredientTrace {
    let winner_id = selection.map(|s| s.winner.candidate.id.clone());
    let margin = selection.and_then(|s| {
        s.runner_up
            .as_ref()
            .map(|runner_up| s.winner.breakdown.total - runner_up.breakdown.total)
    });
    let drivers = selection
        .map(|s| top_drivers(&s.winner))
        .unwrap_or_default();

    IngredientTrace {
        ingredient_key: ingredient_key.to_string(),
        retrieved_by_vendor: filter.retrieved_by_vendor.clone(),
        considered_by_vendor: filter.considered_by_vendor.clone(),
        scored: scored.to_vec(),
        eliminated: filter.eliminated.clone(),
        winner_id,
        margin,
        drivers,
        form_relaxed: filter.form_relaxed,
    }
}

/// The winner's strongest non-zero factor deltas, by absolute magnitude
/// (factor name breaks magnitude ties for determinism)
fn top_drivers(winner: &ScoredCandidate) -> Vec<ScoreDriver> {
    let mut deltas: Vec<(&'static str, f32)> = winner
        .breakdown
        .factor_deltas()
        .into_iter()
        .filter(|(_, delta)| *delta != 0.0)
        .collect();
    deltas.sort_by(|a, b| {
        b.1.abs()
            .total_cmp(&a.1.abs())
            .then_with(|| a.0.cmp(b.0))
    });
    deltas
        .into_iter()
        .take(DRIVER_LIMIT)
        .map(|(factor, delta)| ScoreDriver {
            factor: factor.to_string(),
            delta,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreBreakdown;
    use cartwise_common::catalog::{Packaging, ProductCandidate};

    fn scored_with(breakdown: ScoreBreakdown) -> ScoredCandidate {
        ScoredCandidate {
            candidate: ProductCandidate {
                id: "p1".to_string(),
                title: "Product".to_string(),
                brand: None,
                ingredient_key: "spinach".to_string(),
                price: 3.99,
                package_amount: 1.0,
                package_unit: "lb".to_string(),
                organic: true,
                vendor_id: "va".to_string(),
                seasonal: None,
                distance: None,
                packaging: Packaging::Unspecified,
                recalled: false,
                in_stock: true,
                form: None,
                sold_by_measure: false,
            },
            breakdown,
            unit_price: Some(3.99),
        }
    }

    #[test]
    fn test_top_drivers_ranked_by_magnitude() {
        let winner = scored_with(ScoreBreakdown {
            base: 50.0,
            safety: 20.0,
            seasonality: 0.0,
            locality: 25.0,
            packaging: -5.0,
            unit_price: 10.0,
            outlier: 0.0,
            total: 100.0,
        });
        let drivers = top_drivers(&winner);
        assert_eq!(drivers.len(), 3);
        assert_eq!(drivers[0].factor, "locality");
        assert_eq!(drivers[1].factor, "safety");
        assert_eq!(drivers[2].factor, "unit_price");
    }

    #[test]
    fn test_zero_deltas_excluded_from_drivers() {
        let winner = scored_with(ScoreBreakdown {
            base: 50.0,
            safety: 0.0,
            seasonality: 15.0,
            locality: 0.0,
            packaging: 0.0,
            unit_price: 0.0,
            outlier: 0.0,
            total: 65.0,
        });
        let drivers = top_drivers(&winner);
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].factor, "seasonality");
        assert_eq!(drivers[0].delta, 15.0);
    }

    #[test]
    fn test_driver_magnitude_ties_break_by_name() {
        let winner = scored_with(ScoreBreakdown {
            base: 50.0,
            safety: -20.0,
            seasonality: 0.0,
            locality: 0.0,
            packaging: 0.0,
            unit_price: 10.0,
            outlier: -10.0,
            total: 30.0,
        });
        let drivers = top_drivers(&winner);
        assert_eq!(drivers[0].factor, "safety");
        // outlier and unit_price tie at |10|: lexical factor order decides
        assert_eq!(drivers[1].factor, "outlier");
        assert_eq!(drivers[2].factor, "unit_price");
    }

    #[test]
    fn test_undecided_trace_has_no_winner() {
        let filter = FilterOutcome::default();
        let trace = build_ingredient_trace("saffron", &filter, &[], None);
        assert!(trace.winner_id.is_none());
        assert!(trace.margin.is_none());
        assert!(trace.drivers.is_empty());
    }
}
