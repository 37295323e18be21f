//! Scoring Engine
//!
//! Assigns each considered candidate a deterministic score from independent
//! weighted factors:
//!
//! - **Safety**: high-residue ingredients reward organic sourcing (±20)
//! - **Seasonality**: in-season bonus (+15)
//! - **Locality**: distance band (local +25, regional +15, import −15)
//! - **Packaging**: glass/minimal +10, plastic −5
//! - **Unit-price rank**: best +10 … worst −10, linearly interpolated
//! - **Outlier**: price above 2× the considered-set median (−10)
//!
//! The final score is `clamp(50 + Σ deltas, 0, 100)`. Every input is a
//! candidate attribute or a property of the considered set (median, rank) —
//! never external randomness or iteration order. The weight table below is
//! the scoring contract; deviations are defects.

use cartwise_common::catalog::{Packaging, ProductCandidate, ResidueClass};
use cartwise_common::units::{to_canonical, EquivalenceTable};
use std::cmp::Ordering;
use tracing::debug;

use crate::types::{ScoreBreakdown, ScoredCandidate};

/// Base score every considered candidate starts from
pub const BASE_SCORE: f32 = 50.0;

/// Score bounds after clamping
pub const SCORE_MIN: f32 = 0.0;
/// Score bounds after clamping
pub const SCORE_MAX: f32 = 100.0;

// Safety classification deltas
const SAFETY_ORGANIC_BONUS: f32 = 20.0;
const SAFETY_CONVENTIONAL_PENALTY: f32 = -20.0;

// Seasonality delta
const SEASONAL_BONUS: f32 = 15.0;

// Locality bands (distance units) and deltas
const LOCAL_MAX_DISTANCE: f64 = 50.0;
const REGIONAL_MAX_DISTANCE: f64 = 150.0;
const IMPORT_MIN_DISTANCE: f64 = 3000.0;
const LOCAL_BONUS: f32 = 25.0;
const REGIONAL_BONUS: f32 = 15.0;
const IMPORT_PENALTY: f32 = -15.0;

// Packaging deltas
const PACKAGING_GLASS_BONUS: f32 = 10.0;
const PACKAGING_PLASTIC_PENALTY: f32 = -5.0;

// Unit-price rank: best gets +UNIT_PRICE_SPREAD, worst −UNIT_PRICE_SPREAD
const UNIT_PRICE_SPREAD: f32 = 10.0;

// Outlier: price above OUTLIER_MEDIAN_FACTOR × median
const OUTLIER_MEDIAN_FACTOR: f64 = 2.0;
const OUTLIER_PENALTY: f32 = -10.0;

/// Score a considered candidate set.
///
/// A pure function of candidate attributes, the residue classification, and
/// set-level statistics. Output order mirrors input order; selection is the
/// tier selector's job via [`compare_scored`].
pub fn score_candidates(
    residue: ResidueClass,
    considered: &[ProductCandidate],
    table: &EquivalenceTable,
) -> Vec<ScoredCandidate> {
    let unit_prices: Vec<Option<f64>> = considered
        .iter()
        .map(|c| unit_price(c, table))
        .collect();
    let rank_deltas = unit_price_rank_deltas(&unit_prices);
    let median = price_median(considered);

    considered
        .iter()
        .zip(unit_prices.iter().zip(rank_deltas.iter()))
        .map(|(candidate, (unit_price, rank_delta))| {
            let breakdown = score_one(candidate, residue, *rank_delta, median);
            debug!(
                product = %candidate.id,
                total = breakdown.total,
                safety = breakdown.safety,
                locality = breakdown.locality,
                unit_price = breakdown.unit_price,
                "scored candidate"
            );
            ScoredCandidate {
                candidate: candidate.clone(),
                breakdown,
                unit_price: *unit_price,
            }
        })
        .collect()
}

fn score_one(
    candidate: &ProductCandidate,
    residue: ResidueClass,
    rank_delta: f32,
    median: Option<f64>,
) -> ScoreBreakdown {
    let safety = match residue {
        ResidueClass::High if candidate.organic => SAFETY_ORGANIC_BONUS,
        ResidueClass::High => SAFETY_CONVENTIONAL_PENALTY,
        ResidueClass::Low => 0.0,
    };

    let seasonality = if candidate.seasonal == Some(true) {
        SEASONAL_BONUS
    } else {
        0.0
    };

    let locality = match candidate.distance {
        Some(d) if d < LOCAL_MAX_DISTANCE => LOCAL_BONUS,
        Some(d) if d <= REGIONAL_MAX_DISTANCE => REGIONAL_BONUS,
        Some(d) if d > IMPORT_MIN_DISTANCE => IMPORT_PENALTY,
        // Domestic band (between regional and import) and unlabeled both
        // score neutral
        _ => 0.0,
    };

    let packaging = match candidate.packaging {
        Packaging::Glass => PACKAGING_GLASS_BONUS,
        Packaging::Plastic => PACKAGING_PLASTIC_PENALTY,
        Packaging::Unspecified => 0.0,
    };

    let outlier = match median {
        Some(m) if candidate.price > OUTLIER_MEDIAN_FACTOR * m => OUTLIER_PENALTY,
        _ => 0.0,
    };

    let total = (BASE_SCORE + safety + seasonality + locality + packaging + rank_delta + outlier)
        .clamp(SCORE_MIN, SCORE_MAX);

    ScoreBreakdown {
        base: BASE_SCORE,
        safety,
        seasonality,
        locality,
        packaging,
        unit_price: rank_delta,
        outlier,
        total,
    }
}

/// Price per canonical unit, when the package size converts
fn unit_price(candidate: &ProductCandidate, table: &EquivalenceTable) -> Option<f64> {
    if candidate.package_amount <= 0.0 {
        return None;
    }
    let conversion = to_canonical(candidate.package_amount, &candidate.package_unit, table)?;
    if conversion.canonical.value <= 0.0 {
        return None;
    }
    Some(candidate.price / conversion.canonical.value)
}

/// Rank deltas for the unit-price factor.
///
/// Candidates without a computable unit price take delta 0 and do not
/// participate in the rank. Participants with equal unit prices share a
/// rank position (the count of strictly cheaper participants), which keeps
/// the delta independent of input ordering.
fn unit_price_rank_deltas(unit_prices: &[Option<f64>]) -> Vec<f32> {
    let participants: Vec<f64> = unit_prices.iter().filter_map(|p| *p).collect();
    let m = participants.len();

    unit_prices
        .iter()
        .map(|maybe_price| match maybe_price {
            None => 0.0,
            Some(_) if m == 1 => UNIT_PRICE_SPREAD,
            Some(price) => {
                let cheaper = participants.iter().filter(|p| **p < *price).count();
                let fraction = cheaper as f32 / (m - 1) as f32;
                UNIT_PRICE_SPREAD - 2.0 * UNIT_PRICE_SPREAD * fraction
            }
        })
        .collect()
}

/// Median of the considered set's prices (mean of the middle pair for
/// even-sized sets)
fn price_median(considered: &[ProductCandidate]) -> Option<f64> {
    if considered.is_empty() {
        return None;
    }
    let mut prices: Vec<f64> = considered.iter().map(|c| c.price).collect();
    prices.sort_by(f64::total_cmp);
    let mid = prices.len() / 2;
    if prices.len() % 2 == 1 {
        Some(prices[mid])
    } else {
        Some((prices[mid - 1] + prices[mid]) / 2.0)
    }
}

/// Total order over scored candidates: score descending, then price
/// ascending, then organic first, then product id ascending.
///
/// Guarantees a single deterministic winner regardless of input ordering;
/// `Ordering::Equal` for two distinct entries means duplicate product ids
/// (an input defect the tier selector reports).
pub fn compare_scored(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.breakdown
        .total
        .total_cmp(&a.breakdown.total)
        .then_with(|| a.candidate.price.total_cmp(&b.candidate.price))
        .then_with(|| b.candidate.organic.cmp(&a.candidate.organic))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}
