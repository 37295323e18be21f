//! Vendor Assignment Planner
//!
//! Greedy set cover: repeatedly assign the vendor that fulfills the most
//! not-yet-assigned ingredients until nothing remains or nothing more can
//! be covered. Non-optimal in the general case, accepted in exchange for
//! determinism and speed; the loop is bounded by ingredients × vendors.
//!
//! Tie-breaks between equally-covering vendors use explicit sort keys, in
//! order: the configured primary vendor, the configured priority list, the
//! registry's preferred-order hint, vendor name (lexical), vendor id.
//! Iteration everywhere is over ordered sets, so the plan is identical
//! across runs and input orderings.

use cartwise_common::catalog::VendorRegistry;
use cartwise_common::config::EngineConfig;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::types::{UnfulfillableIngredient, UnfulfillableReason, VendorAssignment, VendorPlan};

/// One vendor's offer for one ingredient: the vendor-local best candidate
/// and its reconciled line cost
#[derive(Debug, Clone)]
pub struct VendorOffer {
    /// Vendor-local best candidate id
    pub candidate_id: String,
    /// Purchase cost of that candidate at the reconciled quantity
    pub line_cost: f64,
}

/// Which vendors can fulfill one ingredient
#[derive(Debug, Clone)]
pub struct IngredientCoverage {
    /// Canonical ingredient key
    pub ingredient_key: String,
    /// Vendor id → offer, for every vendor with a considered candidate
    pub offers: BTreeMap<String, VendorOffer>,
}

/// Partition ingredients across the fewest fulfilling vendors.
///
/// `coverages` carries every ingredient that survived the per-ingredient
/// pipeline; `failures` carries the ones that did not (already paired with
/// their reasons). The returned plan's assigned ∪ unfulfillable set equals
/// the union of both inputs.
pub fn plan_assignments(
    coverages: &[IngredientCoverage],
    failures: Vec<UnfulfillableIngredient>,
    vendors: &VendorRegistry,
    config: &EngineConfig,
) -> VendorPlan {
    let mut remaining: BTreeSet<&str> = coverages
        .iter()
        .map(|c| c.ingredient_key.as_str())
        .collect();
    let offers_by_key: BTreeMap<&str, &IngredientCoverage> = coverages
        .iter()
        .map(|c| (c.ingredient_key.as_str(), c))
        .collect();

    // Vendor → ingredient keys it can fulfill
    let mut vendor_coverage: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for coverage in coverages {
        for vendor_id in coverage.offers.keys() {
            vendor_coverage
                .entry(vendor_id.as_str())
                .or_default()
                .insert(coverage.ingredient_key.as_str());
        }
    }

    let mut plan = VendorPlan {
        assignments: Vec::new(),
        unfulfillable: failures,
    };

    while !remaining.is_empty() {
        let Some((vendor_id, covered)) = best_vendor(&vendor_coverage, &remaining, vendors, config)
        else {
            break;
        };

        let remaining_before = remaining.len();
        let subtotal = covered
            .iter()
            .map(|key| offers_by_key[key].offers[vendor_id].line_cost)
            .sum();
        let vendor_name = vendors
            .get(vendor_id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| vendor_id.to_string());

        debug!(
            vendor = vendor_id,
            covered = covered.len(),
            remaining = remaining_before,
            "greedy pass selected vendor"
        );

        for key in &covered {
            remaining.remove(key);
        }
        plan.assignments.push(VendorAssignment {
            vendor_id: vendor_id.to_string(),
            vendor_name,
            ingredient_keys: covered.iter().map(|k| (*k).to_string()).collect(),
            subtotal,
            rationale: format!(
                "covers largest remaining share ({} of {})",
                covered.len(),
                remaining_before
            ),
        });
    }

    for key in remaining {
        plan.unfulfillable.push(UnfulfillableIngredient {
            ingredient_key: key.to_string(),
            reason: UnfulfillableReason::NoVendorCoverage,
            detail: "no vendor covers this ingredient".to_string(),
        });
    }

    info!(
        assignments = plan.assignments.len(),
        unfulfillable = plan.unfulfillable.len(),
        "vendor assignment planning complete"
    );

    plan
}

/// The vendor covering the most remaining ingredients, with deterministic
/// tie-breaking. Returns `None` when no vendor covers anything.
fn best_vendor<'a>(
    vendor_coverage: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    remaining: &BTreeSet<&'a str>,
    vendors: &VendorRegistry,
    config: &EngineConfig,
) -> Option<(&'a str, BTreeSet<&'a str>)> {
    let mut best: Option<(&'a str, BTreeSet<&'a str>)> = None;

    for (&vendor_id, coverage) in vendor_coverage {
        let covered: BTreeSet<&str> = coverage.intersection(remaining).copied().collect();
        if covered.is_empty() {
            continue;
        }
        let replace = match &best {
            None => true,
            Some((best_id, best_covered)) => {
                let challenger = sort_key(vendor_id, covered.len(), vendors, config);
                let incumbent = sort_key(best_id, best_covered.len(), vendors, config);
                challenger < incumbent
            }
        };
        if replace {
            best = Some((vendor_id, covered));
        }
    }

    best
}

/// Ascending sort key: more coverage first, then the documented tie-break
/// chain
fn sort_key(
    vendor_id: &str,
    covered: usize,
    vendors: &VendorRegistry,
    config: &EngineConfig,
) -> (usize, usize, u32, String, String) {
    let info = vendors.get(vendor_id);
    (
        usize::MAX - covered,
        config.vendor_rank(vendor_id),
        info.and_then(|v| v.preferred_order).unwrap_or(u32::MAX),
        info.map(|v| v.name.clone()).unwrap_or_default(),
        vendor_id.to_string(),
    )
}
