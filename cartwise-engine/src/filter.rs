//! Candidate Filter
//!
//! First stage of the per-ingredient pipeline: retrieves the candidates
//! tagged with the ingredient's canonical key (exact or registered synonym
//! match) and scoped to registered vendors, then removes structurally
//! ineligible candidates with a reason code each.
//!
//! Elimination rules, in check order:
//! 1. Active recall
//! 2. Owning vendor does not currently stock the product
//! 3. Form tag incompatible with the ingredient's required form
//!
//! If filtering would eliminate every candidate and at least one
//! elimination was a form mismatch, the form constraint is relaxed once and
//! the pass retried; the relaxation is recorded as a data-gap note.

use cartwise_common::catalog::{CatalogSnapshot, IngredientSpec, ProductCandidate, VendorRegistry};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{EliminatedCandidate, EliminationReason};

/// Filter output: the considered set plus everything the trace needs
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Candidates that survived filtering
    pub considered: Vec<ProductCandidate>,
    /// Candidates removed, with reason codes
    pub eliminated: Vec<EliminatedCandidate>,
    /// Vendor id → count of candidates retrieved for the key
    pub retrieved_by_vendor: BTreeMap<String, u32>,
    /// Vendor id → count of candidates that survived filtering
    pub considered_by_vendor: BTreeMap<String, u32>,
    /// The form constraint was relaxed to avoid eliminating everything
    pub form_relaxed: bool,
}

/// Retrieve and filter the candidate set for one ingredient.
///
/// Candidates match when their catalog key canonicalizes to the
/// ingredient's canonical key; candidates from vendors absent from the
/// registry are out of scope and never retrieved.
pub fn filter_candidates(
    spec: &IngredientSpec,
    snapshot: &CatalogSnapshot,
    vendors: &VendorRegistry,
) -> FilterOutcome {
    let canonical_key = snapshot.canonicalize(&spec.key);

    let retrieved: Vec<&ProductCandidate> = snapshot
        .candidates
        .iter()
        .filter(|c| snapshot.canonicalize(&c.ingredient_key) == canonical_key)
        .filter(|c| vendors.contains(&c.vendor_id))
        .collect();

    let mut outcome = run_pass(spec, &retrieved, true);

    // One-shot relaxation: only worthwhile when a form mismatch is what
    // emptied the considered set.
    if outcome.considered.is_empty()
        && outcome
            .eliminated
            .iter()
            .any(|e| e.reason == EliminationReason::FormMismatch)
    {
        debug!(
            ingredient = %spec.key,
            "all candidates eliminated, relaxing form constraint"
        );
        outcome = run_pass(spec, &retrieved, false);
        outcome.form_relaxed = true;
    }

    for candidate in &retrieved {
        *outcome
            .retrieved_by_vendor
            .entry(candidate.vendor_id.clone())
            .or_insert(0) += 1;
    }
    for candidate in &outcome.considered {
        *outcome
            .considered_by_vendor
            .entry(candidate.vendor_id.clone())
            .or_insert(0) += 1;
    }

    debug!(
        ingredient = %spec.key,
        retrieved = retrieved.len(),
        considered = outcome.considered.len(),
        eliminated = outcome.eliminated.len(),
        form_relaxed = outcome.form_relaxed,
        "candidate filtering complete"
    );

    outcome
}

fn run_pass(
    spec: &IngredientSpec,
    retrieved: &[&ProductCandidate],
    enforce_form: bool,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for candidate in retrieved {
        match eliminate_reason(spec, candidate, enforce_form) {
            Some(reason) => outcome.eliminated.push(EliminatedCandidate {
                candidate: (*candidate).clone(),
                reason,
            }),
            None => outcome.considered.push((*candidate).clone()),
        }
    }

    outcome
}

fn eliminate_reason(
    spec: &IngredientSpec,
    candidate: &ProductCandidate,
    enforce_form: bool,
) -> Option<EliminationReason> {
    if candidate.recalled {
        return Some(EliminationReason::Recalled);
    }
    if !candidate.in_stock {
        return Some(EliminationReason::OutOfStock);
    }
    if enforce_form && form_incompatible(spec.form.as_deref(), candidate.form.as_deref()) {
        return Some(EliminationReason::FormMismatch);
    }
    None
}

/// A candidate's form is incompatible only when both sides declare a form
/// and they differ (case-insensitively). An unspecified form on either
/// side is compatible with anything.
fn form_incompatible(required: Option<&str>, offered: Option<&str>) -> bool {
    match (required, offered) {
        (Some(required), Some(offered)) => !required.eq_ignore_ascii_case(offered),
        _ => false,
    }
}
