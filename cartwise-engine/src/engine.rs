//! Decision engine orchestration
//!
//! Runs the per-ingredient pipeline (filter → score → tier select →
//! reconcile) concurrently — each ingredient works on an independent,
//! read-only snapshot, so tasks share nothing mutable — then the inherently
//! sequential vendor assignment pass, then aggregate totals and the
//! optional trace. Failures scoped to one ingredient never abort the
//! others; the engine always returns a complete result set plus a
//! gaps/warnings list.

use cartwise_common::catalog::{
    CatalogSnapshot, IngredientSpec, ProductCandidate, ResidueClass, VendorRegistry,
};
use cartwise_common::config::EngineConfig;
use cartwise_common::units::EquivalenceTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;
use crate::filter::{filter_candidates, FilterOutcome};
use crate::planner::{plan_assignments, IngredientCoverage, VendorOffer};
use crate::quantity::{purchase_cost, reconcile};
use crate::scoring::{compare_scored, score_candidates};
use crate::tiers::select_tiers;
use crate::trace::{build_ingredient_trace, DecisionTrace, IngredientTrace};
use crate::types::{
    DecisionItem, DecisionSet, Gap, Totals, UnfulfillableIngredient, UnfulfillableReason,
};

/// Everything one decision run consumes, materialized by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Requested ingredients, from the extraction collaborator
    pub ingredients: Vec<IngredientSpec>,
    /// Catalog snapshot scoped to the requested vendors
    pub snapshot: CatalogSnapshot,
    /// Vendor registry
    pub vendors: VendorRegistry,
}

/// The decision engine.
///
/// Holds only configuration; every run's data arrives in the
/// [`DecisionRequest`] and leaves in the [`DecisionSet`]. The engine
/// performs no I/O.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    equivalences: EquivalenceTable,
}

impl DecisionEngine {
    /// Create an engine from configuration
    pub fn new(config: EngineConfig) -> Self {
        let equivalences = config.equivalence_table();
        Self {
            config,
            equivalences,
        }
    }

    /// Run a decision without building the audit trace
    pub async fn decide(&self, request: DecisionRequest) -> DecisionSet {
        self.decide_inner(request, false).await
    }

    /// Run a decision and include the audit trace in the result
    pub async fn decide_traced(&self, request: DecisionRequest) -> DecisionSet {
        self.decide_inner(request, true).await
    }

    async fn decide_inner(&self, request: DecisionRequest, include_trace: bool) -> DecisionSet {
        let snapshot = Arc::new(request.snapshot);
        let vendors = Arc::new(request.vendors);
        let ingredient_count = request.ingredients.len();

        info!(
            ingredients = ingredient_count,
            candidates = snapshot.candidates.len(),
            vendors = vendors.vendors.len(),
            "starting decision run"
        );

        let mut tasks = JoinSet::new();
        for (index, spec) in request.ingredients.into_iter().enumerate() {
            let snapshot = Arc::clone(&snapshot);
            let vendors = Arc::clone(&vendors);
            let equivalences = self.equivalences.clone();
            tasks.spawn(async move {
                decide_ingredient(index, spec, &snapshot, &vendors, &equivalences)
            });
        }

        let mut outcomes = Vec::with_capacity(ingredient_count);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                // A panicking task would lose one ingredient, not the batch
                Err(join_error) => error!(%join_error, "ingredient task failed"),
            }
        }
        outcomes.sort_by_key(|o| o.index);

        let mut items = Vec::new();
        let mut gaps = Vec::new();
        let mut traces = Vec::new();
        let mut coverages = Vec::new();
        let mut failures = Vec::new();
        let mut recommended_total = 0.0;
        let mut cheapest_total = 0.0;

        for outcome in outcomes {
            gaps.extend(outcome.gaps);
            traces.push(outcome.trace);
            if let Some(coverage) = outcome.coverage {
                coverages.push(coverage);
            }
            if let Some(failure) = outcome.failure {
                failures.push(failure);
            }
            if let Some(item) = outcome.item {
                recommended_total += outcome.winner_cost;
                cheapest_total += outcome.cheapest_cost;
                items.push(item);
            }
        }

        let plan = plan_assignments(&coverages, failures, &vendors, &self.config);

        let per_vendor: BTreeMap<String, f64> = plan
            .assignments
            .iter()
            .map(|a| (a.vendor_id.clone(), a.subtotal))
            .collect();
        let totals = Totals {
            recommended_total,
            cheapest_total,
            savings_potential: recommended_total - cheapest_total,
            per_vendor,
        };

        info!(
            decided = items.len(),
            unfulfillable = plan.unfulfillable.len(),
            recommended_total = totals.recommended_total,
            "decision run complete"
        );

        DecisionSet {
            items,
            plan,
            totals,
            gaps,
            trace: include_trace.then(|| DecisionTrace {
                ingredients: traces,
            }),
        }
    }
}

/// One ingredient's full pipeline result
struct IngredientOutcome {
    index: usize,
    item: Option<DecisionItem>,
    failure: Option<UnfulfillableIngredient>,
    coverage: Option<IngredientCoverage>,
    gaps: Vec<Gap>,
    trace: IngredientTrace,
    winner_cost: f64,
    cheapest_cost: f64,
}

impl IngredientOutcome {
    fn failed(
        index: usize,
        key: &str,
        reason: UnfulfillableReason,
        detail: String,
        trace: IngredientTrace,
    ) -> Self {
        Self {
            index,
            item: None,
            failure: Some(UnfulfillableIngredient {
                ingredient_key: key.to_string(),
                reason,
                detail: detail.clone(),
            }),
            coverage: None,
            gaps: vec![Gap {
                ingredient_key: key.to_string(),
                message: detail,
            }],
            trace,
            winner_cost: 0.0,
            cheapest_cost: 0.0,
        }
    }
}

/// Filter → score → select → reconcile for a single ingredient.
///
/// Never panics and never aborts the batch: every failure mode collapses
/// into an [`IngredientOutcome`] with a reason and an intact trace.
fn decide_ingredient(
    index: usize,
    spec: IngredientSpec,
    snapshot: &CatalogSnapshot,
    vendors: &VendorRegistry,
    equivalences: &EquivalenceTable,
) -> IngredientOutcome {
    let key = snapshot.canonicalize(&spec.key).to_string();
    let empty_trace = || build_ingredient_trace(&key, &FilterOutcome::default(), &[], None);

    // Boundary validation: malformed specs are rejected outright for this
    // ingredient while the rest of the batch proceeds.
    if spec.key.trim().is_empty() || spec.unit.trim().is_empty() {
        let error = EngineError::MalformedInput {
            ingredient: spec.key.clone(),
            detail: "missing canonical key or required unit".to_string(),
        };
        warn!(%error, "rejecting malformed ingredient spec");
        return IngredientOutcome::failed(
            index,
            &key,
            UnfulfillableReason::MalformedInput,
            error.to_string(),
            empty_trace(),
        );
    }

    let amount = spec.required_amount();
    if amount <= 0.0 {
        let error = EngineError::InvalidQuantity {
            ingredient: key.clone(),
            amount,
        };
        warn!(%error, "rejecting non-positive required amount");
        return IngredientOutcome::failed(
            index,
            &key,
            UnfulfillableReason::InvalidQuantity,
            error.to_string(),
            empty_trace(),
        );
    }

    let filter = filter_candidates(&spec, snapshot, vendors);
    if filter.considered.is_empty() {
        let error = if filter.eliminated.is_empty() {
            EngineError::NoCandidatesAvailable {
                ingredient: key.clone(),
            }
        } else {
            EngineError::AllCandidatesEliminated {
                ingredient: key.clone(),
                count: filter.eliminated.len(),
            }
        };
        debug!(%error, "ingredient unfulfillable");
        let trace = build_ingredient_trace(&key, &filter, &[], None);
        return IngredientOutcome::failed(
            index,
            &key,
            UnfulfillableReason::NoVendorCoverage,
            error.to_string(),
            trace,
        );
    }

    let residue = snapshot.residue_class(&spec.key);
    let scored = score_candidates(residue, &filter.considered, equivalences);

    let selection = match select_tiers(&key, &scored) {
        Ok(selection) => selection,
        Err(error) => {
            // TieBreakExhausted means duplicate product ids in the catalog:
            // an input defect, reported rather than silently resolved.
            error!(%error, "tier selection failed");
            let trace = build_ingredient_trace(&key, &filter, &scored, None);
            return IngredientOutcome::failed(
                index,
                &key,
                UnfulfillableReason::MalformedInput,
                error.to_string(),
                trace,
            );
        }
    };

    let reconciliation = match reconcile(&spec, &selection.winner.candidate, equivalences) {
        Ok(reconciliation) => reconciliation,
        Err(error) => {
            warn!(%error, "quantity reconciliation failed");
            let trace = build_ingredient_trace(&key, &filter, &scored, Some(&selection));
            let reason = match error {
                EngineError::InvalidQuantity { .. } => UnfulfillableReason::InvalidQuantity,
                _ => UnfulfillableReason::MalformedInput,
            };
            return IngredientOutcome::failed(index, &key, reason, error.to_string(), trace);
        }
    };

    let mut gaps = Vec::new();
    if filter.form_relaxed {
        gaps.push(Gap {
            ingredient_key: key.clone(),
            message: format!(
                "form constraint '{}' relaxed to avoid eliminating all candidates",
                spec.form.as_deref().unwrap_or_default()
            ),
        });
    }
    if reconciliation.fallback {
        for note in &reconciliation.notes {
            gaps.push(Gap {
                ingredient_key: key.clone(),
                message: note.clone(),
            });
        }
    }

    let winner_cost = purchase_cost(&selection.winner.candidate, &reconciliation);
    let cheapest_cost = selection
        .cheaper_neighbor
        .as_deref()
        .and_then(|id| scored.iter().find(|s| s.candidate.id == id))
        .and_then(|neighbor| {
            reconcile(&spec, &neighbor.candidate, equivalences)
                .ok()
                .map(|r| purchase_cost(&neighbor.candidate, &r))
        })
        .unwrap_or(winner_cost);

    let coverage = build_coverage(&key, &spec, &scored, equivalences);
    let trace = build_ingredient_trace(&key, &filter, &scored, Some(&selection));

    let item = DecisionItem {
        ingredient_key: key.clone(),
        display_name: spec.display_name.clone(),
        winner: selection.winner.clone(),
        cheaper_neighbor: selection.cheaper_neighbor,
        premium_neighbor: selection.premium_neighbor,
        tier: selection.tier,
        reconciliation,
        high_residue: residue == ResidueClass::High,
        in_season: selection.winner.candidate.seasonal == Some(true),
        narrative: None,
    };

    IngredientOutcome {
        index,
        item: Some(item),
        failure: None,
        coverage: Some(coverage),
        gaps,
        trace,
        winner_cost,
        cheapest_cost,
    }
}

/// Per-vendor fulfillment offers: the vendor-local best candidate (same
/// total order, restricted to that vendor) and its reconciled line cost
fn build_coverage(
    key: &str,
    spec: &IngredientSpec,
    scored: &[crate::types::ScoredCandidate],
    equivalences: &EquivalenceTable,
) -> IngredientCoverage {
    let mut best: BTreeMap<&str, &crate::types::ScoredCandidate> = BTreeMap::new();
    for candidate in scored {
        best.entry(candidate.candidate.vendor_id.as_str())
            .and_modify(|incumbent| {
                if compare_scored(candidate, *incumbent) == std::cmp::Ordering::Less {
                    *incumbent = candidate;
                }
            })
            .or_insert(candidate);
    }

    let offers = best
        .into_iter()
        .map(|(vendor_id, local_best)| {
            (
                vendor_id.to_string(),
                VendorOffer {
                    candidate_id: local_best.candidate.id.clone(),
                    line_cost: line_cost(spec, &local_best.candidate, equivalences),
                },
            )
        })
        .collect();

    IngredientCoverage {
        ingredient_key: key.to_string(),
        offers,
    }
}

fn line_cost(
    spec: &IngredientSpec,
    candidate: &ProductCandidate,
    equivalences: &EquivalenceTable,
) -> f64 {
    match reconcile(spec, candidate, equivalences) {
        Ok(reconciliation) => purchase_cost(candidate, &reconciliation),
        // Required-side conversion already succeeded for the winner; a
        // per-vendor failure here can only be package-side, which falls
        // back inside reconcile. Price alone is the conservative floor.
        Err(_) => candidate.price,
    }
}
