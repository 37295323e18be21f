//! End-to-end decision engine tests
//!
//! Covers the documented scenarios (high-residue scoring, package
//! reconciliation, vendor partitioning, uncovered ingredients) plus the
//! engine-wide properties: score bounds, permutation invariance, and the
//! assigned ∪ unfulfillable = input invariant.

mod helpers;

use cartwise_common::config::EngineConfig;
use cartwise_engine::engine::DecisionEngine;
use cartwise_engine::types::{PurchaseQuantity, Tier, UnfulfillableReason};
use helpers::{candidate, ingredient, ingredient_amount, request};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn engine() -> DecisionEngine {
    DecisionEngine::new(EngineConfig::default())
}

// ============================================================================
// Scenario: high-residue ingredient, organic/local vs conventional/import
// ============================================================================

#[tokio::test]
async fn test_high_residue_organic_local_beats_conventional_import() {
    // Package sizes deliberately unparsable so the unit-price rank factor
    // stays out of the arithmetic; the scenario isolates safety + locality.
    let mut organic = candidate("spinach-organic", "spinach", "va", 3.99);
    organic.organic = true;
    organic.distance = Some(10.0);
    organic.package_unit = "bag".to_string();
    let mut conventional = candidate("spinach-conventional", "spinach", "va", 1.99);
    conventional.distance = Some(5000.0);
    conventional.package_unit = "bag".to_string();

    let mut req = request(
        vec![ingredient("spinach")],
        vec![organic, conventional],
        &["va"],
    );
    req.snapshot.high_residue_keys.insert("spinach".to_string());

    let decision = engine().decide_traced(req).await;

    assert_eq!(decision.items.len(), 1);
    let item = &decision.items[0];
    assert_eq!(item.winner.candidate.id, "spinach-organic");
    assert!(item.high_residue);
    assert_eq!(item.winner.breakdown.total, 95.0); // 50 + 20 + 25
    assert_eq!(item.winner.breakdown.safety, 20.0);
    assert_eq!(item.winner.breakdown.locality, 25.0);
    assert_eq!(item.cheaper_neighbor.as_deref(), Some("spinach-conventional"));

    let trace = decision.trace.unwrap();
    let loser = trace.ingredients[0]
        .scored
        .iter()
        .find(|s| s.candidate.id == "spinach-conventional")
        .unwrap();
    assert_eq!(loser.breakdown.total, 15.0); // 50 − 20 − 15
    assert_eq!(trace.ingredients[0].margin, Some(80.0));
}

// ============================================================================
// Scenario: package-count reconciliation
// ============================================================================

#[tokio::test]
async fn test_six_pounds_of_two_pound_packages_needs_three() {
    let mut packaged = candidate("flour-2lb", "flour", "va", 4.50);
    packaged.package_amount = 2.0;

    let req = request(
        vec![ingredient_amount("flour", 6.0, "lb")],
        vec![packaged],
        &["va"],
    );
    let decision = engine().decide(req).await;

    let item = &decision.items[0];
    assert_eq!(
        item.reconciliation.quantity,
        PurchaseQuantity::Packages { count: 3 }
    );
    assert!(!item.reconciliation.fallback);
    assert!((decision.totals.recommended_total - 13.50).abs() < 1e-9);
}

#[tokio::test]
async fn test_bulk_goods_use_exact_fraction() {
    let mut bulk = candidate("oats-bulk", "oats", "va", 2.00); // $2 per lb
    bulk.sold_by_measure = true;

    let req = request(
        vec![ingredient_amount("oats", 1.5, "lb")],
        vec![bulk],
        &["va"],
    );
    let decision = engine().decide(req).await;

    match &decision.items[0].reconciliation.quantity {
        PurchaseQuantity::Bulk { amount, unit } => {
            assert!((amount - 1.5).abs() < 1e-9);
            assert_eq!(unit, "lb");
        }
        other => panic!("expected bulk purchase, got {other:?}"),
    }
    assert!((decision.totals.recommended_total - 3.0).abs() < 1e-9);
}

// ============================================================================
// Scenario: vendor partitioning
// ============================================================================

#[tokio::test]
async fn test_disjoint_vendors_get_disjoint_assignments() {
    let mut ingredients = Vec::new();
    let mut candidates = Vec::new();
    for i in 0..6 {
        let key = format!("big{i}");
        candidates.push(candidate(&format!("{key}-p"), &key, "va", 2.0));
        ingredients.push(ingredient(&key));
    }
    for i in 0..2 {
        let key = format!("small{i}");
        candidates.push(candidate(&format!("{key}-p"), &key, "vb", 2.0));
        ingredients.push(ingredient(&key));
    }

    let decision = engine()
        .decide(request(ingredients, candidates, &["va", "vb"]))
        .await;

    assert_eq!(decision.plan.assignments.len(), 2);
    assert_eq!(decision.plan.assignments[0].vendor_id, "va");
    assert_eq!(decision.plan.assignments[0].ingredient_keys.len(), 6);
    assert_eq!(decision.plan.assignments[1].vendor_id, "vb");
    assert_eq!(decision.plan.assignments[1].ingredient_keys.len(), 2);
    assert!(decision.plan.unfulfillable.is_empty());
    assert_eq!(decision.totals.per_vendor.len(), 2);
}

#[tokio::test]
async fn test_unstocked_ingredient_lands_in_unfulfillable() {
    let ingredients = vec![
        ingredient("spinach"),
        ingredient("basil"),
        ingredient("saffron"), // nobody stocks it
    ];
    let candidates = vec![
        candidate("spinach-p", "spinach", "va", 2.0),
        candidate("basil-p", "basil", "va", 3.0),
    ];

    let decision = engine()
        .decide(request(ingredients, candidates, &["va"]))
        .await;

    assert_eq!(decision.items.len(), 2);
    assert_eq!(decision.plan.unfulfillable.len(), 1);
    let missing = &decision.plan.unfulfillable[0];
    assert_eq!(missing.ingredient_key, "saffron");
    assert_eq!(missing.reason, UnfulfillableReason::NoVendorCoverage);

    let mut assigned = decision.plan.assigned_keys();
    assigned.sort_unstable();
    assert_eq!(assigned, vec!["basil", "spinach"]);
}

// ============================================================================
// Error routing
// ============================================================================

#[tokio::test]
async fn test_invalid_quantity_skips_only_that_ingredient() {
    let ingredients = vec![
        ingredient_amount("spinach", 0.0, "lb"),
        ingredient("basil"),
    ];
    let candidates = vec![
        candidate("spinach-p", "spinach", "va", 2.0),
        candidate("basil-p", "basil", "va", 3.0),
    ];

    let decision = engine()
        .decide(request(ingredients, candidates, &["va"]))
        .await;

    // No DecisionItem for the invalid ingredient, batch otherwise intact
    assert_eq!(decision.items.len(), 1);
    assert_eq!(decision.items[0].ingredient_key, "basil");
    let invalid = decision
        .plan
        .unfulfillable
        .iter()
        .find(|u| u.ingredient_key == "spinach")
        .unwrap();
    assert_eq!(invalid.reason, UnfulfillableReason::InvalidQuantity);
    assert!(decision.gaps.iter().any(|g| g.ingredient_key == "spinach"));
}

#[tokio::test]
async fn test_malformed_spec_rejected_per_ingredient() {
    let mut bad = ingredient("pepper");
    bad.unit = String::new();
    let ingredients = vec![bad, ingredient("basil")];
    let candidates = vec![
        candidate("pepper-p", "pepper", "va", 2.0),
        candidate("basil-p", "basil", "va", 3.0),
    ];

    let decision = engine()
        .decide(request(ingredients, candidates, &["va"]))
        .await;

    assert_eq!(decision.items.len(), 1);
    let rejected = decision
        .plan
        .unfulfillable
        .iter()
        .find(|u| u.ingredient_key == "pepper")
        .unwrap();
    assert_eq!(rejected.reason, UnfulfillableReason::MalformedInput);
}

#[tokio::test]
async fn test_unparsable_package_warns_but_decides() {
    let mut odd = candidate("cheese-wheel", "cheese", "va", 8.0);
    odd.package_unit = "wheel".to_string();

    let decision = engine()
        .decide(request(vec![ingredient("cheese")], vec![odd], &["va"]))
        .await;

    assert_eq!(decision.items.len(), 1);
    let item = &decision.items[0];
    assert_eq!(
        item.reconciliation.quantity,
        PurchaseQuantity::Packages { count: 1 }
    );
    assert!(item.reconciliation.fallback);
    assert!(decision.gaps.iter().any(|g| g.ingredient_key == "cheese"));
}

// ============================================================================
// Engine-wide properties
// ============================================================================

#[tokio::test]
async fn test_all_scores_within_bounds() {
    let mut candidates = Vec::new();
    for (i, price) in [0.49, 1.99, 3.99, 7.99, 24.99].iter().enumerate() {
        let mut c = candidate(&format!("spinach-{i}"), "spinach", "va", *price);
        c.organic = i % 2 == 0;
        c.seasonal = Some(i % 3 == 0);
        c.distance = Some([5.0, 100.0, 1000.0, 5000.0, 20.0][i]);
        c.packaging = match i % 3 {
            0 => cartwise_common::catalog::Packaging::Glass,
            1 => cartwise_common::catalog::Packaging::Plastic,
            _ => cartwise_common::catalog::Packaging::Unspecified,
        };
        candidates.push(c);
    }

    let mut req = request(vec![ingredient("spinach")], candidates, &["va"]);
    req.snapshot.high_residue_keys.insert("spinach".to_string());

    let decision = engine().decide_traced(req).await;
    let trace = decision.trace.unwrap();
    for scored in &trace.ingredients[0].scored {
        assert!(
            (0.0..=100.0).contains(&scored.breakdown.total),
            "score {} out of bounds for {}",
            scored.breakdown.total,
            scored.candidate.id
        );
    }
}

#[tokio::test]
async fn test_decision_is_permutation_invariant() {
    let mut base = Vec::new();
    for (i, price) in [1.49, 1.99, 2.49, 3.29, 3.99, 5.99].iter().enumerate() {
        let mut c = candidate(&format!("spinach-{i}"), "spinach", "va", *price);
        c.organic = i % 2 == 0;
        c.distance = Some([10.0, 80.0, 500.0, 4000.0, 30.0, 120.0][i]);
        base.push(c);
    }

    let reference = engine()
        .decide(request(
            vec![ingredient("spinach")],
            base.clone(),
            &["va"],
        ))
        .await;
    let reference_item = &reference.items[0];

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let mut shuffled = base.clone();
        shuffled.shuffle(&mut rng);
        let decision = engine()
            .decide(request(vec![ingredient("spinach")], shuffled, &["va"]))
            .await;
        let item = &decision.items[0];
        assert_eq!(item.winner.candidate.id, reference_item.winner.candidate.id);
        assert_eq!(item.tier, reference_item.tier);
        assert_eq!(
            item.winner.breakdown.total,
            reference_item.winner.breakdown.total
        );
        assert_eq!(item.cheaper_neighbor, reference_item.cheaper_neighbor);
        assert_eq!(item.premium_neighbor, reference_item.premium_neighbor);
    }
}

#[tokio::test]
async fn test_assigned_union_unfulfillable_equals_input() {
    let ingredients = vec![
        ingredient("spinach"),
        ingredient("basil"),
        ingredient("saffron"),              // no candidates
        ingredient_amount("kale", -2.0, "lb"), // invalid quantity
        ingredient("oats"),
    ];
    let candidates = vec![
        candidate("spinach-p", "spinach", "va", 2.0),
        candidate("basil-p", "basil", "vb", 3.0),
        candidate("kale-p", "kale", "va", 2.5),
        candidate("oats-p", "oats", "vb", 4.0),
    ];

    let decision = engine()
        .decide(request(ingredients, candidates, &["va", "vb"]))
        .await;

    let mut covered: Vec<String> = decision
        .plan
        .assigned_keys()
        .into_iter()
        .map(str::to_string)
        .chain(
            decision
                .plan
                .unfulfillable
                .iter()
                .map(|u| u.ingredient_key.clone()),
        )
        .collect();
    covered.sort_unstable();

    let mut expected = vec!["basil", "kale", "oats", "saffron", "spinach"];
    expected.sort_unstable();
    assert_eq!(covered, expected);

    // No duplicates across the two sets
    let mut deduped = covered.clone();
    deduped.dedup();
    assert_eq!(covered, deduped);
}

#[tokio::test]
async fn test_tier_reflects_price_position() {
    // Winner engineered into the top tercile: organic + local + seasonal
    // overcome its worst-rank unit price.
    let mut premium = candidate("spinach-premium", "spinach", "va", 6.00);
    premium.organic = true;
    premium.distance = Some(5.0);
    premium.seasonal = Some(true);
    let cheap = candidate("spinach-cheap", "spinach", "va", 1.00);
    let mid = candidate("spinach-mid", "spinach", "va", 2.00);

    let mut req = request(
        vec![ingredient("spinach")],
        vec![cheap, mid, premium],
        &["va"],
    );
    req.snapshot.high_residue_keys.insert("spinach".to_string());

    let decision = engine().decide(req).await;
    let item = &decision.items[0];
    assert_eq!(item.winner.candidate.id, "spinach-premium");
    assert_eq!(item.tier, Tier::Conscious);
}

#[tokio::test]
async fn test_form_relaxation_reported_as_gap() {
    let mut powder = candidate("ginger-powder", "ginger", "va", 3.0);
    powder.form = Some("powder".to_string());
    let mut spec = ingredient("ginger");
    spec.form = Some("whole".to_string());

    let decision = engine()
        .decide(request(vec![spec], vec![powder], &["va"]))
        .await;

    assert_eq!(decision.items.len(), 1);
    assert!(decision
        .gaps
        .iter()
        .any(|g| g.ingredient_key == "ginger" && g.message.contains("relaxed")));
}

#[tokio::test]
async fn test_synonym_retrieval_end_to_end() {
    let green_onion = candidate("go-1", "green_onion", "va", 1.50);
    let mut req = request(vec![ingredient("scallion")], vec![green_onion], &["va"]);
    req.snapshot
        .synonyms
        .insert("scallion".to_string(), "green_onion".to_string());

    let decision = engine().decide(req).await;
    assert_eq!(decision.items.len(), 1);
    assert_eq!(decision.items[0].ingredient_key, "green_onion");
    assert_eq!(decision.items[0].winner.candidate.id, "go-1");
}

#[tokio::test]
async fn test_savings_potential_from_cheaper_neighbors() {
    let mut organic = candidate("spinach-organic", "spinach", "va", 4.00);
    organic.organic = true;
    organic.distance = Some(10.0);
    let conventional = candidate("spinach-conventional", "spinach", "va", 2.00);

    let mut req = request(
        vec![ingredient("spinach")],
        vec![organic, conventional],
        &["va"],
    );
    req.snapshot.high_residue_keys.insert("spinach".to_string());

    let decision = engine().decide(req).await;
    let item = &decision.items[0];
    assert_eq!(item.winner.candidate.id, "spinach-organic");
    assert!((decision.totals.recommended_total - 4.00).abs() < 1e-9);
    assert!((decision.totals.cheapest_total - 2.00).abs() < 1e-9);
    assert!((decision.totals.savings_potential - 2.00).abs() < 1e-9);
}
