//! Core value types for the decision engine
//!
//! Every type here is an immutable value object created once per decision
//! run. The only post-creation write permitted anywhere is the optional
//! narrative annotation on [`DecisionItem`], attached after the
//! deterministic decision is final (see [`crate::narrative`]).

use cartwise_common::catalog::ProductCandidate;
use cartwise_common::units::UnitFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Scoring
// ============================================================================

/// Component-level score breakdown, one named delta per factor.
///
/// `total` is always `clamp(base + Σ deltas, 0, 100)`; each factor is
/// individually assertable in audits and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Base score every considered candidate starts from
    pub base: f32,
    /// Residue classification × organic sourcing delta
    pub safety: f32,
    /// In-season bonus
    pub seasonality: f32,
    /// Distance-band delta
    pub locality: f32,
    /// Packaging material delta
    pub packaging: f32,
    /// Unit-price rank delta (best +10 … worst −10, interpolated)
    pub unit_price: f32,
    /// Price-outlier penalty
    pub outlier: f32,
    /// Clamped total
    pub total: f32,
}

impl ScoreBreakdown {
    /// Named non-base factors with their deltas, for driver extraction
    pub fn factor_deltas(&self) -> [(&'static str, f32); 6] {
        [
            ("safety", self.safety),
            ("seasonality", self.seasonality),
            ("locality", self.locality),
            ("packaging", self.packaging),
            ("unit_price", self.unit_price),
            ("outlier", self.outlier),
        ]
    }
}

/// A considered candidate with its score breakdown.
///
/// Created once per decision run, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The underlying catalog candidate
    pub candidate: ProductCandidate,
    /// Per-factor score breakdown
    pub breakdown: ScoreBreakdown,
    /// Price per canonical unit, when the package size was convertible
    pub unit_price: Option<f64>,
}

// ============================================================================
// Filtering
// ============================================================================

/// Why the filter removed a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    /// Active recall on the product
    Recalled,
    /// Owning vendor does not currently stock it
    OutOfStock,
    /// Form tag incompatible with the ingredient's required form
    FormMismatch,
}

/// A candidate the filter removed, paired with the reason.
///
/// Consumed only by the decision trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EliminatedCandidate {
    /// The eliminated catalog candidate
    pub candidate: ProductCandidate,
    /// Elimination reason code
    pub reason: EliminationReason,
}

// ============================================================================
// Tiers and quantities
// ============================================================================

/// Price/ethics tier label for a winning candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Winner sits in the bottom third of the considered price distribution
    Cheaper,
    /// Winner sits in the middle third
    Balanced,
    /// Winner sits in the top third
    Conscious,
}

impl Tier {
    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Cheaper => "cheaper",
            Tier::Balanced => "balanced",
            Tier::Conscious => "conscious",
        }
    }
}

/// How much of the winning product to purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseQuantity {
    /// Discrete packages: `count × package_amount package_unit`
    Packages {
        /// Number of packages (≥ 1)
        count: u32,
    },
    /// Bulk/loose goods: exact fractional amount in the product's unit
    Bulk {
        /// Amount to purchase in `unit`
        amount: f64,
        /// The product's pricing unit
        unit: String,
    },
}

/// Quantity reconciliation outcome for one decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The purchase quantity
    pub quantity: PurchaseQuantity,
    /// Required amount in canonical units
    pub required_canonical: f64,
    /// Package size in canonical units (absent for bulk goods and for the
    /// unparsable-package fallback)
    pub package_canonical: Option<f64>,
    /// Unit family the reconciliation ran in (absent for the fallback)
    pub family: Option<UnitFamily>,
    /// Conversion notes (equivalence-table usage, family mismatches)
    pub notes: Vec<String>,
    /// Set when the package size was unparsable and the quantity fell back
    /// to 1
    pub fallback: bool,
}

// ============================================================================
// Decisions
// ============================================================================

/// One ingredient's final outcome.
///
/// Created once per ingredient per run. Only `narrative` may be attached
/// after creation; everything else is final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionItem {
    /// Canonical ingredient key
    pub ingredient_key: String,
    /// Ingredient display name
    pub display_name: String,
    /// The winning candidate
    pub winner: ScoredCandidate,
    /// Lowest-priced considered candidate strictly below the winner's price
    pub cheaper_neighbor: Option<String>,
    /// Highest-scoring organic candidate distinct from the winner
    pub premium_neighbor: Option<String>,
    /// Price/ethics tier label
    pub tier: Tier,
    /// Quantity reconciliation
    pub reconciliation: Reconciliation,
    /// Ingredient is on the high-residue list
    pub high_residue: bool,
    /// Winner is in season
    pub in_season: bool,
    /// Optional post-hoc narrative annotation (non-authoritative)
    #[serde(default)]
    pub narrative: Option<String>,
}

/// Why an ingredient could not be fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfulfillableReason {
    /// No vendor covers the ingredient (none retrieved, all eliminated, or
    /// planning left it uncovered)
    NoVendorCoverage,
    /// Required amount was zero or negative
    InvalidQuantity,
    /// Ingredient spec was malformed at the boundary
    MalformedInput,
}

/// One unfulfillable ingredient with its reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfulfillableIngredient {
    /// Canonical ingredient key
    pub ingredient_key: String,
    /// Reason code
    pub reason: UnfulfillableReason,
    /// Human-readable cause detail
    pub detail: String,
}

// ============================================================================
// Vendor planning
// ============================================================================

/// Ingredients assigned to one vendor by the planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorAssignment {
    /// Vendor id
    pub vendor_id: String,
    /// Vendor display name
    pub vendor_name: String,
    /// Assigned ingredient keys (lexical order)
    pub ingredient_keys: Vec<String>,
    /// Subtotal priced from the vendor-local best candidates
    pub subtotal: f64,
    /// Why the greedy pass picked this vendor
    pub rationale: String,
}

/// The vendor-partitioned plan: who buys what from where.
///
/// Invariant: assigned ∪ unfulfillable = the full input ingredient set,
/// with no duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorPlan {
    /// Assignments in greedy selection order
    pub assignments: Vec<VendorAssignment>,
    /// Ingredients no vendor can fulfill, with reasons
    pub unfulfillable: Vec<UnfulfillableIngredient>,
}

impl VendorPlan {
    /// All assigned ingredient keys across every assignment
    pub fn assigned_keys(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .flat_map(|a| a.ingredient_keys.iter().map(String::as_str))
            .collect()
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Aggregate basket totals across all decided ingredients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of winner purchase costs
    pub recommended_total: f64,
    /// Sum of cheaper-neighbor purchase costs (winner cost where no
    /// cheaper neighbor exists)
    pub cheapest_total: f64,
    /// `recommended_total − cheapest_total`
    pub savings_potential: f64,
    /// Vendor id → assignment subtotal
    pub per_vendor: BTreeMap<String, f64>,
}

/// A per-ingredient warning or data-gap note surfaced to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    /// Canonical ingredient key the note is about
    pub ingredient_key: String,
    /// Note text
    pub message: String,
}

/// The complete result of one decision run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSet {
    /// Per-ingredient outcomes, in input order
    pub items: Vec<DecisionItem>,
    /// Vendor-partitioned plan
    pub plan: VendorPlan,
    /// Aggregate totals
    pub totals: Totals,
    /// Warnings and data-gap notes
    pub gaps: Vec<Gap>,
    /// Optional audit trace (a projection; never feeds back into decisions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<crate::trace::DecisionTrace>,
}

// ============================================================================
// Tests
// ============================================================================
