//! Error taxonomy for the decision engine
//!
//! Every variant is scoped to a single ingredient; none aborts a batch.
//! The engine catches these per ingredient and routes them into the
//! decision set's gaps list and/or the vendor plan's unfulfillable list.

use thiserror::Error;

/// Per-ingredient decision errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Required amount is zero or negative — fatal to this ingredient only
    #[error("invalid quantity for '{ingredient}': required amount {amount} must be positive")]
    InvalidQuantity { ingredient: String, amount: f64 },

    /// Package size could not be interpreted — recoverable, the reconciler
    /// falls back to a quantity of 1 with a warning
    #[error("unparsable package size for product '{product}': {detail}")]
    UnparsablePackageSize { product: String, detail: String },

    /// The snapshot holds no candidates tagged with the ingredient key
    #[error("no candidates available for '{ingredient}'")]
    NoCandidatesAvailable { ingredient: String },

    /// Filtering eliminated every retrieved candidate (even after the
    /// one-shot form relaxation)
    #[error("all {count} candidates eliminated for '{ingredient}'")]
    AllCandidatesEliminated { ingredient: String, count: usize },

    /// No vendor covers the ingredient during assignment planning
    #[error("no vendor coverage for '{ingredient}'")]
    NoVendorCoverage { ingredient: String },

    /// The total tie-break order failed to separate two distinct
    /// candidates. Unreachable for well-formed input (unique product ids);
    /// any occurrence is an internal-logic defect.
    #[error("tie-break exhausted for '{ingredient}': candidates '{left}' and '{right}' are indistinguishable")]
    TieBreakExhausted {
        ingredient: String,
        left: String,
        right: String,
    },

    /// Malformed ingredient spec at the boundary (empty key, empty or
    /// unrecognized required unit) — rejected outright for this ingredient
    #[error("malformed ingredient spec '{ingredient}': {detail}")]
    MalformedInput { ingredient: String, detail: String },
}
