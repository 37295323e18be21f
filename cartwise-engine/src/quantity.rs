//! Quantity Reconciler
//!
//! Converts a required ingredient amount and the winning candidate's
//! package size into a purchasable quantity:
//!
//! - Discrete packages: `ceil(required_canonical / package_canonical)`,
//!   minimum 1, so the purchase always satisfies demand.
//! - Bulk/loose goods (priced per unit of measure): the exact fractional
//!   required amount, no rounding.
//!
//! Units convert through the canonical families in
//! [`cartwise_common::units`]; count-like retail units resolve through the
//! packaging-equivalence table with a recorded conversion note. An
//! unparsable package size falls back to a quantity of 1 with a warning
//! flag rather than failing the ingredient.

use cartwise_common::catalog::{IngredientSpec, ProductCandidate};
use cartwise_common::units::{to_canonical, CanonicalAmount, EquivalenceTable};
use tracing::debug;

use crate::error::EngineError;
use crate::types::{PurchaseQuantity, Reconciliation};

/// Reconcile the required amount against the winner's package size.
///
/// # Errors
///
/// - [`EngineError::InvalidQuantity`] for a zero/negative required amount
/// - [`EngineError::MalformedInput`] for an unrecognized required unit
///
/// Package-side problems never error; they fall back to one package with
/// the `fallback` flag set.
pub fn reconcile(
    spec: &IngredientSpec,
    winner: &ProductCandidate,
    table: &EquivalenceTable,
) -> Result<Reconciliation, EngineError> {
    let amount = spec.required_amount();
    if amount <= 0.0 {
        return Err(EngineError::InvalidQuantity {
            ingredient: spec.key.clone(),
            amount,
        });
    }

    let mut notes = Vec::new();
    let required = convert_required(spec, amount, table, &mut notes)?;

    let outcome = if winner.sold_by_measure {
        reconcile_bulk(spec, winner, required, table, notes)
    } else {
        reconcile_packaged(spec, winner, required, table, notes)
    };

    debug!(
        ingredient = %spec.key,
        product = %winner.id,
        quantity = ?outcome.quantity,
        fallback = outcome.fallback,
        "quantity reconciliation complete"
    );

    Ok(outcome)
}

/// Cost of purchasing the reconciled quantity of a candidate
pub fn purchase_cost(candidate: &ProductCandidate, reconciliation: &Reconciliation) -> f64 {
    match &reconciliation.quantity {
        PurchaseQuantity::Packages { count } => candidate.price * f64::from(*count),
        PurchaseQuantity::Bulk { amount, .. } => candidate.price * amount,
    }
}

fn convert_required(
    spec: &IngredientSpec,
    amount: f64,
    table: &EquivalenceTable,
    notes: &mut Vec<String>,
) -> Result<CanonicalAmount, EngineError> {
    let conversion =
        to_canonical(amount, &spec.unit, table).ok_or_else(|| EngineError::MalformedInput {
            ingredient: spec.key.clone(),
            detail: format!("unrecognized required unit '{}'", spec.unit),
        })?;
    if let Some(note) = conversion.note {
        notes.push(note);
    }
    Ok(conversion.canonical)
}

fn reconcile_bulk(
    spec: &IngredientSpec,
    winner: &ProductCandidate,
    required: CanonicalAmount,
    table: &EquivalenceTable,
    mut notes: Vec<String>,
) -> Reconciliation {
    // Per-unit canonical factor of the product's pricing unit
    let per_unit = match to_canonical(1.0, &winner.package_unit, table) {
        Some(conversion) if conversion.canonical.value > 0.0 => conversion,
        _ => {
            return fallback_one_package(
                spec,
                winner,
                required,
                notes,
                format!("unrecognized bulk pricing unit '{}'", winner.package_unit),
            )
        }
    };

    if per_unit.canonical.family != required.family {
        return fallback_one_package(
            spec,
            winner,
            required,
            notes,
            format!(
                "required unit family {:?} does not convert to bulk unit '{}'",
                required.family, winner.package_unit
            ),
        );
    }
    if let Some(note) = per_unit.note {
        notes.push(note);
    }

    let amount = required.value / per_unit.canonical.value;
    Reconciliation {
        quantity: PurchaseQuantity::Bulk {
            amount,
            unit: winner.package_unit.clone(),
        },
        required_canonical: required.value,
        package_canonical: None,
        family: Some(required.family),
        notes,
        fallback: false,
    }
}

fn reconcile_packaged(
    spec: &IngredientSpec,
    winner: &ProductCandidate,
    required: CanonicalAmount,
    table: &EquivalenceTable,
    mut notes: Vec<String>,
) -> Reconciliation {
    if winner.package_amount <= 0.0 {
        return fallback_one_package(
            spec,
            winner,
            required,
            notes,
            format!("non-positive package amount {}", winner.package_amount),
        );
    }

    let package = match to_canonical(winner.package_amount, &winner.package_unit, table) {
        Some(conversion) if conversion.canonical.value > 0.0 => conversion,
        _ => {
            return fallback_one_package(
                spec,
                winner,
                required,
                notes,
                format!("unrecognized package unit '{}'", winner.package_unit),
            )
        }
    };

    if package.canonical.family != required.family {
        return fallback_one_package(
            spec,
            winner,
            required,
            notes,
            format!(
                "required unit family {:?} does not convert to package unit '{}'",
                required.family, winner.package_unit
            ),
        );
    }
    if let Some(note) = package.note {
        notes.push(note);
    }

    let count = (required.value / package.canonical.value).ceil().max(1.0) as u32;
    Reconciliation {
        quantity: PurchaseQuantity::Packages { count },
        required_canonical: required.value,
        package_canonical: Some(package.canonical.value),
        family: Some(required.family),
        notes,
        fallback: false,
    }
}

/// The recoverable path for unparsable package data: one package, warning
/// flagged, reasoning preserved in the notes.
fn fallback_one_package(
    spec: &IngredientSpec,
    winner: &ProductCandidate,
    required: CanonicalAmount,
    mut notes: Vec<String>,
    detail: String,
) -> Reconciliation {
    let error = EngineError::UnparsablePackageSize {
        product: winner.id.clone(),
        detail,
    };
    debug!(ingredient = %spec.key, %error, "falling back to single package");
    notes.push(format!("{error}; defaulted to 1 package"));
    Reconciliation {
        quantity: PurchaseQuantity::Packages { count: 1 },
        required_canonical: required.value,
        package_canonical: None,
        family: Some(required.family),
        notes,
        fallback: true,
    }
}
