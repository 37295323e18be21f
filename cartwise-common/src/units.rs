//! Measurement units and canonical conversion
//!
//! Provides consistent unit handling across all Cartwise modules. Every
//! recognized unit belongs to exactly one family and converts to that
//! family's canonical unit:
//!
//! - Mass → grams
//! - Volume → milliliters
//! - Count → each
//!
//! Count-like retail units with no fixed definition ("bunch", "head", ...)
//! are not parsed here; they resolve through an [`EquivalenceTable`] that
//! maps them to an approximate mass in grams.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical unit family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    /// Canonical unit: gram
    Mass,
    /// Canonical unit: milliliter
    Volume,
    /// Canonical unit: each
    Count,
}

impl UnitFamily {
    /// Name of the family's canonical unit
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            UnitFamily::Mass => "g",
            UnitFamily::Volume => "ml",
            UnitFamily::Count => "each",
        }
    }
}

/// An amount expressed in a family's canonical unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAmount {
    /// Unit family the amount belongs to
    pub family: UnitFamily,
    /// Value in the family's canonical unit (grams, milliliters, or each)
    pub value: f64,
}

// Conversion factors to the family's canonical unit
const GRAMS_PER_KILOGRAM: f64 = 1000.0;
const GRAMS_PER_OUNCE: f64 = 28.3495;
const GRAMS_PER_POUND: f64 = 453.592;
const ML_PER_LITER: f64 = 1000.0;
const ML_PER_TEASPOON: f64 = 4.92892;
const ML_PER_TABLESPOON: f64 = 14.7868;
const ML_PER_FLUID_OUNCE: f64 = 29.5735;
const ML_PER_CUP: f64 = 236.588;
const ML_PER_PINT: f64 = 473.176;
const ML_PER_QUART: f64 = 946.353;
const ML_PER_GALLON: f64 = 3785.41;
const EACH_PER_DOZEN: f64 = 12.0;

/// Parse a unit label into its family and canonical conversion factor.
///
/// Matching is case-insensitive and tolerant of plural/abbreviated forms.
/// Returns `None` for unrecognized labels (including count-like retail
/// units such as "bunch" — see [`EquivalenceTable`]).
///
/// # Examples
///
/// ```
/// use cartwise_common::units::{parse_unit, UnitFamily};
///
/// assert_eq!(parse_unit("lb"), Some((UnitFamily::Mass, 453.592)));
/// assert_eq!(parse_unit("Liters"), Some((UnitFamily::Volume, 1000.0)));
/// assert_eq!(parse_unit("dozen"), Some((UnitFamily::Count, 12.0)));
/// assert_eq!(parse_unit("bunch"), None);
/// ```
pub fn parse_unit(label: &str) -> Option<(UnitFamily, f64)> {
    let normalized = label.trim().to_ascii_lowercase();
    let (family, factor) = match normalized.as_str() {
        "g" | "gram" | "grams" => (UnitFamily::Mass, 1.0),
        "kg" | "kilogram" | "kilograms" => (UnitFamily::Mass, GRAMS_PER_KILOGRAM),
        "oz" | "ounce" | "ounces" => (UnitFamily::Mass, GRAMS_PER_OUNCE),
        "lb" | "lbs" | "pound" | "pounds" => (UnitFamily::Mass, GRAMS_PER_POUND),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
            (UnitFamily::Volume, 1.0)
        }
        "l" | "liter" | "liters" | "litre" | "litres" => (UnitFamily::Volume, ML_PER_LITER),
        "tsp" | "teaspoon" | "teaspoons" => (UnitFamily::Volume, ML_PER_TEASPOON),
        "tbsp" | "tablespoon" | "tablespoons" => (UnitFamily::Volume, ML_PER_TABLESPOON),
        "fl oz" | "floz" | "fluid ounce" | "fluid ounces" => {
            (UnitFamily::Volume, ML_PER_FLUID_OUNCE)
        }
        "cup" | "cups" => (UnitFamily::Volume, ML_PER_CUP),
        "pint" | "pints" | "pt" => (UnitFamily::Volume, ML_PER_PINT),
        "quart" | "quarts" | "qt" => (UnitFamily::Volume, ML_PER_QUART),
        "gallon" | "gallons" | "gal" => (UnitFamily::Volume, ML_PER_GALLON),
        "each" | "ea" | "count" | "piece" | "pieces" | "unit" | "units" => {
            (UnitFamily::Count, 1.0)
        }
        "dozen" => (UnitFamily::Count, EACH_PER_DOZEN),
        _ => return None,
    };
    Some((family, factor))
}

/// Result of a canonical conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The converted amount
    pub canonical: CanonicalAmount,
    /// Set when the conversion went through the equivalence table
    /// (e.g., "1 bunch ≈ 340 g")
    pub note: Option<String>,
}

/// Convert an amount in a named unit to its canonical form.
///
/// Recognized units convert directly. Unrecognized units fall back to the
/// equivalence table (mapping count-like retail units to grams) and record
/// a conversion note. Returns `None` when neither path applies.
///
/// # Examples
///
/// ```
/// use cartwise_common::units::{to_canonical, EquivalenceTable, UnitFamily};
///
/// let table = EquivalenceTable::with_defaults();
/// let conv = to_canonical(2.0, "lb", &table).unwrap();
/// assert_eq!(conv.canonical.family, UnitFamily::Mass);
/// assert!((conv.canonical.value - 907.184).abs() < 1e-6);
/// assert!(conv.note.is_none());
///
/// let conv = to_canonical(2.0, "bunch", &table).unwrap();
/// assert_eq!(conv.canonical.family, UnitFamily::Mass);
/// assert_eq!(conv.canonical.value, 680.0);
/// assert!(conv.note.is_some());
/// ```
pub fn to_canonical(amount: f64, unit: &str, table: &EquivalenceTable) -> Option<Conversion> {
    if let Some((family, factor)) = parse_unit(unit) {
        return Some(Conversion {
            canonical: CanonicalAmount {
                family,
                value: amount * factor,
            },
            note: None,
        });
    }
    let grams = table.grams_for(unit)?;
    Some(Conversion {
        canonical: CanonicalAmount {
            family: UnitFamily::Mass,
            value: amount * grams,
        },
        note: Some(format!(
            "converted via packaging equivalence: 1 {} ≈ {} g",
            unit.trim().to_ascii_lowercase(),
            grams
        )),
    })
}

// Default mass equivalences for count-like retail units (grams)
const DEFAULT_EQUIVALENCES: &[(&str, f64)] = &[
    ("bunch", 340.0),
    ("head", 600.0),
    ("clove", 5.0),
    ("stick", 113.0),
    ("loaf", 450.0),
];

/// Mass equivalences for count-like retail units that have no fixed
/// definition ("bunch", "head", ...). Keys are normalized to lowercase.
///
/// Ships with compiled-in defaults; configuration may override or extend
/// individual entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceTable(BTreeMap<String, f64>);

impl EquivalenceTable {
    /// Empty table (no equivalences)
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Table populated with the compiled-in defaults
    pub fn with_defaults() -> Self {
        let mut map = BTreeMap::new();
        for (unit, grams) in DEFAULT_EQUIVALENCES {
            map.insert((*unit).to_string(), *grams);
        }
        Self(map)
    }

    /// Insert or replace an equivalence (unit label → grams)
    pub fn set(&mut self, unit: &str, grams: f64) {
        self.0.insert(unit.trim().to_ascii_lowercase(), grams);
    }

    /// Look up the gram equivalence for a unit label, if registered
    pub fn grams_for(&self, unit: &str) -> Option<f64> {
        let normalized = unit.trim().to_ascii_lowercase();
        // Tolerate trivial plurals ("bunches" → "bunch")
        if let Some(grams) = self.0.get(&normalized) {
            return Some(*grams);
        }
        let singular = normalized
            .strip_suffix("es")
            .or_else(|| normalized.strip_suffix('s'))?;
        self.0.get(singular).copied()
    }
}

impl Default for EquivalenceTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
