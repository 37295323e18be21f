//! Catalog domain model
//!
//! Boundary types shared between the decision engine and its collaborators:
//! ingredient specs from the extraction subsystem, product candidates and
//! vendor records from the catalog subsystem. All types are immutable value
//! objects once materialized; the engine references them read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One requested ingredient, as produced by the extraction collaborator.
///
/// Immutable once produced. `scaled_amount` is the servings-adjusted
/// quantity; when present it supersedes `amount` for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientSpec {
    /// Canonical ingredient key (normalized identifier)
    pub key: String,
    /// Human-readable display name
    pub display_name: String,
    /// Required amount in `unit`
    pub amount: f64,
    /// Required unit label ("lb", "cup", "each", ...)
    pub unit: String,
    /// Optional form tag (e.g., "powder", "whole")
    #[serde(default)]
    pub form: Option<String>,
    /// Servings-adjusted amount, when the request was scaled
    #[serde(default)]
    pub scaled_amount: Option<f64>,
}

impl IngredientSpec {
    /// The amount reconciliation operates on (servings-scaled when available)
    pub fn required_amount(&self) -> f64 {
        self.scaled_amount.unwrap_or(self.amount)
    }
}

/// Packaging material classification used by scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Packaging {
    /// Glass or minimal packaging
    Glass,
    /// Plastic packaging
    Plastic,
    /// No packaging information available
    #[default]
    Unspecified,
}

/// Pesticide-residue classification of an ingredient, derived from the
/// catalog's high-residue list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidueClass {
    /// On the high-residue list: organic sourcing is rewarded
    High,
    /// Not on the list: sourcing is residue-neutral
    Low,
}

/// One purchasable product from the catalog snapshot.
///
/// Owned by the catalog collaborator; the engine never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCandidate {
    /// Product id, unique within the snapshot
    pub id: String,
    /// Product title
    pub title: String,
    /// Brand name, when known
    #[serde(default)]
    pub brand: Option<String>,
    /// Canonical ingredient key this product is tagged with
    pub ingredient_key: String,
    /// Price per package (or per `package_unit` for bulk goods)
    pub price: f64,
    /// Package size in `package_unit`
    pub package_amount: f64,
    /// Package unit label
    pub package_unit: String,
    /// Certified-organic flag
    #[serde(default)]
    pub organic: bool,
    /// Owning vendor id
    pub vendor_id: String,
    /// In-season flag; `None` means unknown
    #[serde(default)]
    pub seasonal: Option<bool>,
    /// Distance from the shopper in distance units; `None` means
    /// domestic with no locality label
    #[serde(default)]
    pub distance: Option<f64>,
    /// Packaging classification
    #[serde(default)]
    pub packaging: Packaging,
    /// Active recall flag
    #[serde(default)]
    pub recalled: bool,
    /// Vendor currently stocks this product
    #[serde(default = "default_true")]
    pub in_stock: bool,
    /// Optional form tag (e.g., "powder", "whole")
    #[serde(default)]
    pub form: Option<String>,
    /// Bulk/loose goods priced per `package_unit` with no discrete package;
    /// purchased in exact fractional amounts
    #[serde(default)]
    pub sold_by_measure: bool,
}

fn default_true() -> bool {
    true
}

/// One vendor from the vendor registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInfo {
    /// Vendor id
    pub id: String,
    /// Display name
    pub name: String,
    /// Vendor type ("supermarket", "farmers_market", ...)
    #[serde(default)]
    pub vendor_type: Option<String>,
    /// Fulfillment-estimate string for display ("same day", "2-3 days", ...)
    #[serde(default)]
    pub fulfillment_estimate: Option<String>,
    /// Preferred-order hint (lower sorts earlier in tie-breaks)
    #[serde(default)]
    pub preferred_order: Option<u32>,
}

/// Vendor registry: vendor id → vendor record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorRegistry {
    /// Registered vendors
    pub vendors: Vec<VendorInfo>,
}

impl VendorRegistry {
    /// Look up a vendor by id
    pub fn get(&self, vendor_id: &str) -> Option<&VendorInfo> {
        self.vendors.iter().find(|v| v.id == vendor_id)
    }

    /// Whether the registry knows this vendor id
    pub fn contains(&self, vendor_id: &str) -> bool {
        self.get(vendor_id).is_some()
    }

    /// Vendor ids in lexical order (stable iteration for planning)
    pub fn ids_sorted(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.vendors.iter().map(|v| v.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

/// Read-only catalog snapshot scoped to the requested vendors.
///
/// Carries the candidate pool plus the two catalog-side registries the
/// engine consults: ingredient synonyms (alias → canonical key) and the
/// high-residue ingredient list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Snapshot identity, for audit correlation
    #[serde(default)]
    pub snapshot_id: Uuid,
    /// When the snapshot was taken
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
    /// All candidates in scope
    pub candidates: Vec<ProductCandidate>,
    /// Ingredient synonym registry: alias → canonical key
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    /// Canonical keys of high-residue ingredients
    #[serde(default)]
    pub high_residue_keys: BTreeSet<String>,
}

impl CatalogSnapshot {
    /// Resolve an ingredient key through the synonym registry.
    ///
    /// Unregistered keys resolve to themselves (exact match).
    pub fn canonicalize<'a>(&'a self, key: &'a str) -> &'a str {
        self.synonyms.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Residue classification for an ingredient key (synonym-aware)
    pub fn residue_class(&self, key: &str) -> ResidueClass {
        if self.high_residue_keys.contains(self.canonicalize(key)) {
            ResidueClass::High
        } else {
            ResidueClass::Low
        }
    }
}
