//! Shared builders for decision engine integration tests

use cartwise_common::catalog::{
    CatalogSnapshot, IngredientSpec, Packaging, ProductCandidate, VendorInfo, VendorRegistry,
};
use cartwise_engine::engine::DecisionRequest;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// A one-pound packaged candidate with neutral attributes
pub fn candidate(id: &str, key: &str, vendor: &str, price: f64) -> ProductCandidate {
    ProductCandidate {
        id: id.to_string(),
        title: format!("Product {id}"),
        brand: None,
        ingredient_key: key.to_string(),
        price,
        package_amount: 1.0,
        package_unit: "lb".to_string(),
        organic: false,
        vendor_id: vendor.to_string(),
        seasonal: None,
        distance: None,
        packaging: Packaging::Unspecified,
        recalled: false,
        in_stock: true,
        form: None,
        sold_by_measure: false,
    }
}

/// A one-pound ingredient spec
pub fn ingredient(key: &str) -> IngredientSpec {
    ingredient_amount(key, 1.0, "lb")
}

pub fn ingredient_amount(key: &str, amount: f64, unit: &str) -> IngredientSpec {
    IngredientSpec {
        key: key.to_string(),
        display_name: key.to_string(),
        amount,
        unit: unit.to_string(),
        form: None,
        scaled_amount: None,
    }
}

pub fn vendor(id: &str, name: &str) -> VendorInfo {
    VendorInfo {
        id: id.to_string(),
        name: name.to_string(),
        vendor_type: Some("supermarket".to_string()),
        fulfillment_estimate: Some("same day".to_string()),
        preferred_order: None,
    }
}

pub fn registry(ids: &[&str]) -> VendorRegistry {
    VendorRegistry {
        vendors: ids
            .iter()
            .map(|id| vendor(id, &format!("Vendor {}", id.to_uppercase())))
            .collect(),
    }
}

pub fn snapshot(candidates: Vec<ProductCandidate>) -> CatalogSnapshot {
    CatalogSnapshot {
        snapshot_id: Uuid::nil(),
        taken_at: None,
        candidates,
        synonyms: BTreeMap::new(),
        high_residue_keys: BTreeSet::new(),
    }
}

pub fn request(
    ingredients: Vec<IngredientSpec>,
    candidates: Vec<ProductCandidate>,
    vendor_ids: &[&str],
) -> DecisionRequest {
    DecisionRequest {
        ingredients,
        snapshot: snapshot(candidates),
        vendors: registry(vendor_ids),
    }
}
