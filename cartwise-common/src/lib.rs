//! # Cartwise Common Library
//!
//! Shared code for the Cartwise decision engine and its callers:
//! - Catalog domain model (ingredients, product candidates, vendors)
//! - Measurement units and canonical conversion
//! - Engine configuration loading
//! - Common error types

pub mod catalog;
pub mod config;
pub mod error;
pub mod units;

pub use error::{Error, Result};
pub use units::UnitFamily;
