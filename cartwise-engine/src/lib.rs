//! # Cartwise Decision Engine
//!
//! Recommends one product per requested ingredient from a catalog snapshot,
//! labels it with a price/ethics tier, reconciles purchase quantities
//! across unit families, and partitions the basket across the fewest
//! vendors that can fulfill it.
//!
//! # Architecture
//! Per-ingredient pipeline, run concurrently over a read-only snapshot:
//! - [`filter`]: structural eligibility (recalls, stock, form)
//! - [`scoring`]: deterministic multi-factor score with named deltas
//! - [`tiers`]: winner, neighbors, tier label
//! - [`quantity`]: unit-aware package-count reconciliation
//!
//! Followed by two sequential passes over the assembled results:
//! - [`planner`]: greedy set cover across vendors
//! - [`trace`]: write-once audit projection
//!
//! [`narrative`] is the optional post-processing seam for external
//! explanation generators; it can never alter a decision.
//!
//! The engine performs no network, file, or storage I/O. All inputs and
//! outputs are in-memory values (see [`engine::DecisionRequest`] and
//! [`types::DecisionSet`]).

pub mod engine;
pub mod error;
pub mod filter;
pub mod narrative;
pub mod planner;
pub mod quantity;
pub mod scoring;
pub mod tiers;
pub mod trace;
pub mod types;

pub use engine::{DecisionEngine, DecisionRequest};
pub use error::EngineError;
pub use types::{DecisionItem, DecisionSet, Tier, VendorPlan};
