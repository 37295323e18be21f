//! Engine configuration loading
//!
//! Configuration resolution follows the priority order used across the
//! workspace binaries:
//! 1. Explicit path argument (highest priority)
//! 2. `CARTWISE_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/cartwise/config.toml`)
//! 4. Compiled-in defaults (fallback)
//!
//! Scoring weights are deliberately NOT configurable: they are part of the
//! scoring contract and live as constants in the engine crate.

use crate::units::EquivalenceTable;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CARTWISE_CONFIG";

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The user's designated primary vendor; wins planner tie-breaks
    #[serde(default)]
    pub primary_vendor: Option<String>,
    /// Vendor ids in descending priority for planner tie-breaks
    #[serde(default)]
    pub vendor_priority: Vec<String>,
    /// Overrides/extensions for the packaging-equivalence table
    /// (unit label → grams)
    #[serde(default)]
    pub packaging_equivalences: BTreeMap<String, f64>,
}

impl EngineConfig {
    /// The packaging-equivalence table: compiled-in defaults merged with
    /// any configured overrides
    pub fn equivalence_table(&self) -> EquivalenceTable {
        let mut table = EquivalenceTable::with_defaults();
        for (unit, grams) in &self.packaging_equivalences {
            table.set(unit, *grams);
        }
        table
    }

    /// Planner priority rank for a vendor id (lower ranks first).
    ///
    /// Primary vendor → 0; listed vendors → 1 + list position; everything
    /// else → `usize::MAX` (falls through to later tie-break keys).
    pub fn vendor_rank(&self, vendor_id: &str) -> usize {
        if self.primary_vendor.as_deref() == Some(vendor_id) {
            return 0;
        }
        match self.vendor_priority.iter().position(|v| v == vendor_id) {
            Some(pos) => pos + 1,
            None => usize::MAX,
        }
    }
}

/// Load engine configuration using the 4-tier priority order.
///
/// An explicitly named file (argument or environment variable) that fails
/// to load is an error; a missing default-path file silently falls back to
/// compiled-in defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<EngineConfig> {
    // Priority 1: explicit path argument
    if let Some(path) = explicit_path {
        return read_config_file(path);
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return read_config_file(Path::new(&path));
    }

    // Priority 3: platform config directory
    if let Some(path) = default_config_path() {
        if path.exists() {
            return read_config_file(&path);
        }
    }

    // Priority 4: compiled-in defaults
    debug!("no config file found, using compiled-in defaults");
    Ok(EngineConfig::default())
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cartwise").join("config.toml"))
}

fn read_config_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let config: EngineConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "loaded engine configuration");
    Ok(config)
}
