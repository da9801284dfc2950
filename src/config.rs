//! Engine configuration
//!
//! Loaded from an optional JSON file. Missing fields take their defaults;
//! a configured rate table replaces the built-in one and must cover every
//! category and stage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculator::{DEFAULT_UNIT_COST_FCFA_PER_KG, RationEngine};
use crate::error::ConfigError;
use crate::rate_table::{RateOverride, RateTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Feed price used for cost estimates
    pub unit_cost_fcfa_per_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_table: Option<Vec<RateOverride>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_cost_fcfa_per_kg: DEFAULT_UNIT_COST_FCFA_PER_KG,
            rate_table: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn with_unit_cost(mut self, unit_cost_fcfa_per_kg: f64) -> Self {
        self.unit_cost_fcfa_per_kg = unit_cost_fcfa_per_kg;
        self
    }

    /// Check the configuration and build the engine it describes
    pub fn build_engine(&self) -> Result<RationEngine, ConfigError> {
        let unit_cost = self.unit_cost_fcfa_per_kg;
        if !unit_cost.is_finite() || unit_cost <= 0.0 {
            return Err(ConfigError::InvalidUnitCost(unit_cost));
        }

        let table = match &self.rate_table {
            Some(rows) => RateTable::from_entries(rows.iter().copied())?,
            None => RateTable::builtin(),
        };

        Ok(RationEngine::new(table, unit_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimalCategory, PhysiologicalStage};

    #[test]
    fn test_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());

        let engine = config.build_engine().unwrap();
        assert_eq!(engine.unit_cost_fcfa_per_kg(), 250.0);
        assert_eq!(engine.table(), &RateTable::builtin());
    }

    #[test]
    fn test_invalid_unit_cost() {
        for cost in [0.0, -5.0, f64::NAN] {
            let err = EngineConfig::default().with_unit_cost(cost).build_engine().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidUnitCost(_)));
        }
    }

    #[test]
    fn test_partial_rate_table_is_fatal() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"rate_table": [
                {"category": "boar", "stage": "early",
                 "base_daily_rate_at_100kg": 2.5, "protein_percent": 14}
            ]}"#,
        )
        .unwrap();

        let err = config.build_engine().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRate {
                category: AnimalCategory::GestatingSow,
                stage: PhysiologicalStage::Early
            }
        ));
    }
}
