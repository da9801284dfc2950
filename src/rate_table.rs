//! Base feeding rates and protein targets per category and stage

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{AnimalCategory, PhysiologicalStage, RateTableEntry};

const STAGES: usize = PhysiologicalStage::ALL.len();
const CATEGORIES: usize = AnimalCategory::ALL.len();

type Rows = [[RateTableEntry; STAGES]; CATEGORIES];

// Rows follow AnimalCategory::index, columns PhysiologicalStage::index.
const BUILTIN_RATES: Rows = [
    // gestating sow
    [
        RateTableEntry::new(2.2, 14.0),
        RateTableEntry::new(2.5, 14.0),
        RateTableEntry::new(3.0, 16.0),
    ],
    // lactating sow
    [
        RateTableEntry::new(5.0, 18.0),
        RateTableEntry::new(6.5, 18.0),
        RateTableEntry::new(5.5, 16.0),
    ],
    // boar
    [
        RateTableEntry::new(2.5, 14.0),
        RateTableEntry::new(2.8, 14.0),
        RateTableEntry::new(2.5, 14.0),
    ],
    // piglet
    [
        RateTableEntry::new(0.3, 22.0),
        RateTableEntry::new(0.8, 20.0),
        RateTableEntry::new(1.5, 18.0),
    ],
    // fattening
    [
        RateTableEntry::new(1.8, 18.0),
        RateTableEntry::new(2.5, 16.0),
        RateTableEntry::new(3.2, 14.0),
    ],
];

/// One row of a rate table supplied through configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateOverride {
    pub category: AnimalCategory,
    pub stage: PhysiologicalStage,
    pub base_daily_rate_at_100kg: f64,
    pub protein_percent: f64,
}

/// Immutable rate lookup, total over every (category, stage) pair
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rows: Rows,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RateTable {
    pub const fn builtin() -> Self {
        Self {
            rows: BUILTIN_RATES,
        }
    }

    /// Build a table from configured rows. Every pair must appear exactly once.
    pub fn from_entries<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = RateOverride>,
    {
        let mut slots: [[Option<RateTableEntry>; STAGES]; CATEGORIES] =
            [[None; STAGES]; CATEGORIES];

        for row in entries {
            let (category, stage) = (row.category, row.stage);
            check_positive(
                category,
                stage,
                "base_daily_rate_at_100kg",
                row.base_daily_rate_at_100kg,
            )?;
            check_positive(category, stage, "protein_percent", row.protein_percent)?;

            let slot = &mut slots[category.index()][stage.index()];
            if slot.is_some() {
                return Err(ConfigError::DuplicateRate { category, stage });
            }
            *slot = Some(RateTableEntry::new(
                row.base_daily_rate_at_100kg,
                row.protein_percent,
            ));
        }

        let mut rows = BUILTIN_RATES;
        for category in AnimalCategory::ALL {
            for stage in PhysiologicalStage::ALL {
                rows[category.index()][stage.index()] = slots[category.index()][stage.index()]
                    .ok_or(ConfigError::MissingRate { category, stage })?;
            }
        }

        Ok(Self { rows })
    }

    pub fn lookup(&self, category: AnimalCategory, stage: PhysiologicalStage) -> RateTableEntry {
        self.rows[category.index()][stage.index()]
    }

    /// All entries in category then stage order
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (AnimalCategory, PhysiologicalStage, RateTableEntry)> + '_ {
        AnimalCategory::ALL.into_iter().flat_map(move |category| {
            PhysiologicalStage::ALL
                .into_iter()
                .map(move |stage| (category, stage, self.lookup(category, stage)))
        })
    }
}

fn check_positive(
    category: AnimalCategory,
    stage: PhysiologicalStage,
    name: &str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate {
            category,
            stage,
            reason: format!("{} = {}", name, value),
        })
    }
}
