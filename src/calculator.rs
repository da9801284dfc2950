//! Ration calculator logic
//!
//! Scales the 100 kg reference rate to the actual body weight, projects the
//! daily total over a month and prices the monthly mass. Displayed figures are
//! rounded, but monthly mass and cost are derived from the unrounded daily
//! total so they match the numbers farmers already see.

use std::fmt;

use tracing::debug;

use crate::models::{AnimalCategory, RateTableEntry, RationRequest, RationResult, RawRationInput};
use crate::rate_table::RateTable;
use crate::validate::{self, ValidationErrors};

pub const REFERENCE_WEIGHT_KG: f64 = 100.0;
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const DEFAULT_UNIT_COST_FCFA_PER_KG: f64 = 250.0;

const PIGLET_COMPOSITION: &str = "60% maize, 25% soy, 10% fish meal, 5% supplements";
const LACTATION_COMPOSITION: &str = "65% maize, 25% soy, 5% wheat bran, 5% mineral/vitamin premix";
const STANDARD_COMPOSITION: &str = "70% maize, 20% soy, 5% wheat bran, 5% mineral/vitamin premix";

/// Daily and monthly ration for the whole group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledRation {
    pub daily_kg: f64,
    pub monthly_kg: u64,
    pub daily_unrounded: f64,
    pub monthly_unrounded: f64,
}

/// Sub-linear weight multiplier applied to the reference rate
pub fn weight_factor(weight_kg: f64) -> f64 {
    (weight_kg / REFERENCE_WEIGHT_KG).sqrt()
}

/// Scale a reference rate to `weight_kg` and `headcount`
pub fn scale(entry: &RateTableEntry, weight_kg: f64, headcount: u32) -> ScaledRation {
    let daily_per_animal = entry.base_daily_rate_at_100kg * weight_factor(weight_kg);
    let daily_unrounded = daily_per_animal * f64::from(headcount);
    let monthly_unrounded = daily_unrounded * DAYS_PER_MONTH;

    ScaledRation {
        daily_kg: round_to(daily_unrounded, 1),
        monthly_kg: monthly_unrounded.round() as u64,
        daily_unrounded,
        monthly_unrounded,
    }
}

/// Canonical ingredient mix for a category
pub fn select_composition(category: AnimalCategory) -> &'static str {
    match category {
        AnimalCategory::Piglet => PIGLET_COMPOSITION,
        AnimalCategory::LactatingSow => LACTATION_COMPOSITION,
        AnimalCategory::GestatingSow | AnimalCategory::Boar | AnimalCategory::Fattening => {
            STANDARD_COMPOSITION
        }
    }
}

/// Cost of the monthly mass. Pass the unrounded monthly figure.
pub fn estimate_cost(monthly_unrounded: f64, unit_cost_fcfa_per_kg: f64) -> u64 {
    (monthly_unrounded * unit_cost_fcfa_per_kg).round() as u64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Stateless calculation pipeline over a fixed rate table and unit cost
#[derive(Debug, Clone, PartialEq)]
pub struct RationEngine {
    table: RateTable,
    unit_cost_fcfa_per_kg: f64,
}

impl Default for RationEngine {
    fn default() -> Self {
        Self::new(RateTable::builtin(), DEFAULT_UNIT_COST_FCFA_PER_KG)
    }
}

impl RationEngine {
    pub fn new(table: RateTable, unit_cost_fcfa_per_kg: f64) -> Self {
        Self {
            table,
            unit_cost_fcfa_per_kg,
        }
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn unit_cost_fcfa_per_kg(&self) -> f64 {
        self.unit_cost_fcfa_per_kg
    }

    /// Calculate the ration for a typed request. Weight and headcount are
    /// re-checked since `RationRequest` can be built without `validate`.
    pub fn calculate(&self, request: &RationRequest) -> Result<RationResult, ValidationErrors> {
        validate::validate_request(request)?;

        let entry = self.table.lookup(request.category, request.stage);
        let scaled = scale(&entry, request.weight_kg, request.headcount);
        let estimated_cost_fcfa =
            estimate_cost(scaled.monthly_unrounded, self.unit_cost_fcfa_per_kg);

        debug!(
            category = %request.category,
            stage = %request.stage,
            weight_kg = request.weight_kg,
            headcount = request.headcount,
            daily_unrounded = scaled.daily_unrounded,
            monthly_unrounded = scaled.monthly_unrounded,
            "calculated ration"
        );

        Ok(RationResult {
            daily_kg: scaled.daily_kg,
            monthly_kg: scaled.monthly_kg,
            protein_percent: entry.protein_percent,
            composition_description: select_composition(request.category).to_string(),
            estimated_cost_fcfa,
        })
    }

    /// Validate raw fields, then calculate
    pub fn calculate_raw(&self, input: &RawRationInput) -> Result<RationResult, ValidationErrors> {
        let request = validate::validate(input)?;
        self.calculate(&request)
    }
}

impl fmt::Display for RationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ration ===")?;
        writeln!(f, "Daily:       {:.1} kg", self.daily_kg)?;
        writeln!(f, "Monthly:     {} kg", self.monthly_kg)?;
        writeln!(f, "Protein:     {}%", self.protein_percent)?;
        writeln!(f, "Composition: {}", self.composition_description)?;
        write!(f, "Cost:        {} FCFA/month", self.estimated_cost_fcfa)
    }
}
