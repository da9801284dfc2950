//! Data models for ration requests, rate entries and results

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimalCategory {
    #[serde(rename = "sow-gestating")]
    GestatingSow,
    #[serde(rename = "sow-lactating")]
    LactatingSow,
    #[serde(rename = "boar")]
    Boar,
    #[serde(rename = "piglet")]
    Piglet,
    #[serde(rename = "fattening")]
    Fattening,
}

impl AnimalCategory {
    pub const ALL: [AnimalCategory; 5] = [
        AnimalCategory::GestatingSow,
        AnimalCategory::LactatingSow,
        AnimalCategory::Boar,
        AnimalCategory::Piglet,
        AnimalCategory::Fattening,
    ];

    /// Ordinal used to index the rate table rows
    pub const fn index(self) -> usize {
        match self {
            AnimalCategory::GestatingSow => 0,
            AnimalCategory::LactatingSow => 1,
            AnimalCategory::Boar => 2,
            AnimalCategory::Piglet => 3,
            AnimalCategory::Fattening => 4,
        }
    }

    /// Wire name, as accepted on input
    pub const fn as_str(self) -> &'static str {
        match self {
            AnimalCategory::GestatingSow => "sow-gestating",
            AnimalCategory::LactatingSow => "sow-lactating",
            AnimalCategory::Boar => "boar",
            AnimalCategory::Piglet => "piglet",
            AnimalCategory::Fattening => "fattening",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AnimalCategory::GestatingSow => "Gestating sow",
            AnimalCategory::LactatingSow => "Lactating sow",
            AnimalCategory::Boar => "Boar",
            AnimalCategory::Piglet => "Piglet",
            AnimalCategory::Fattening => "Fattening pig",
        }
    }
}

impl fmt::Display for AnimalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AnimalCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysiologicalStage {
    Early,
    Mid,
    Late,
}

impl PhysiologicalStage {
    pub const ALL: [PhysiologicalStage; 3] = [
        PhysiologicalStage::Early,
        PhysiologicalStage::Mid,
        PhysiologicalStage::Late,
    ];

    pub const fn index(self) -> usize {
        match self {
            PhysiologicalStage::Early => 0,
            PhysiologicalStage::Mid => 1,
            PhysiologicalStage::Late => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PhysiologicalStage::Early => "early",
            PhysiologicalStage::Mid => "mid",
            PhysiologicalStage::Late => "late",
        }
    }

    /// Stage wording depends on the life cycle of the category
    pub const fn label_for(self, category: AnimalCategory) -> &'static str {
        use AnimalCategory::*;
        use PhysiologicalStage::*;

        match (category, self) {
            (GestatingSow, Early) => "Early gestation",
            (GestatingSow, Mid) => "Mid gestation",
            (GestatingSow, Late) => "Late gestation",
            (LactatingSow, Early) => "Early lactation",
            (LactatingSow, Mid) => "Peak lactation",
            (LactatingSow, Late) => "Late lactation",
            (Boar, Early) => "Young boar",
            (Boar, Mid) => "Breeding boar",
            (Boar, Late) => "Mature boar",
            (Piglet, Early) => "Post-weaning",
            (Piglet, Mid) => "Nursery",
            (Piglet, Late) => "Starter-grower",
            (Fattening, Early) => "Grower",
            (Fattening, Mid) => "Finisher",
            (Fattening, Late) => "Pre-slaughter",
        }
    }
}

impl fmt::Display for PhysiologicalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhysiologicalStage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PhysiologicalStage::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant(wanted.to_string()))
    }
}

/// Value that did not match any known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// Unvalidated form fields, exactly as the user typed them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRationInput {
    pub category: String,
    pub stage: String,
    pub weight_kg: String,
    pub headcount: String,
}

impl RawRationInput {
    pub fn new(
        category: impl Into<String>,
        stage: impl Into<String>,
        weight_kg: impl Into<String>,
        headcount: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            stage: stage.into(),
            weight_kg: weight_kg.into(),
            headcount: headcount.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RationRequest {
    pub category: AnimalCategory,
    pub stage: PhysiologicalStage,
    pub weight_kg: f64,
    pub headcount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTableEntry {
    /// kg/day per animal at the 100 kg reference weight
    pub base_daily_rate_at_100kg: f64,
    pub protein_percent: f64,
}

impl RateTableEntry {
    pub const fn new(base_daily_rate_at_100kg: f64, protein_percent: f64) -> Self {
        Self {
            base_daily_rate_at_100kg,
            protein_percent,
        }
    }
}

/// Result of a ration calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationResult {
    pub daily_kg: f64,
    pub monthly_kg: u64,
    pub protein_percent: f64,
    pub composition_description: String,
    pub estimated_cost_fcfa: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub percentage: f64,
}

static COMPOSITION_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*%\s*(.+?)\s*$").expect("composition pattern is valid")
});

/// Ingredient breakdown of a composition description
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    pub ingredients: Vec<Ingredient>,
}

impl Composition {
    /// Parse a description such as "70% maize, 20% soy, 5% wheat bran"
    pub fn parse(description: &str) -> Option<Self> {
        let mut ingredients = Vec::new();
        for part in description.split(',') {
            let cap = COMPOSITION_PART_RE.captures(part)?;
            ingredients.push(Ingredient {
                name: cap[2].to_string(),
                percentage: cap[1].parse().ok()?,
            });
        }

        if ingredients.is_empty() {
            None
        } else {
            Some(Self { ingredients })
        }
    }

    pub fn total_percentage(&self) -> f64 {
        self.ingredients.iter().map(|i| i.percentage).sum()
    }
}

/// Input for an external formulation generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationRequest {
    pub category: AnimalCategory,
    pub target_weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_fcfa_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_ingredients: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedIngredient {
    pub name: String,
    pub percentage: f64,
    pub cost_per_kg: f64,
}

/// Alternative composition proposed by a generator (or the fallback)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationProposal {
    pub ingredients: Vec<ProposedIngredient>,
    /// Free-form nutrient figures, e.g. {"protein": 16.5, "energy": "3100 kcal"}
    pub nutritional_values: serde_json::Map<String, serde_json::Value>,
    pub cost_per_kg: f64,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_wire_names() {
        assert_eq!("sow-gestating".parse(), Ok(AnimalCategory::GestatingSow));
        assert_eq!(" Piglet ".parse(), Ok(AnimalCategory::Piglet));
        assert!("cow".parse::<AnimalCategory>().is_err());
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, c) in AnimalCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        for (i, s) in PhysiologicalStage::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_category_serde_uses_wire_names() {
        let json = serde_json::to_string(&AnimalCategory::LactatingSow).unwrap();
        assert_eq!(json, "\"sow-lactating\"");
        let stage: PhysiologicalStage = serde_json::from_str("\"late\"").unwrap();
        assert_eq!(stage, PhysiologicalStage::Late);
    }

    #[test]
    fn test_composition_parse() {
        let comp = Composition::parse("60% maize, 25% soy, 10% fish meal, 5% supplements").unwrap();
        assert_eq!(comp.ingredients.len(), 4);
        assert_eq!(comp.ingredients[2].name, "fish meal");
        assert_eq!(comp.total_percentage(), 100.0);
    }

    #[test]
    fn test_composition_parse_reuses_pattern_across_calls() {
        for _ in 0..3 {
            let comp = Composition::parse("12.5% maize, 87.5% soy").unwrap();
            assert_eq!(comp.ingredients[0].percentage, 12.5);
            assert_eq!(comp.total_percentage(), 100.0);
        }
    }

    #[test]
    fn test_composition_parse_rejects_free_text() {
        assert!(Composition::parse("mostly maize").is_none());
        assert!(Composition::parse("").is_none());
    }
}
