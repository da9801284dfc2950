//! Consumption of externally generated feed formulations
//!
//! Generator output is untrusted text. It may be bare JSON, JSON inside a
//! fenced block, or JSON buried in narrative. Anything that cannot be read as
//! a complete formulation is replaced by the reference formulation for the
//! category, so callers always get a usable answer.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::calculator::select_composition;
use crate::error::FormulationError;
use crate::models::{
    AnimalCategory, Composition, FormulationProposal, FormulationRequest, ProposedIngredient,
};

/// Accepted deviation of the ingredient percentage total from 100
pub const PERCENT_TOLERANCE: f64 = 1.0;

/// Reference ingredients: (name, cost FCFA/kg, crude protein %)
const REFERENCE_INGREDIENTS: &[(&str, f64, f64)] = &[
    ("maize", 200.0, 8.5),
    ("soy", 350.0, 44.0),
    ("wheat bran", 120.0, 15.0),
    ("fish meal", 600.0, 60.0),
    ("mineral/vitamin premix", 900.0, 0.0),
    ("supplements", 900.0, 0.0),
];

// ```json { ... } ```
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
});

// Separators between groups of three digits are thousands separators; a comma
// or dot followed by one or two digits is a decimal point.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<sign>-)?(?:",
        r"(?P<grouped>[1-9]\d{0,2}(?:[ ,.\x{A0}]\d{3})+)(?:[.,](?P<gfrac>\d{1,2}))?\b",
        r"|(?P<int>\d+)(?:[.,](?P<frac>\d+))?",
        r")",
    ))
    .expect("amount pattern is valid")
});

/// Anything able to propose an alternative formulation as raw text
pub trait FormulationGenerator {
    fn propose(&self, request: &FormulationRequest) -> Result<String, FormulationError>;
}

/// Generator whose response has already been obtained
#[derive(Debug, Clone)]
pub struct CannedResponse {
    text: String,
}

impl CannedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl FormulationGenerator for CannedResponse {
    fn propose(&self, _request: &FormulationRequest) -> Result<String, FormulationError> {
        Ok(self.text.clone())
    }
}

/// Stand-in used when no generator is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl FormulationGenerator for Unavailable {
    fn propose(&self, _request: &FormulationRequest) -> Result<String, FormulationError> {
        Err(FormulationError::Generator(
            "no formulation generator configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulationSource {
    Generated,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formulation {
    pub proposal: FormulationProposal,
    pub source: FormulationSource,
}

impl Formulation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, FormulationSource::Fallback { .. })
    }
}

/// Ask the generator, falling back to the reference formulation on any failure
pub fn propose_or_default(
    generator: &dyn FormulationGenerator,
    request: &FormulationRequest,
) -> Formulation {
    let outcome = generator
        .propose(request)
        .and_then(|text| parse_proposal(&text));

    match outcome {
        Ok(proposal) => {
            if let Some(budget) = request.budget_fcfa_per_kg {
                if proposal.cost_per_kg > budget {
                    warn!(
                        cost_per_kg = proposal.cost_per_kg,
                        budget, "generated formulation exceeds budget"
                    );
                }
            }
            debug!(ingredients = proposal.ingredients.len(), "using generated formulation");
            Formulation {
                proposal,
                source: FormulationSource::Generated,
            }
        }
        Err(e) => {
            warn!(category = %request.category, "formulation unavailable, using reference: {}", e);
            Formulation {
                proposal: default_formulation(request.category),
                source: FormulationSource::Fallback {
                    reason: e.to_string(),
                },
            }
        }
    }
}

/// Locate the first well-formed JSON object in generator text
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if matches!(serde_json::from_str::<Value>(trimmed), Ok(Value::Object(_))) {
        return Some(trimmed);
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            if matches!(serde_json::from_str::<Value>(m.as_str()), Ok(Value::Object(_))) {
                return Some(m.as_str());
            }
        }
    }

    for (start, _) in text.match_indices('{') {
        let candidate = &text[start..];
        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(_))) => return Some(&candidate[..stream.byte_offset()]),
            // Unclosed object: every later brace sits inside it
            Some(Err(e)) if e.is_eof() => break,
            _ => {}
        }
    }

    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProposal {
    #[serde(default)]
    ingredients: Vec<RawIngredient>,
    #[serde(default, alias = "nutritional_values")]
    nutritional_values: Option<Value>,
    #[serde(default, alias = "cost_per_kg")]
    cost_per_kg: Option<Value>,
    #[serde(default)]
    recommendations: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngredient {
    #[serde(default)]
    name: String,
    #[serde(default)]
    percentage: Option<Value>,
    #[serde(default, alias = "cost_per_kg")]
    cost_per_kg: Option<Value>,
}

/// Parse and sanity-check a generator response
pub fn parse_proposal(text: &str) -> Result<FormulationProposal, FormulationError> {
    let json = extract_json(text).ok_or(FormulationError::NoJson)?;
    let raw: RawProposal = serde_json::from_str(json)?;

    if raw.ingredients.is_empty() {
        return Err(FormulationError::Invalid("no ingredients".to_string()));
    }

    let mut ingredients = Vec::with_capacity(raw.ingredients.len());
    for item in raw.ingredients {
        let name = item.name.trim().to_string();
        if name.is_empty() {
            return Err(FormulationError::Invalid("ingredient without a name".to_string()));
        }

        let percentage = item
            .percentage
            .as_ref()
            .and_then(lenient_number)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| FormulationError::Invalid(format!("bad percentage for {}", name)))?;
        let cost_per_kg = item
            .cost_per_kg
            .as_ref()
            .and_then(lenient_number)
            .filter(|c| *c >= 0.0)
            .ok_or_else(|| FormulationError::Invalid(format!("bad cost for {}", name)))?;

        ingredients.push(ProposedIngredient {
            name,
            percentage,
            cost_per_kg,
        });
    }

    let total: f64 = ingredients.iter().map(|i| i.percentage).sum();
    if (total - 100.0).abs() > PERCENT_TOLERANCE {
        return Err(FormulationError::Invalid(format!(
            "ingredient percentages sum to {}",
            total
        )));
    }

    let cost_per_kg = raw
        .cost_per_kg
        .as_ref()
        .and_then(lenient_number)
        .filter(|c| *c >= 0.0)
        .unwrap_or_else(|| weighted_cost(&ingredients));

    let nutritional_values = match raw.nutritional_values {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    Ok(FormulationProposal {
        ingredients,
        nutritional_values,
        cost_per_kg,
        recommendations: recommendations_from(raw.recommendations),
    })
}

/// Reference formulation built from the category's composition template
pub fn default_formulation(category: AnimalCategory) -> FormulationProposal {
    let composition = Composition::parse(select_composition(category)).unwrap_or_default();

    let mut crude_protein = 0.0;
    let ingredients: Vec<ProposedIngredient> = composition
        .ingredients
        .into_iter()
        .map(|i| {
            let (cost, protein) = reference_ingredient(&i.name).unwrap_or((0.0, 0.0));
            crude_protein += protein * i.percentage / 100.0;
            ProposedIngredient {
                name: i.name,
                percentage: i.percentage,
                cost_per_kg: cost,
            }
        })
        .collect();

    let mut nutritional_values = Map::new();
    nutritional_values.insert(
        "crudeProteinPercent".to_string(),
        Value::from((crude_protein * 10.0).round() / 10.0),
    );

    FormulationProposal {
        cost_per_kg: weighted_cost(&ingredients),
        ingredients,
        nutritional_values,
        recommendations: vec![format!(
            "Reference formulation for {}; adjust prices to the local market.",
            category.label().to_lowercase()
        )],
    }
}

fn reference_ingredient(name: &str) -> Option<(f64, f64)> {
    REFERENCE_INGREDIENTS
        .iter()
        .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, cost, protein)| (*cost, *protein))
}

fn weighted_cost(ingredients: &[ProposedIngredient]) -> f64 {
    let cost: f64 = ingredients
        .iter()
        .map(|i| i.cost_per_kg * i.percentage / 100.0)
        .sum();
    (cost * 100.0).round() / 100.0
}

/// Numbers may arrive as JSON numbers or as strings like "18%" or "250 FCFA"
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// First number in `text`, e.g. "1,250 FCFA" -> 1250.0, "20,5 %" -> 20.5
fn parse_amount(text: &str) -> Option<f64> {
    let cap = AMOUNT_RE.captures(text)?;
    let whole = cap.name("grouped").or_else(|| cap.name("int"))?;

    let mut number: String = cap.name("sign").map_or("", |m| m.as_str()).to_string();
    number.extend(whole.as_str().chars().filter(char::is_ascii_digit));
    if let Some(frac) = cap.name("gfrac").or_else(|| cap.name("frac")) {
        number.push('.');
        number.push_str(frac.as_str());
    }
    number.parse().ok()
}

fn recommendations_from(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPOSAL: &str = r#"{
        "ingredients": [
            {"name": "maize", "percentage": 62, "costPerKg": 200},
            {"name": "cassava chips", "percentage": 10, "costPerKg": 90},
            {"name": "soy", "percentage": 23, "costPerKg": 350},
            {"name": "premix", "percentage": 5, "costPerKg": 900}
        ],
        "nutritionalValues": {"protein": 16.2, "energy": "3050 kcal/kg"},
        "costPerKg": 259,
        "recommendations": ["Introduce cassava gradually"]
    }"#;

    fn request(category: AnimalCategory) -> FormulationRequest {
        FormulationRequest {
            category,
            target_weight_kg: 90.0,
            budget_fcfa_per_kg: Some(240.0),
            available_ingredients: Some("maize, cassava".to_string()),
        }
    }

    #[test]
    fn test_extract_bare_json() {
        assert_eq!(extract_json("  {\"a\": 1}  "), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "Here is the mix:\n```json\n{\"a\": {\"b\": 2}}\n```\nEnjoy!";
        assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_extract_first_object_from_narrative() {
        let text = "Sure {not json} here: {\"a\": \"}\"} and also {\"b\": 2}. Thanks";
        assert_eq!(extract_json(text), Some("{\"a\": \"}\"}"));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json("[1, 2, 3]"), None);
        assert_eq!(extract_json("{ unterminated"), None);
    }

    #[test]
    fn test_extract_stops_at_unclosed_object() {
        let truncated = r#"Here you go: {"ingredients": [{"name": "maize"}"#;
        assert_eq!(extract_json(truncated), None);

        let nested = "{\"a\":".repeat(20_000);
        assert_eq!(extract_json(&nested), None);
    }

    #[test]
    fn test_parse_amount_separators() {
        assert_eq!(parse_amount("1,250 FCFA"), Some(1250.0));
        assert_eq!(parse_amount("1 250"), Some(1250.0));
        assert_eq!(parse_amount("about 12.500.000 FCFA"), Some(12_500_000.0));
        assert_eq!(parse_amount("1.250,50"), Some(1250.5));
        assert_eq!(parse_amount("1,250.5 FCFA/kg"), Some(1250.5));
        assert_eq!(parse_amount("1,25"), Some(1.25));
        assert_eq!(parse_amount("0,125"), Some(0.125));
        assert_eq!(parse_amount("3050 kcal/kg"), Some(3050.0));
        assert_eq!(parse_amount("-12"), Some(-12.0));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_parse_cost_with_thousands_separator() {
        let text = r#"{"ingredients": [
            {"name": "fish meal", "percentage": 100, "costPerKg": "1,250 FCFA"}
        ]}"#;
        let proposal = parse_proposal(text).unwrap();
        assert_eq!(proposal.ingredients[0].cost_per_kg, 1250.0);
        assert_eq!(proposal.cost_per_kg, 1250.0);
    }

    #[test]
    fn test_parse_proposal() {
        let text = format!("Based on your budget:\n{}\nGood luck.", PROPOSAL);
        let proposal = parse_proposal(&text).unwrap();

        assert_eq!(proposal.ingredients.len(), 4);
        assert_eq!(proposal.ingredients[1].name, "cassava chips");
        assert_eq!(proposal.cost_per_kg, 259.0);
        assert_eq!(proposal.nutritional_values["protein"], Value::from(16.2));
        assert_eq!(proposal.recommendations, vec!["Introduce cassava gradually"]);
    }

    #[test]
    fn test_parse_lenient_numbers_and_snake_case() {
        let text = r#"{"ingredients": [
            {"name": "maize", "percentage": "80%", "cost_per_kg": "200 FCFA"},
            {"name": "soy", "percentage": "20,0 %", "cost_per_kg": 350}
        ], "recommendations": "Mix well"}"#;
        let proposal = parse_proposal(text).unwrap();

        assert_eq!(proposal.ingredients[0].percentage, 80.0);
        assert_eq!(proposal.ingredients[1].percentage, 20.0);
        assert_eq!(proposal.ingredients[0].cost_per_kg, 200.0);
        // 0.8 * 200 + 0.2 * 350
        assert_eq!(proposal.cost_per_kg, 230.0);
        assert_eq!(proposal.recommendations, vec!["Mix well"]);
        assert!(proposal.nutritional_values.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_totals() {
        let text = r#"{"ingredients": [
            {"name": "maize", "percentage": 50, "costPerKg": 200},
            {"name": "soy", "percentage": 20, "costPerKg": 350}
        ]}"#;
        assert!(matches!(parse_proposal(text), Err(FormulationError::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(matches!(
            parse_proposal(r#"{"ingredients": []}"#),
            Err(FormulationError::Invalid(_))
        ));
        assert!(matches!(
            parse_proposal(r#"{"ingredients": [{"name": "maize", "percentage": 100}]}"#),
            Err(FormulationError::Invalid(_))
        ));
        assert!(matches!(
            parse_proposal(r#"{"ingredients": "maize and soy"}"#),
            Err(FormulationError::Malformed(_))
        ));
        assert!(matches!(parse_proposal("no idea"), Err(FormulationError::NoJson)));
    }

    #[test]
    fn test_default_formulations_are_complete() {
        for category in AnimalCategory::ALL {
            let proposal = default_formulation(category);
            let total: f64 = proposal.ingredients.iter().map(|i| i.percentage).sum();
            assert_eq!(total, 100.0, "{category}");
            assert!(proposal.ingredients.iter().all(|i| i.cost_per_kg > 0.0), "{category}");
            assert!(proposal.cost_per_kg > 0.0);
        }
    }

    #[test]
    fn test_default_formulation_values() {
        let piglet = default_formulation(AnimalCategory::Piglet);
        // 0.6*200 + 0.25*350 + 0.1*600 + 0.05*900
        assert_eq!(piglet.cost_per_kg, 312.5);
        assert_eq!(piglet.nutritional_values["crudeProteinPercent"], Value::from(22.1));

        let boar = default_formulation(AnimalCategory::Boar);
        // 0.7*200 + 0.2*350 + 0.05*120 + 0.05*900
        assert_eq!(boar.cost_per_kg, 261.0);
    }

    #[test]
    fn test_propose_or_default_uses_generated() {
        let generator = CannedResponse::new(PROPOSAL);
        let formulation = propose_or_default(&generator, &request(AnimalCategory::Fattening));
        assert_eq!(formulation.source, FormulationSource::Generated);
        assert_eq!(formulation.proposal.ingredients.len(), 4);
    }

    #[test]
    fn test_propose_or_default_falls_back_on_garbage() {
        let generator = CannedResponse::new("Sorry, I am unable to produce a formulation today.");
        let formulation = propose_or_default(&generator, &request(AnimalCategory::LactatingSow));
        assert!(formulation.is_fallback());
        assert_eq!(
            formulation.proposal,
            default_formulation(AnimalCategory::LactatingSow)
        );
    }

    #[test]
    fn test_propose_or_default_falls_back_without_generator() {
        let formulation = propose_or_default(&Unavailable, &request(AnimalCategory::Piglet));
        match formulation.source {
            FormulationSource::Fallback { reason } => {
                assert!(reason.contains("no formulation generator"))
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
}
