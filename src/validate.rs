//! Input validation for ration requests
//!
//! Every field is checked so the caller can report all problems at once.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{AnimalCategory, PhysiologicalStage, RationRequest, RawRationInput};

pub const MIN_WEIGHT_KG: f64 = 1.0;
pub const MAX_WEIGHT_KG: f64 = 500.0;
pub const MIN_HEADCOUNT: u32 = 1;
pub const MAX_HEADCOUNT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Category,
    Stage,
    WeightKg,
    Headcount,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Stage => "stage",
            Field::WeightKg => "weight_kg",
            Field::Headcount => "headcount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation messages, one per invalid field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate raw form fields into a typed request
pub fn validate(input: &RawRationInput) -> Result<RationRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let category = match input.category.parse::<AnimalCategory>() {
        Ok(c) => Some(c),
        Err(_) => {
            let known: Vec<_> = AnimalCategory::ALL.iter().map(|c| c.as_str()).collect();
            errors.add(
                Field::Category,
                format!(
                    "unknown category '{}', expected one of: {}",
                    input.category.trim(),
                    known.join(", ")
                ),
            );
            None
        }
    };

    let stage = match input.stage.parse::<PhysiologicalStage>() {
        Ok(s) => Some(s),
        Err(_) => {
            errors.add(
                Field::Stage,
                format!(
                    "unknown stage '{}', expected one of: early, mid, late",
                    input.stage.trim()
                ),
            );
            None
        }
    };

    let weight_kg = match parse_weight(&input.weight_kg) {
        Some(w) => check_weight(w, &mut errors),
        None => {
            errors.add(Field::WeightKg, "weight must be a number");
            None
        }
    };

    let headcount = match parse_headcount(&input.headcount) {
        Some(h) => check_headcount(h, &mut errors),
        None => {
            errors.add(Field::Headcount, "headcount must be a whole number");
            None
        }
    };

    match (category, stage, weight_kg, headcount) {
        (Some(category), Some(stage), Some(weight_kg), Some(headcount)) if errors.is_empty() => {
            Ok(RationRequest {
                category,
                stage,
                weight_kg,
                headcount,
            })
        }
        _ => Err(errors),
    }
}

/// Re-check numeric bounds on an already typed request
pub fn validate_request(request: &RationRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_weight(request.weight_kg, &mut errors);
    check_headcount(i64::from(request.headcount), &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_weight(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|w| w.is_finite())
}

fn parse_headcount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('+') {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

fn check_weight(weight: f64, errors: &mut ValidationErrors) -> Option<f64> {
    if (MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight) {
        Some(weight)
    } else {
        errors.add(
            Field::WeightKg,
            format!(
                "weight must be between {} and {} kg, got {}",
                MIN_WEIGHT_KG, MAX_WEIGHT_KG, weight
            ),
        );
        None
    }
}

fn check_headcount(headcount: i64, errors: &mut ValidationErrors) -> Option<u32> {
    if (i64::from(MIN_HEADCOUNT)..=i64::from(MAX_HEADCOUNT)).contains(&headcount) {
        u32::try_from(headcount).ok()
    } else {
        errors.add(
            Field::Headcount,
            format!(
                "headcount must be between {} and {}, got {}",
                MIN_HEADCOUNT, MAX_HEADCOUNT, headcount
            ),
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(category: &str, stage: &str, weight: &str, headcount: &str) -> RawRationInput {
        RawRationInput::new(category, stage, weight, headcount)
    }

    #[test]
    fn test_valid_input() {
        let req = validate(&raw("sow-gestating", "mid", "180", "1")).unwrap();
        assert_eq!(req.category, AnimalCategory::GestatingSow);
        assert_eq!(req.stage, PhysiologicalStage::Mid);
        assert_eq!(req.weight_kg, 180.0);
        assert_eq!(req.headcount, 1);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate(&raw("boar", "early", "1", "1")).is_ok());
        assert!(validate(&raw("boar", "early", "500", "1000")).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        for (w, h, field) in [
            ("0", "1", Field::WeightKg),
            ("501", "1", Field::WeightKg),
            ("100", "0", Field::Headcount),
            ("100", "1001", Field::Headcount),
        ] {
            let errs = validate(&raw("boar", "early", w, h)).unwrap_err();
            assert_eq!(errs.len(), 1, "weight={w} headcount={h}");
            assert!(errs.contains(field));
        }
    }

    #[test]
    fn test_all_fields_reported() {
        let errs = validate(&raw("cow", "ancient", "heavy", "2.5")).unwrap_err();
        assert_eq!(errs.len(), 4);
        assert!(errs.get(Field::Category).unwrap().contains("cow"));
        assert_eq!(errs.get(Field::WeightKg), Some("weight must be a number"));
        assert_eq!(errs.get(Field::Headcount), Some("headcount must be a whole number"));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        assert!(validate(&raw("boar", "early", "NaN", "1")).is_err());
        assert!(validate(&raw("boar", "early", "inf", "1")).is_err());
        assert!(validate(&raw("boar", "early", "", "1")).is_err());
    }

    #[test]
    fn test_comma_decimal_weight() {
        let req = validate(&raw("piglet", "early", "7,5", "10")).unwrap();
        assert_eq!(req.weight_kg, 7.5);
    }

    #[test]
    fn test_negative_headcount_rejected() {
        let errs = validate(&raw("piglet", "early", "8", "-3")).unwrap_err();
        assert!(errs.get(Field::Headcount).unwrap().contains("-3"));
    }

    #[test]
    fn test_display_lists_every_field() {
        let errs = validate(&raw("cow", "mid", "100", "0")).unwrap_err();
        let text = errs.to_string();
        assert!(text.starts_with("category: "));
        assert!(text.contains("; headcount: "));
    }

    #[test]
    fn test_validate_request_bounds() {
        let mut req = RationRequest {
            category: AnimalCategory::Boar,
            stage: PhysiologicalStage::Late,
            weight_kg: 250.0,
            headcount: 3,
        };
        assert!(validate_request(&req).is_ok());
        req.weight_kg = f64::NAN;
        req.headcount = 5000;
        assert_eq!(validate_request(&req).unwrap_err().len(), 2);
    }
}
