//! Error types shared across the library

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{AnimalCategory, PhysiologicalStage};

/// Defects in engine configuration. These are never recovered from: a bad
/// rate table must stop the program rather than feed a guessed budget.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate table has no entry for {category}/{stage}")]
    MissingRate {
        category: AnimalCategory,
        stage: PhysiologicalStage,
    },

    #[error("rate table has more than one entry for {category}/{stage}")]
    DuplicateRate {
        category: AnimalCategory,
        stage: PhysiologicalStage,
    },

    #[error("rate table entry for {category}/{stage} is not a positive finite number: {reason}")]
    InvalidRate {
        category: AnimalCategory,
        stage: PhysiologicalStage,
        reason: String,
    },

    #[error("unit cost must be a positive finite number, got {0}")]
    InvalidUnitCost(f64),
}

/// Failures while consuming an externally generated formulation
#[derive(Debug, Error)]
pub enum FormulationError {
    #[error("formulation generator failed: {0}")]
    Generator(String),

    #[error("no JSON object found in generator response")]
    NoJson,

    #[error("malformed formulation: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid formulation: {0}")]
    Invalid(String),
}
