//! Feed ration calculator
//!
//! Turns an animal category, physiological stage, body weight and headcount
//! into a daily and monthly feed ration with protein target, ingredient mix
//! and cost estimate.

pub mod calculator;
pub mod config;
pub mod error;
pub mod formulation;
pub mod logging;
pub mod models;
pub mod rate_table;
pub mod report;
pub mod validate;

pub use calculator::RationEngine;
pub use config::EngineConfig;
pub use error::{ConfigError, FormulationError};
pub use models::{
    AnimalCategory, PhysiologicalStage, RateTableEntry, RationRequest, RationResult, RawRationInput,
};
pub use rate_table::RateTable;
pub use validate::{ValidationErrors, validate};
