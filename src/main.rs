//! Feed Ration Calculator
//!
//! Command-line front end for the ration engine.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use ration_calculator::calculator::select_composition;
use ration_calculator::formulation::{
    self, CannedResponse, FormulationGenerator, FormulationSource, Unavailable,
};
use ration_calculator::models::FormulationRequest;
use ration_calculator::{AnimalCategory, EngineConfig, RawRationInput, logging, report};

#[derive(Parser)]
#[command(name = "ration-calculator")]
#[command(about = "Feed ration calculator for pig herds")]
struct Cli {
    /// Path to a JSON engine config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feed price in FCFA/kg, overrides the config file
    #[arg(long)]
    unit_cost: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the ration for a group of animals
    Calc {
        /// sow-gestating, sow-lactating, boar, piglet or fattening
        category: String,

        /// early, mid or late
        stage: String,

        /// Body weight per animal in kg (1-500)
        weight: String,

        /// Number of animals (1-1000)
        headcount: String,

        /// Print the full export block instead of the summary
        #[arg(short, long)]
        export: bool,
    },

    /// List the feeding rate table
    Table,

    /// Read an alternative formulation, falling back to the reference mix
    Formulate {
        /// Animal category
        category: String,

        /// Target body weight in kg
        target_weight: f64,

        /// Maximum feed cost in FCFA/kg
        #[arg(long)]
        budget: Option<f64>,

        /// Ingredients available on the farm, free text
        #[arg(long)]
        ingredients: Option<String>,

        /// File holding the generator's response
        #[arg(short, long)]
        response: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(cost) = cli.unit_cost {
        config = config.with_unit_cost(cost);
    }
    let engine = config.build_engine().context("invalid engine configuration")?;

    match cli.command {
        Commands::Calc {
            category,
            stage,
            weight,
            headcount,
            export,
        } => {
            let input = RawRationInput::new(category, stage, weight, headcount);
            let request = match ration_calculator::validate(&input) {
                Ok(request) => request,
                Err(errors) => {
                    error!("rejected ration request: {}", errors);
                    eprintln!("Invalid input:");
                    for (field, message) in errors.iter() {
                        eprintln!("  {}: {}", field, message);
                    }
                    return Ok(ExitCode::FAILURE);
                }
            };

            let result = engine.calculate(&request)?;
            if export {
                let today = chrono::Local::now().date_naive();
                print!("{}", report::format_export(&request, &result, today));
            } else {
                println!("{}", result);
            }
        }

        Commands::Table => {
            println!(
                "{:<15} {:<6} {:>12} {:>9}  {}",
                "Category", "Stage", "kg/day@100", "Protein", "Composition"
            );
            println!("{}", "-".repeat(100));
            for (category, stage, entry) in engine.table().entries() {
                println!(
                    "{:<15} {:<6} {:>12.1} {:>8}%  {}",
                    category.as_str(),
                    stage.as_str(),
                    entry.base_daily_rate_at_100kg,
                    entry.protein_percent,
                    select_composition(category)
                );
            }
            println!();
            println!("Unit cost: {} FCFA/kg", engine.unit_cost_fcfa_per_kg());
        }

        Commands::Formulate {
            category,
            target_weight,
            budget,
            ingredients,
            response,
        } => {
            let category: AnimalCategory = category.parse().context(
                "category must be one of sow-gestating, sow-lactating, boar, piglet, fattening",
            )?;
            let request = FormulationRequest {
                category,
                target_weight_kg: target_weight,
                budget_fcfa_per_kg: budget,
                available_ingredients: ingredients,
            };

            let generator: Box<dyn FormulationGenerator> = match response {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    Box::new(CannedResponse::new(text))
                }
                None => Box::new(Unavailable),
            };

            let formulation = formulation::propose_or_default(generator.as_ref(), &request);
            match &formulation.source {
                FormulationSource::Generated => println!("Generated formulation:"),
                FormulationSource::Fallback { reason } => {
                    println!("Reference formulation (generator output unusable: {}):", reason)
                }
            }

            let proposal = &formulation.proposal;
            for i in &proposal.ingredients {
                println!("  {:>5.1}%  {:<28} {:>7.0} FCFA/kg", i.percentage, i.name, i.cost_per_kg);
            }
            println!("Cost: {:.0} FCFA/kg", proposal.cost_per_kg);
            for (name, value) in &proposal.nutritional_values {
                println!("  {}: {}", name, value);
            }
            for r in &proposal.recommendations {
                println!("- {}", r);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
