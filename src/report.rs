//! Plain-text export of a calculated ration, for printing or sharing

use chrono::NaiveDate;

use crate::models::{RationRequest, RationResult};

/// Render the request and its result as a fixed-layout text block
pub fn format_export(request: &RationRequest, result: &RationResult, date: NaiveDate) -> String {
    let mut output = String::new();

    output.push_str("FEED RATION\n");
    output.push_str(&format!("{}\n", "=".repeat(40)));
    output.push_str(&format!("Date:           {}\n", date.format("%Y-%m-%d")));
    output.push_str(&format!("Category:       {}\n", request.category.label()));
    output.push_str(&format!(
        "Stage:          {}\n",
        request.stage.label_for(request.category)
    ));
    output.push_str(&format!("Weight:         {} kg\n", request.weight_kg));
    output.push_str(&format!("Headcount:      {}\n", request.headcount));
    output.push_str(&format!("{}\n", "-".repeat(40)));
    output.push_str(&format!("Daily ration:   {:.1} kg\n", result.daily_kg));
    output.push_str(&format!("Monthly ration: {} kg\n", result.monthly_kg));
    output.push_str(&format!("Protein:        {}%\n", result.protein_percent));
    output.push_str(&format!("Composition:    {}\n", result.composition_description));
    output.push_str(&format!(
        "Estimated cost: {} FCFA/month\n",
        result.estimated_cost_fcfa
    ));

    output
}
