use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_data::load_tax_year;

/// Validate bracket and relief CSV files for one year of assessment.
///
/// Bracket files have the columns
/// `year_of_assessment,min_income,max_income,base_tax,rate` (empty
/// `max_income` for the top bracket). Relief files have the columns
/// `year_of_assessment,category,amount`, with an optional `child_slots` row.
#[derive(Parser, Debug)]
#[command(name = "tax-data-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bracket schedule CSV (built-in YA2024 schedule if omitted)
    #[arg(short, long)]
    brackets: Option<PathBuf>,

    /// Relief limits CSV (built-in YA2024 limits if omitted)
    #[arg(short, long)]
    reliefs: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_tax_year(args.brackets.as_deref(), args.reliefs.as_deref())
        .context("Failed to load tax-year tables")?;

    println!("Year of assessment {}", config.year_of_assessment());

    println!("{} brackets:", config.schedule().brackets().len());
    for bracket in config.schedule().brackets() {
        let upper = bracket
            .max_income
            .map_or_else(|| "and above".to_string(), |max| format!("to {max}"));
        println!(
            "  {} {upper}: base {} + {}%",
            bracket.min_income,
            bracket.base_tax,
            bracket.tax_rate * rust_decimal::Decimal::ONE_HUNDRED
        );
    }

    let limits = config.relief_limits();
    println!("{} relief categories:", limits.amounts.len());
    for (category, amount) in &limits.amounts {
        println!("  {:<24} {amount}", category.as_str());
    }
    println!("Child slots: {}", limits.child_slot_limit);

    Ok(())
}
