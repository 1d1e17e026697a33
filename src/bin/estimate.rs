//! Command-line footprint estimate
//!
//! Usage: estimate <food> <quantity> [unit] [--save]

use foodprint::config::Config;
use foodprint::db::{migrations, Database};
use foodprint::emissions::{self, supported_units};
use foodprint::models::{Analysis, AnalysisCreate};

fn usage() -> String {
    format!(
        "Usage: estimate <food> <quantity> [unit] [--save]\n  units: {}",
        supported_units().join(", ")
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let save = match args.iter().position(|a| a == "--save") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let (food, quantity, unit) = match args.as_slice() {
        [food, quantity] => (food.as_str(), quantity.as_str(), "g"),
        [food, quantity, unit] => (food.as_str(), quantity.as_str(), unit.as_str()),
        _ => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };

    let quantity: f64 = quantity
        .parse()
        .map_err(|_| format!("Invalid quantity: {}", quantity))?;

    let weight_grams = emissions::grams_in_unit(quantity, unit)?;
    let result = emissions::calculate(food, weight_grams)?;
    if result.used_default_factor {
        eprintln!("note: '{}' not in the table, using the default factor", result.food_id);
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    if save {
        let config = Config::load()?;
        let database = Database::open(config.database_path())?;
        let data = AnalysisCreate::from_result(result.clone(), weight_grams);
        let saved = database.with_conn(|conn| {
            migrations::run_migrations(conn)?;
            Analysis::create(conn, &data)
        })?;
        eprintln!("Saved analysis {}", saved.id);
    }

    Ok(())
}
