use anyhow::Result;

use nosh_core::db::Database;

use super::helpers::{json_error, portion_label};

pub(crate) fn cmd_food(
    db: &Database,
    name: &str,
    portion: &str,
    calories: i64,
    json: bool,
) -> Result<()> {
    match db.add_food(name, portion, calories)? {
        Some(row) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&row)?);
            } else {
                let food = &row.food_name;
                let portion = portion_label(&row.portion_type);
                let kcal = row.calories;
                println!("Added to catalog: {food}{portion} — {kcal} kcal per serving");
            }
        }
        // The store refuses empty names and already-cataloged
        // (name, portion) pairs; both are handled no-ops, not errors.
        None if name.is_empty() => {
            if json {
                println!("{}", json_error("food name must not be empty"));
            } else {
                eprintln!("Food name must not be empty, nothing added");
            }
        }
        None => {
            if json {
                println!(
                    "{}",
                    json_error(&format!("'{name}' is already in the catalog"))
                );
            } else {
                let portion = portion_label(portion);
                eprintln!("'{name}'{portion} is already in the catalog, nothing added");
            }
        }
    }

    Ok(())
}
