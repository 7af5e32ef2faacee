use anyhow::Result;
use std::process;

use nosh_core::QueryCriteria;
use nosh_core::db::Database;

use super::helpers::{food_criteria, print_food_table, print_record_table, record_criteria};

pub(crate) fn cmd_show_foods(
    db: &Database,
    name: Option<&str>,
    portion: Option<&str>,
    calories: Option<i64>,
    json: bool,
) -> Result<()> {
    let criteria = food_criteria(name, portion, calories);
    let foods = db.find_foods(&criteria)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        eprintln!("No matching foods in the catalog");
        process::exit(2);
    }

    print_food_table(&foods);
    Ok(())
}

pub(crate) fn cmd_show_record(
    db: &Database,
    date: Option<&str>,
    name: Option<&str>,
    portion: Option<&str>,
    servings: Option<i64>,
    json: bool,
) -> Result<()> {
    let criteria = record_criteria(date, name, portion, servings)?;
    let records = db.find_records(&criteria)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No matching entries on record");
        process::exit(2);
    }

    // Join each entry against the catalog for a per-row calorie count; the
    // total only prints when every row resolved.
    let mut rows = Vec::with_capacity(records.len());
    let mut total = Some(0_i64);
    for entry in records {
        let catalog = db.find_foods(
            &QueryCriteria::new()
                .food_name(entry.food_name.as_str())
                .portion_type(entry.portion_type.as_str()),
        )?;
        let kcal = catalog.first().map(|f| f.calories * entry.servings);
        total = match (total, kcal) {
            (Some(t), Some(k)) => Some(t + k),
            _ => None,
        };
        rows.push((entry, kcal));
    }

    print_record_table(&rows);
    if let Some(total) = total {
        println!("  Total: {total} kcal");
    }
    Ok(())
}
