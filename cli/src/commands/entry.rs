use anyhow::Result;

use nosh_core::QueryCriteria;
use nosh_core::db::Database;
use nosh_core::models::date_to_text;

use super::helpers::{json_error, portion_label};

pub(crate) fn cmd_entry(
    db: &Database,
    name: &str,
    portion: &str,
    servings: i64,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(row) = db.add_record(name, portion, servings, date)? else {
        if json {
            println!("{}", json_error("food name must not be empty"));
        } else {
            eprintln!("Food name must not be empty, nothing recorded");
        }
        return Ok(());
    };

    // Advisory only: the record happily holds foods the catalog has never
    // heard of, it just can't count their calories.
    let catalog = db.find_foods(
        &QueryCriteria::new()
            .food_name(row.food_name.as_str())
            .portion_type(row.portion_type.as_str()),
    )?;
    let kcal = catalog.first().map(|f| f.calories * row.servings);

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }

    let food = &row.food_name;
    let portion = portion_label(&row.portion_type);
    let servings = row.servings;
    let day = date_to_text(row.date);
    if let Some(kcal) = kcal {
        println!("Recorded: {food}{portion} x{servings} on {day} — {kcal} kcal");
    } else {
        println!("Recorded: {food}{portion} x{servings} on {day}");
        eprintln!("Note: '{food}' is not in the catalog; add it with `nosh food` to count calories");
    }

    Ok(())
}
