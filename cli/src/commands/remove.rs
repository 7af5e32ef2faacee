use anyhow::{Result, bail};
use std::process;

use nosh_core::db::Database;
use nosh_core::models::Table;

use super::helpers::{food_criteria, record_criteria};

pub(crate) fn cmd_remove_foods(
    db: &Database,
    name: Option<&str>,
    portion: Option<&str>,
    calories: Option<i64>,
    json: bool,
) -> Result<()> {
    let criteria = food_criteria(name, portion, calories);
    if criteria.is_empty() {
        // The store would refuse this anyway; give the user a usage error
        // instead of a silent no-op.
        bail!("refusing to remove every food; pass at least one of --name, --type, --calories");
    }
    let removed = db.delete_rows(Table::Foods, &criteria)?;
    report_removed(removed, "food", "foods", json)
}

pub(crate) fn cmd_remove_record(
    db: &Database,
    date: Option<&str>,
    name: Option<&str>,
    portion: Option<&str>,
    servings: Option<i64>,
    json: bool,
) -> Result<()> {
    let criteria = record_criteria(date, name, portion, servings)?;
    if criteria.is_empty() {
        bail!(
            "refusing to remove every entry; pass at least one of --date, --name, --type, --servings"
        );
    }
    let removed = db.delete_rows(Table::Record, &criteria)?;
    report_removed(removed, "entry", "entries", json)
}

fn report_removed(removed: usize, singular: &str, plural: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
        return Ok(());
    }
    if removed == 0 {
        eprintln!("Nothing matched, nothing removed");
        process::exit(2);
    }
    let noun = if removed == 1 { singular } else { plural };
    println!("Removed {removed} {noun}");
    Ok(())
}
