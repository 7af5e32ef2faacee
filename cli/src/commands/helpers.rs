use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::QueryCriteria;
use nosh_core::models::{FoodRow, RecordRow, date_to_text};

/// Build catalog match criteria from optional CLI filters.
pub(crate) fn food_criteria(
    name: Option<&str>,
    portion: Option<&str>,
    calories: Option<i64>,
) -> QueryCriteria {
    let mut criteria = QueryCriteria::new();
    if let Some(name) = name {
        criteria = criteria.food_name(name);
    }
    if let Some(portion) = portion {
        criteria = criteria.portion_type(portion);
    }
    if let Some(calories) = calories {
        criteria = criteria.calories(calories);
    }
    criteria
}

/// Build record match criteria from optional CLI filters. The date filter
/// goes through the keyword/digit grammar, so it can fail.
pub(crate) fn record_criteria(
    date: Option<&str>,
    name: Option<&str>,
    portion: Option<&str>,
    servings: Option<i64>,
) -> Result<QueryCriteria> {
    let mut criteria = QueryCriteria::new();
    if let Some(date) = date {
        criteria = criteria.date_str(date)?;
    }
    if let Some(name) = name {
        criteria = criteria.food_name(name);
    }
    if let Some(portion) = portion {
        criteria = criteria.portion_type(portion);
    }
    if let Some(servings) = servings {
        criteria = criteria.servings(servings);
    }
    Ok(criteria)
}

/// " (cup)" for a portion, or nothing for the empty default portion.
pub(crate) fn portion_label(portion: &str) -> String {
    if portion.is_empty() {
        String::new()
    } else {
        format!(" ({portion})")
    }
}

pub(crate) fn print_food_table(foods: &[FoodRow]) {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Portion")]
        portion: String,
        #[tabled(rename = "Kcal/serving")]
        calories: i64,
    }

    let rows: Vec<Row> = foods
        .iter()
        .map(|f| Row {
            food: truncate(&f.food_name, 35),
            portion: truncate(&f.portion_type, 20),
            calories: f.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Print record entries, each with its calorie count when the catalog
/// knows the food ("-" otherwise).
pub(crate) fn print_record_table(entries: &[(RecordRow, Option<i64>)]) {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Portion")]
        portion: String,
        #[tabled(rename = "Servings")]
        servings: i64,
        #[tabled(rename = "Kcal")]
        calories: String,
    }

    let rows: Vec<Row> = entries
        .iter()
        .map(|(e, kcal)| Row {
            date: date_to_text(e.date),
            food: truncate(&e.food_name, 35),
            portion: truncate(&e.portion_type, 20),
            servings: e.servings,
            calories: kcal.map_or("-".to_string(), |k| k.to_string()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
