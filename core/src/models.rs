use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Text form of every persisted date: zero-padded `DD-MM-YYYY`.
///
/// Existing databases depend on this exact rendering; changing it is a
/// migration, not an edit.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// The two row collections in a nosh database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Foods,
    Record,
}

impl Table {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Table::Foods => "foods",
            Table::Record => "record",
        }
    }
}

/// A catalog entry: a named, portioned food with a known calorie count per
/// serving. `(food_name, portion_type)` is the natural key; the store keeps
/// at most one row per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodRow {
    pub food_name: String,
    pub portion_type: String,
    pub calories: i64,
}

/// One record fact: some number of servings of a food eaten on a day.
///
/// At most one row exists per `(date, food_name, portion_type)` triple;
/// repeat entries increment `servings` instead of inserting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    #[serde(serialize_with = "ser_date")]
    pub date: NaiveDate,
    pub food_name: String,
    pub portion_type: String,
    pub servings: i64,
}

/// Render a date in the persisted text form.
#[must_use]
pub fn date_to_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date from the persisted text form.
pub fn date_from_text(text: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
}

fn ser_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date_to_text(*date))
}
