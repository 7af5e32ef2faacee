use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::models::date_to_text;

/// Digit dates: day, month, optional 4-digit year, dashes optional.
static DIGIT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})-?(\d{1,2})-?(\d{4})?$").expect("digit-date regex"));

/// Resolve a user-supplied date string to a calendar date.
///
/// Accepts `today`, `tomorrow`, and `yesterday` in any case, or digits in
/// `DD-MM-YYYY` form where the dashes and the year are optional (a missing
/// year means the current year). Anything else, including digit strings
/// that name an impossible calendar day, is [`Error::InvalidDateFormat`].
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match input.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    let invalid = || Error::InvalidDateFormat {
        input: input.to_string(),
    };
    let caps = DIGIT_DATE.captures(input.trim()).ok_or_else(invalid)?;
    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = match caps.get(3) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => today.year(),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// A partial row over the food/record columns.
///
/// Each field is independently optional: absent means "don't constrain"
/// when matching and "don't touch" when updating. Comparison is exact per
/// field. An empty criteria matches every row — "no filter" is a valid
/// query, which is why destructive callers check [`is_empty`](Self::is_empty)
/// before acting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCriteria {
    date: Option<NaiveDate>,
    food_name: Option<String>,
    portion_type: Option<String>,
    servings: Option<i64>,
    calories: Option<i64>,
}

impl QueryCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Like [`date`](Self::date), but resolves a keyword or digit string
    /// through [`parse_date`] first.
    pub fn date_str(self, input: &str) -> Result<Self> {
        Ok(self.date(parse_date(input)?))
    }

    #[must_use]
    pub fn food_name(mut self, name: impl Into<String>) -> Self {
        self.food_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn portion_type(mut self, portion: impl Into<String>) -> Self {
        self.portion_type = Some(portion.into());
        self
    }

    #[must_use]
    pub fn servings(mut self, servings: i64) -> Self {
        self.servings = Some(servings);
        self
    }

    #[must_use]
    pub fn calories(mut self, calories: i64) -> Self {
        self.calories = Some(calories);
        self
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.food_name.is_none()
            && self.portion_type.is_none()
            && self.servings.is_none()
            && self.calories.is_none()
    }

    /// Present (column, value) pairs in schema column order. Dates render
    /// as `DD-MM-YYYY` text, the form every date is persisted in.
    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(date) = self.date {
            fields.push(("date", Value::Text(date_to_text(date))));
        }
        if let Some(name) = &self.food_name {
            fields.push(("food_name", Value::Text(name.clone())));
        }
        if let Some(portion) = &self.portion_type {
            fields.push(("portion_type", Value::Text(portion.clone())));
        }
        if let Some(servings) = self.servings {
            fields.push(("servings", Value::Integer(servings)));
        }
        if let Some(calories) = self.calories {
            fields.push(("calories", Value::Integer(calories)));
        }
        fields
    }

    /// Render as an AND-joined `WHERE` predicate with `?N` placeholders
    /// starting at `first_param`. Returns the clause text and its bound
    /// values; the clause is empty when no field is set.
    #[must_use]
    pub fn match_predicate(&self, first_param: usize) -> (String, Vec<Value>) {
        Self::render(self.fields(), " AND ", first_param)
    }

    /// Render as a comma-joined `SET` assignment list with `?N`
    /// placeholders starting at 1.
    #[must_use]
    pub fn set_clause(&self) -> (String, Vec<Value>) {
        Self::render(self.fields(), ", ", 1)
    }

    fn render(
        fields: Vec<(&'static str, Value)>,
        sep: &str,
        first_param: usize,
    ) -> (String, Vec<Value>) {
        let clause = fields
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", first_param + i))
            .collect::<Vec<_>>()
            .join(sep);
        let values = fields.into_iter().map(|(_, value)| value).collect();
        (clause, values)
    }
}
