use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A date string matched none of the recognized forms
    /// (`today`/`tomorrow`/`yesterday` or `DD-MM[-YYYY]` digits).
    #[error("invalid date '{input}': expected today, tomorrow, yesterday, or DD-MM[-YYYY]")]
    InvalidDateFormat { input: String },

    /// More than one record row matched a (date, food, portion) triple.
    ///
    /// The record table holds at most one row per triple; finding several
    /// means the store is corrupt. Never repaired automatically.
    #[error(
        "{matches} record rows for '{food_name}' ({portion_type}) on {date}, expected at most one"
    )]
    DuplicateRecord {
        date: NaiveDate,
        food_name: String,
        portion_type: String,
        matches: usize,
    },

    /// Underlying SQLite failure, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
