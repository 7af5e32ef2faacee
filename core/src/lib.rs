//! Core library for the nosh calorie tracker: the food catalog / daily
//! record data model, query criteria, and the SQLite-backed store.

pub mod criteria;
pub mod db;
pub mod error;
pub mod models;

pub use criteria::QueryCriteria;
pub use db::Database;
pub use error::{Error, Result};
