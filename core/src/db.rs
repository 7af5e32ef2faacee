use std::path::Path;

use chrono::{Local, NaiveDate};
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, warn};

use crate::criteria::{QueryCriteria, parse_date};
use crate::error::{Error, Result};
use crate::models::{FoodRow, RecordRow, Table, date_from_text, date_to_text};

/// SQLite-backed store for the food catalog and the daily record.
///
/// Owns a single connection for the life of the process; the database path
/// is injected at construction. Operations that read before writing run
/// inside one transaction, so a failure part-way through rolls back rather
/// than leaving a partial write for the next call to see.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create the `record` and `foods` tables when absent. Idempotent.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS record (
                date TEXT,
                food_name TEXT,
                portion_type TEXT,
                servings INTEGER
            );

            CREATE TABLE IF NOT EXISTS foods (
                food_name TEXT,
                portion_type TEXT,
                calories INTEGER
            );",
        )?;
        Ok(())
    }

    // --- Row mapping helpers ---

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodRow> {
        Ok(FoodRow {
            food_name: row.get(0)?,
            portion_type: row.get(1)?,
            calories: row.get(2)?,
        })
    }

    fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<RecordRow> {
        let text: String = row.get(0)?;
        let date = date_from_text(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(RecordRow {
            date,
            food_name: row.get(1)?,
            portion_type: row.get(2)?,
            servings: row.get(3)?,
        })
    }

    // --- Reads ---

    /// Catalog rows matching `criteria`. An empty criteria returns the
    /// whole table. Order is whatever the storage engine yields.
    pub fn find_foods(&self, criteria: &QueryCriteria) -> Result<Vec<FoodRow>> {
        let (clause, values) = criteria.match_predicate(1);
        let mut sql = String::from("SELECT food_name, portion_type, calories FROM foods");
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        debug!(%sql, "querying foods");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::food_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Record rows matching `criteria`, dates parsed back from their
    /// persisted text form.
    pub fn find_records(&self, criteria: &QueryCriteria) -> Result<Vec<RecordRow>> {
        let (clause, values) = criteria.match_predicate(1);
        let mut sql = String::from("SELECT date, food_name, portion_type, servings FROM record");
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        debug!(%sql, "querying record");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // --- Writes ---

    /// Add a food to the catalog.
    ///
    /// No-ops with a warning when the name is empty or the
    /// `(food_name, portion_type)` pair is already cataloged. Returns the
    /// stored row, or `None` when nothing was inserted.
    pub fn add_food(
        &self,
        food_name: &str,
        portion_type: &str,
        calories: i64,
    ) -> Result<Option<FoodRow>> {
        if food_name.is_empty() {
            warn!("no food name given, not adding to catalog");
            return Ok(None);
        }

        let tx = self.conn.unchecked_transaction()?;
        let key = QueryCriteria::new()
            .food_name(food_name)
            .portion_type(portion_type);
        if !self.find_foods(&key)?.is_empty() {
            warn!(food_name, portion_type, "food already in catalog, not adding");
            return Ok(None);
        }

        self.conn.execute(
            "INSERT INTO foods (food_name, portion_type, calories) VALUES (?1, ?2, ?3)",
            params![food_name, portion_type, calories],
        )?;
        tx.commit()?;

        Ok(Some(FoodRow {
            food_name: food_name.to_string(),
            portion_type: portion_type.to_string(),
            calories,
        }))
    }

    /// Add an entry to the record, resolving `date` through the keyword /
    /// digit grammar (`None` means today).
    pub fn add_record(
        &self,
        food_name: &str,
        portion_type: &str,
        servings: i64,
        date: Option<&str>,
    ) -> Result<Option<RecordRow>> {
        let date = match date {
            Some(input) => parse_date(input)?,
            None => Local::now().date_naive(),
        };
        self.add_record_on(date, food_name, portion_type, servings)
    }

    /// Insert-or-increment a record entry for a resolved date.
    ///
    /// At most one row exists per `(date, food_name, portion_type)`
    /// triple: a first entry inserts with the requested servings, a repeat
    /// entry adds to the existing count in place. Finding several matching
    /// rows means the store is corrupt and fails with
    /// [`Error::DuplicateRecord`]; it is never repaired here.
    pub fn add_record_on(
        &self,
        date: NaiveDate,
        food_name: &str,
        portion_type: &str,
        servings: i64,
    ) -> Result<Option<RecordRow>> {
        if food_name.is_empty() {
            warn!("no food name given, not adding to record");
            return Ok(None);
        }

        let tx = self.conn.unchecked_transaction()?;
        let key = QueryCriteria::new()
            .date(date)
            .food_name(food_name)
            .portion_type(portion_type);
        let existing = self.find_records(&key)?;

        let row = match existing.as_slice() {
            [] => {
                self.conn.execute(
                    "INSERT INTO record (date, food_name, portion_type, servings)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![date_to_text(date), food_name, portion_type, servings],
                )?;
                RecordRow {
                    date,
                    food_name: food_name.to_string(),
                    portion_type: portion_type.to_string(),
                    servings,
                }
            }
            [found] => {
                debug!(food_name, portion_type, %date, "entry already on record, incrementing servings");
                let total = found.servings + servings;
                self.update_rows(Table::Record, &QueryCriteria::new().servings(total), &key)?;
                RecordRow {
                    servings: total,
                    ..found.clone()
                }
            }
            rows => {
                return Err(Error::DuplicateRecord {
                    date,
                    food_name: food_name.to_string(),
                    portion_type: portion_type.to_string(),
                    matches: rows.len(),
                });
            }
        };
        tx.commit()?;
        Ok(Some(row))
    }

    /// Delete every row matching `criteria`, returning the count removed.
    ///
    /// Refuses an unconstrained delete: empty criteria match the whole
    /// table, so they warn and no-op instead of wiping it.
    pub fn delete_rows(&self, table: Table, criteria: &QueryCriteria) -> Result<usize> {
        if criteria.is_empty() {
            warn!(table = table.name(), "refusing to delete with no match criteria");
            return Ok(0);
        }
        let (clause, values) = criteria.match_predicate(1);
        let sql = format!("DELETE FROM {} WHERE {clause}", table.name());
        debug!(%sql, "deleting rows");
        let deleted = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(deleted)
    }

    /// Apply `set`'s assignments to every row matching `matcher`,
    /// returning the count touched. An empty matcher updates the whole
    /// table; an empty set has nothing to apply and no-ops with a warning.
    pub fn update_rows(
        &self,
        table: Table,
        set: &QueryCriteria,
        matcher: &QueryCriteria,
    ) -> Result<usize> {
        let (set_sql, set_values) = set.set_clause();
        if set_sql.is_empty() {
            warn!(table = table.name(), "no assignments given, nothing to update");
            return Ok(0);
        }
        let (where_sql, where_values) = matcher.match_predicate(set_values.len() + 1);
        let sql = if where_sql.is_empty() {
            format!("UPDATE {} SET {set_sql}", table.name())
        } else {
            format!("UPDATE {} SET {set_sql} WHERE {where_sql}", table.name())
        };
        debug!(%sql, "updating rows");
        let values: Vec<_> = set_values.into_iter().chain(where_values).collect();
        let updated = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(updated)
    }

    /// Drop a table entirely. Reset/teardown only; [`init_schema`]
    /// recreates it empty.
    ///
    /// [`init_schema`]: Self::init_schema
    pub fn drop_table(&self, table: Table) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", table.name()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.add_food("coffee", "with milk", 100).unwrap();
        db.add_food("coffee", "black", 30).unwrap();
        db.add_food("apple sauce", "jar", 200).unwrap();
        db.add_record_on(date(2020, 5, 15), "broccoli", "head", 1)
            .unwrap();
        db.add_record_on(date(1895, 10, 19), "apple sauce", "jar", 5)
            .unwrap();
        db
    }

    #[test]
    fn test_init_schema_creates_both_tables() {
        let db = Database::open_in_memory().unwrap();
        let mut stmt = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert!(names.contains(&"foods".to_string()));
        assert!(names.contains(&"record".to_string()));
    }

    #[test]
    fn test_init_schema_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.add_food("broccoli", "head", 30).unwrap();
        db.init_schema().unwrap();
        db.init_schema().unwrap();
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_open_reuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nosh.db");
        {
            let db = Database::open(&path).unwrap();
            db.add_food("broccoli", "head", 30).unwrap();
        }
        let db = Database::open(&path).unwrap();
        let foods = db.find_foods(&QueryCriteria::new()).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].food_name, "broccoli");
    }

    #[test]
    fn test_find_on_empty_tables() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.find_foods(&QueryCriteria::new()).unwrap().is_empty());
        assert!(db.find_records(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_criteria_return_full_table() {
        let db = seeded();
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 3);
        assert_eq!(db.find_records(&QueryCriteria::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_find_foods_by_name_returns_each_portion() {
        let db = seeded();
        let coffees = db
            .find_foods(&QueryCriteria::new().food_name("coffee"))
            .unwrap();
        assert_eq!(coffees.len(), 2);
        let portions: Vec<&str> = coffees.iter().map(|f| f.portion_type.as_str()).collect();
        assert!(portions.contains(&"black"));
        assert!(portions.contains(&"with milk"));
    }

    #[test]
    fn test_find_foods_exact_match_not_substring() {
        let db = seeded();
        let rows = db
            .find_foods(&QueryCriteria::new().food_name("app"))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_find_records_by_triple() {
        let db = seeded();
        let criteria = QueryCriteria::new()
            .food_name("apple sauce")
            .portion_type("jar")
            .date(date(1895, 10, 19));
        let rows = db.find_records(&criteria).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].servings, 5);
        assert_eq!(rows[0].date, date(1895, 10, 19));
    }

    #[test]
    fn test_add_food_returns_row() {
        let db = Database::open_in_memory().unwrap();
        let row = db.add_food("broccoli", "head", 30).unwrap().unwrap();
        assert_eq!(
            row,
            FoodRow {
                food_name: "broccoli".to_string(),
                portion_type: "head".to_string(),
                calories: 30,
            }
        );
    }

    #[test]
    fn test_add_food_duplicate_is_noop() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_food("broccoli", "head", 30).unwrap().is_some());
        assert!(db.add_food("broccoli", "head", 30).unwrap().is_none());
        let rows = db
            .find_foods(&QueryCriteria::new().food_name("broccoli"))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_add_food_same_name_new_portion_is_new_row() {
        let db = Database::open_in_memory().unwrap();
        db.add_food("coffee", "black", 30).unwrap();
        assert!(db.add_food("coffee", "with milk", 100).unwrap().is_some());
        let rows = db
            .find_foods(&QueryCriteria::new().food_name("coffee"))
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_add_food_empty_name_is_noop() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_food("", "head", 30).unwrap().is_none());
        assert!(db.find_foods(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn test_add_record_inserts_new_row() {
        let db = Database::open_in_memory().unwrap();
        let row = db
            .add_record_on(date(2020, 5, 15), "broccoli", "head", 1)
            .unwrap()
            .unwrap();
        assert_eq!(row.servings, 1);
        let rows = db.find_records(&QueryCriteria::new()).unwrap();
        assert_eq!(
            rows,
            vec![RecordRow {
                date: date(2020, 5, 15),
                food_name: "broccoli".to_string(),
                portion_type: "head".to_string(),
                servings: 1,
            }]
        );
    }

    #[test]
    fn test_add_record_increments_existing_entry() {
        let db = seeded();
        let row = db
            .add_record_on(date(2020, 5, 15), "broccoli", "head", 1)
            .unwrap()
            .unwrap();
        assert_eq!(row.servings, 2);
        let rows = db
            .find_records(&QueryCriteria::new().food_name("broccoli"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].servings, 2);
    }

    #[test]
    fn test_add_record_increments_by_requested_amount() {
        let db = Database::open_in_memory().unwrap();
        db.add_record_on(date(2024, 6, 15), "rice", "bowl", 2)
            .unwrap();
        let row = db
            .add_record_on(date(2024, 6, 15), "rice", "bowl", 3)
            .unwrap()
            .unwrap();
        assert_eq!(row.servings, 5);
    }

    #[test]
    fn test_record_uniqueness_invariant() {
        let db = Database::open_in_memory().unwrap();
        let day = date(2024, 6, 15);
        for _ in 0..4 {
            db.add_record_on(day, "espresso", "cup", 1).unwrap();
        }
        db.add_record_on(day, "espresso", "cup", 3).unwrap();
        let rows = db
            .find_records(&QueryCriteria::new().food_name("espresso"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].servings, 7);
    }

    #[test]
    fn test_add_record_distinct_triples_stay_separate() {
        let db = Database::open_in_memory().unwrap();
        let day = date(2024, 6, 15);
        db.add_record_on(day, "espresso", "cup", 1).unwrap();
        db.add_record_on(day, "espresso", "double", 1).unwrap();
        db.add_record_on(date(2024, 6, 16), "espresso", "cup", 1)
            .unwrap();
        assert_eq!(db.find_records(&QueryCriteria::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_add_record_resolves_date_strings() {
        let db = Database::open_in_memory().unwrap();
        let row = db
            .add_record("broccoli", "head", 1, Some("15-05-2020"))
            .unwrap()
            .unwrap();
        assert_eq!(row.date, date(2020, 5, 15));

        let row = db.add_record("broccoli", "head", 1, None).unwrap().unwrap();
        assert_eq!(row.date, Local::now().date_naive());
    }

    #[test]
    fn test_add_record_rejects_bad_date() {
        let db = Database::open_in_memory().unwrap();
        let err = db.add_record("broccoli", "head", 1, Some("soon")).unwrap_err();
        assert!(matches!(err, Error::InvalidDateFormat { .. }));
        assert!(db.find_records(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn test_add_record_empty_name_is_noop() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_record("", "cup", 1, None).unwrap().is_none());
        assert!(db.find_records(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_rows_detected_as_corruption() {
        let db = Database::open_in_memory().unwrap();
        // Two identical rows can only appear through outside interference;
        // inject them directly.
        for _ in 0..2 {
            db.conn
                .execute(
                    "INSERT INTO record (date, food_name, portion_type, servings)
                     VALUES ('15-05-2020', 'broccoli', 'head', 1)",
                    [],
                )
                .unwrap();
        }
        let err = db
            .add_record_on(date(2020, 5, 15), "broccoli", "head", 1)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord { matches: 2, .. }));
        // The corrupt rows must be left exactly as they were.
        let rows = db.find_records(&QueryCriteria::new()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.servings == 1));
    }

    #[test]
    fn test_delete_rows_with_criteria() {
        let db = seeded();
        let removed = db
            .delete_rows(Table::Foods, &QueryCriteria::new().food_name("apple sauce"))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_rows_empty_criteria_is_noop() {
        let db = seeded();
        let removed = db.delete_rows(Table::Foods, &QueryCriteria::new()).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_update_rows_set_and_match() {
        let db = seeded();
        let matcher = QueryCriteria::new()
            .food_name("coffee")
            .portion_type("black");
        let set = QueryCriteria::new()
            .portion_type("black with sugar")
            .calories(50);
        let updated = db.update_rows(Table::Foods, &set, &matcher).unwrap();
        assert_eq!(updated, 1);

        assert!(db.find_foods(&matcher).unwrap().is_empty());
        let rows = db
            .find_foods(&QueryCriteria::new().portion_type("black with sugar"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].food_name, "coffee");
        assert_eq!(rows[0].calories, 50);
    }

    #[test]
    fn test_update_rows_empty_matcher_updates_all() {
        let db = seeded();
        let updated = db
            .update_rows(
                Table::Foods,
                &QueryCriteria::new().calories(0),
                &QueryCriteria::new(),
            )
            .unwrap();
        assert_eq!(updated, 3);
        let rows = db.find_foods(&QueryCriteria::new()).unwrap();
        assert!(rows.iter().all(|f| f.calories == 0));
    }

    #[test]
    fn test_update_rows_empty_set_is_noop() {
        let db = seeded();
        let updated = db
            .update_rows(
                Table::Foods,
                &QueryCriteria::new(),
                &QueryCriteria::new().food_name("coffee"),
            )
            .unwrap();
        assert_eq!(updated, 0);
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_drop_table() {
        let db = seeded();
        db.drop_table(Table::Record).unwrap();
        assert!(db.find_records(&QueryCriteria::new()).is_err());
        assert_eq!(db.find_foods(&QueryCriteria::new()).unwrap().len(), 3);

        db.init_schema().unwrap();
        assert!(db.find_records(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn test_storage_error_propagates() {
        let db = Database::open_in_memory().unwrap();
        db.drop_table(Table::Foods).unwrap();
        let err = db.find_foods(&QueryCriteria::new()).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
