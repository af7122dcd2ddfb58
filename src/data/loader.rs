//! Tabular loader
//!
//! Persists an in-memory [`Table`] into the destination store with an
//! automatically inferred (or explicitly supplied) schema. Every load fully
//! replaces the destination table: drop, create, insert, commit. Rows that
//! fail to insert are logged and skipped; the load carries on.

use crate::data::store::{quote_ident, Store};
use crate::data::table::{Column, ColumnType, Table, Value};
use crate::{GridironError, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Reserved column name parsed into a timestamp before type inference
pub const LAST_MODIFIED_COLUMN: &str = "date_modified";

/// Options for a single load
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Columns to project out before persisting; unknown names are ignored
    pub exclude: Vec<String>,
    /// Explicit schema to use instead of inference. Must cover the table's
    /// columns in order.
    pub schema: Option<Vec<Column>>,
}

/// Outcome of a load
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub destination: String,
    pub inserted: usize,
    pub skipped: usize,
}

/// Load a table with an inferred schema and no excluded columns
pub fn load(store: &mut Store, table: &Table, destination: &str) -> Result<LoadReport> {
    load_with_options(store, table, destination, &LoadOptions::default())
}

/// Load a table with the supplied options
pub fn load_with_options(
    store: &mut Store,
    table: &Table,
    destination: &str,
    options: &LoadOptions,
) -> Result<LoadReport> {
    if destination.is_empty() {
        return Err(GridironError::EmptyDestination);
    }

    let mut table = table.without_columns(&options.exclude);
    normalize(&mut table);

    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => infer_schema(&table),
    };

    let tx = store.transaction()?;

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {}",
        quote_ident(destination)
    ))?;

    let column_defs = schema
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({})",
        quote_ident(destination),
        column_defs
    ))?;

    let column_list = schema
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=schema.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(destination),
        column_list,
        placeholders
    );

    let mut inserted = 0;
    let mut skipped = 0;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for (index, row) in table.rows().iter().enumerate() {
            match stmt.execute(rusqlite::params_from_iter(row.iter())) {
                Ok(_) => inserted += 1,
                Err(e) => {
                    log::warn!("Skipping row {} of {}: {}", index, destination, e);
                    skipped += 1;
                }
            }
        }
    }

    tx.commit()?;

    log::info!(
        "Loaded {} rows into {} ({} skipped)",
        inserted,
        destination,
        skipped
    );

    Ok(LoadReport {
        destination: destination.to_string(),
        inserted,
        skipped,
    })
}

/// Normalize values in place: infinities and missing sentinels become null,
/// and the reserved last-modified column is parsed into timestamps.
fn normalize(table: &mut Table) {
    let modified_idx = table.column_index(LAST_MODIFIED_COLUMN);

    for row in table.rows_mut() {
        for (i, value) in row.iter_mut().enumerate() {
            let non_finite = matches!(value, Value::Float(f) if !f.is_finite());
            if non_finite || value.is_missing_sentinel() {
                *value = Value::Null;
            }

            if Some(i) == modified_idx {
                let parsed = parse_timestamp(value);
                *value = parsed;
            }
        }
    }
}

/// Coerce a value into a timestamp; anything unparseable becomes null
fn parse_timestamp(value: &Value) -> Value {
    match value {
        Value::Timestamp(ts) => Value::Timestamp(*ts),
        Value::Text(s) => {
            let s = s.trim();
            let parsed = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                });
            match parsed {
                Some(ts) => Value::Timestamp(ts),
                None => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

/// Infer one semantic type per column from the observed values
pub fn infer_schema(table: &Table) -> Vec<Column> {
    table
        .column_names()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let ty = if name == LAST_MODIFIED_COLUMN {
                ColumnType::Timestamp
            } else {
                infer_column_type(table, i)
            };
            Column::new(name.clone(), ty)
        })
        .collect()
}

fn infer_column_type(table: &Table, index: usize) -> ColumnType {
    let mut has_text = false;
    let mut has_float = false;
    let mut has_integer = false;
    let mut has_timestamp = false;
    let mut non_null = 0;

    for row in table.rows() {
        match row.get(index) {
            Some(Value::Null) | None => continue,
            Some(Value::Text(_)) => has_text = true,
            Some(Value::Float(_)) => has_float = true,
            Some(Value::Integer(_)) => has_integer = true,
            Some(Value::Timestamp(_)) => has_timestamp = true,
        }
        non_null += 1;
    }

    if non_null == 0 || has_text {
        // All-null and mixed/textual columns fall back to text
        ColumnType::Text
    } else if has_timestamp {
        if has_float || has_integer {
            ColumnType::Text
        } else {
            ColumnType::Timestamp
        }
    } else if has_float {
        ColumnType::Float
    } else {
        ColumnType::Integer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fetch_all(store: &Store, table: &str) -> Table {
        store
            .fetch_table(&format!("SELECT * FROM {}", table))
            .unwrap()
    }

    #[test]
    fn test_column_order_preserved() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["season", "team", "week"]));
        table.push_row(vec![Value::Integer(2023), "KC".into(), Value::Integer(1)]);

        load(&mut store, &table, "schedules").unwrap();

        let loaded = fetch_all(&store, "schedules");
        assert_eq!(
            loaded.column_names(),
            &["season".to_string(), "team".to_string(), "week".to_string()]
        );
    }

    #[test]
    fn test_null_normalization() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["a", "b", "c"]));
        table.push_row(vec![
            Value::Float(f64::INFINITY),
            Value::Float(f64::NAN),
            Value::Text("NA".to_string()),
        ]);

        load(&mut store, &table, "t").unwrap();

        let loaded = fetch_all(&store, "t");
        assert_eq!(loaded.rows()[0], vec![Value::Null, Value::Null, Value::Null]);
    }

    #[test]
    fn test_idempotent_reload() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["team", "wins"]));
        table.push_row(vec!["KC".into(), Value::Integer(11)]);
        table.push_row(vec!["TB".into(), Value::Integer(8)]);

        load(&mut store, &table, "standings").unwrap();
        let first = fetch_all(&store, "standings");

        load(&mut store, &table, "standings").unwrap();
        let second = fetch_all(&store, "standings");

        assert_eq!(first.rows(), second.rows());
        assert_eq!(second.row_count(), 2);
    }

    #[test]
    fn test_partial_failure_skips_bad_row() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["a", "b"]));
        table.push_row(vec![Value::Integer(1), Value::Integer(2)]);
        // Short row: binding fails, the row is skipped, the load continues
        table.push_row(vec![Value::Integer(3)]);
        table.push_row(vec![Value::Integer(5), Value::Integer(6)]);

        let report = load(&mut store, &table, "t").unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.row_count("t").unwrap(), 2);
    }

    #[test]
    fn test_type_inference_rules() {
        let mut table = Table::new(names(&["ints", "floats", "mixed", "dates", "empty"]));
        let day = NaiveDate::from_ymd_opt(2023, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        table.push_row(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Timestamp(day),
            Value::Null,
        ]);
        table.push_row(vec![
            Value::Integer(4),
            Value::Float(2.5),
            Value::Text("x".to_string()),
            Value::Timestamp(day),
            Value::Null,
        ]);

        let schema = infer_schema(&table);
        assert_eq!(schema[0].ty, ColumnType::Integer);
        assert_eq!(schema[1].ty, ColumnType::Float);
        assert_eq!(schema[2].ty, ColumnType::Text);
        assert_eq!(schema[3].ty, ColumnType::Timestamp);
        assert_eq!(schema[4].ty, ColumnType::Text);
    }

    #[test]
    fn test_exclude_columns() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["keep", "drop"]));
        table.push_row(vec![Value::Integer(1), Value::Integer(2)]);

        let options = LoadOptions {
            exclude: vec!["drop".to_string(), "not_there".to_string()],
            schema: None,
        };
        load_with_options(&mut store, &table, "t", &options).unwrap();

        let loaded = fetch_all(&store, "t");
        assert_eq!(loaded.column_names(), &["keep".to_string()]);
    }

    #[test]
    fn test_explicit_schema() {
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["season", "lines"]));
        table.push_row(vec![Value::Integer(2023), Value::Float(8.5)]);

        let options = LoadOptions {
            exclude: vec![],
            schema: Some(vec![
                Column::new("season", ColumnType::Integer),
                Column::new("lines", ColumnType::Float),
            ]),
        };
        load_with_options(&mut store, &table, "win_totals_transformed", &options).unwrap();

        let schema = store.table_schema("win_totals_transformed").unwrap();
        assert_eq!(schema[0], ("season".to_string(), "INTEGER".to_string()));
        assert_eq!(schema[1], ("lines".to_string(), "FLOAT".to_string()));
    }

    #[test]
    fn test_empty_destination_rejected() {
        let mut store = Store::in_memory().unwrap();
        let table = Table::new(names(&["a"]));
        assert!(matches!(
            load(&mut store, &table, ""),
            Err(GridironError::EmptyDestination)
        ));
    }

    #[test]
    fn test_stats_scenario() {
        // End-to-end case: text, float, and a timestamp-or-missing
        // last-modified column.
        let mut store = Store::in_memory().unwrap();
        let mut table = Table::new(names(&["name", "yards", "date_modified"]));
        table.push_row(vec!["A".into(), Value::Float(10.5), Value::Null]);
        table.push_row(vec![
            "B".into(),
            Value::Null,
            Value::Text("2023-09-01".to_string()),
        ]);

        load(&mut store, &table, "stats").unwrap();

        let schema = store.table_schema("stats").unwrap();
        assert_eq!(schema[0], ("name".to_string(), "TEXT".to_string()));
        assert_eq!(schema[1], ("yards".to_string(), "FLOAT".to_string()));
        assert_eq!(
            schema[2],
            ("date_modified".to_string(), "DATETIME".to_string())
        );

        let loaded = fetch_all(&store, "stats");
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.rows()[0][2], Value::Null);
        assert_eq!(loaded.rows()[1][1], Value::Null);
        assert_eq!(
            loaded.rows()[1][2],
            Value::Text("2023-09-01 00:00:00".to_string())
        );
    }

    #[test]
    fn test_unparseable_last_modified_becomes_null() {
        let mut table = Table::new(names(&["date_modified"]));
        table.push_row(vec![Value::Text("not a date".to_string())]);
        table.push_row(vec![Value::Integer(20230901)]);
        normalize(&mut table);
        assert_eq!(table.rows()[0][0], Value::Null);
        assert_eq!(table.rows()[1][0], Value::Null);
    }
}
