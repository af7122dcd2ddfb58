//! In-memory tabular data model
//!
//! A [`Table`] is what the provider produces and what the loader persists:
//! ordered column names plus rows of dynamically typed [`Value`]s aligned
//! positionally to the columns.

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source field spellings that mean "not available"
pub const MISSING_SENTINELS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "<NA>", "None"];

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for text fields the source uses as a missing marker
    pub fn is_missing_sentinel(&self) -> bool {
        match self {
            Value::Text(s) => MISSING_SENTINELS.contains(&s.trim()),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqlValue;
        match self {
            Value::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            Value::Text(s) => Ok(ToSqlOutput::Owned(SqlValue::Text(s.clone()))),
            Value::Integer(i) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*i))),
            Value::Float(f) => Ok(ToSqlOutput::Owned(SqlValue::Real(*f))),
            Value::Timestamp(ts) => Ok(ToSqlOutput::Owned(SqlValue::Text(
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            ))),
        }
    }
}

/// Semantic column type, the reduced vocabulary used for schema creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Timestamp,
}

impl ColumnType {
    /// Fixed mapping to the destination store's column type
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Timestamp => "DATETIME",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type())
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Column {
            name: name.into(),
            ty,
        }
    }
}

/// An in-memory table: ordered column names and rows of values
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(names: Vec<String>) -> Self {
        Table {
            names,
            rows: Vec::new(),
        }
    }

    /// Append a row. Arity is not enforced here; the loader reports and
    /// skips rows that do not match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a named column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Value::Null))
                .collect(),
        )
    }

    /// Copy of this table without the named columns. Names that do not
    /// exist are silently ignored.
    pub fn without_columns(&self, exclude: &[String]) -> Table {
        if exclude.is_empty() {
            return self.clone();
        }
        let keep: Vec<usize> = self
            .names
            .iter()
            .enumerate()
            .filter(|(_, name)| !exclude.iter().any(|e| e == *name))
            .map(|(i, _)| i)
            .collect();

        let names = keep.iter().map(|&i| self.names[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                keep.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Table { names, rows }
    }

    /// Append another table's rows. Headers must match exactly.
    pub fn append(&mut self, other: Table) -> crate::Result<()> {
        if self.names != other.names {
            return Err(crate::GridironError::Parse(format!(
                "column mismatch while appending: {:?} vs {:?}",
                self.names, other.names
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Keep only rows for which the predicate holds
    pub fn retain_rows<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| predicate(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_without_columns_preserves_order() {
        let mut table = Table::new(names(&["a", "b", "c"]));
        table.push_row(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);

        let projected = table.without_columns(&["b".to_string()]);
        assert_eq!(projected.column_names(), &["a".to_string(), "c".to_string()]);
        assert_eq!(
            projected.rows()[0],
            vec![Value::Integer(1), Value::Integer(3)]
        );
    }

    #[test]
    fn test_without_columns_ignores_unknown() {
        let table = Table::new(names(&["a", "b"]));
        let projected = table.without_columns(&["missing".to_string()]);
        assert_eq!(projected.column_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_append_checks_headers() {
        let mut left = Table::new(names(&["a"]));
        let right = Table::new(names(&["b"]));
        assert!(left.append(right).is_err());

        let mut ok = Table::new(names(&["a"]));
        let mut more = Table::new(names(&["a"]));
        more.push_row(vec![Value::Integer(1)]);
        ok.append(more).unwrap();
        assert_eq!(ok.row_count(), 1);
    }

    #[test]
    fn test_missing_sentinels() {
        assert!(Value::Text("NA".to_string()).is_missing_sentinel());
        assert!(Value::Text("".to_string()).is_missing_sentinel());
        assert!(!Value::Text("KC".to_string()).is_missing_sentinel());
        assert!(!Value::Integer(0).is_missing_sentinel());
    }
}
