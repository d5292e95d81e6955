//! Column-ordered result tables.
//!
//! A [`Table`] is an ordered list of column names plus rows of JSON cells
//! aligned to those columns. Query tables (`qid`, `query`, ...) and result
//! tables (`docno`, `score`, `rank`, payload...) share the same type so the
//! fan-out helper can copy identifying columns between them.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, ServiceError};

/// Query identifier column.
pub const QID: &str = "qid";
/// Query text column.
pub const QUERY: &str = "query";
/// Retrieved item identifier column.
pub const DOCNO: &str = "docno";
/// Relevance score column (higher is better).
pub const SCORE: &str = "score";
/// 0-based rank column.
pub const RANK: &str = "rank";

/// Columns that always lead a normalised result table, in this order.
pub const LEADING_COLUMNS: [&str; 5] = [QID, QUERY, DOCNO, SCORE, RANK];

/// An ordered, column-named set of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with the given columns.
    ///
    /// Repeated names are collapsed to their first occurrence.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for column in columns {
            let column = column.into();
            if !table.has_column(&column) {
                table.columns.push(column);
            }
        }
        table
    }

    /// Build a query table from `(qid, query)` pairs.
    pub fn from_queries<I, Q, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = (Q, S)>,
        Q: Into<String>,
        S: Into<String>,
    {
        let mut table = Self::with_columns([QID, QUERY]);
        for (qid, query) in queries {
            table
                .rows
                .push(vec![Value::String(qid.into()), Value::String(query.into())]);
        }
        table
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row whose cells follow the current column order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] if the row width differs from the
    /// number of columns.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ServiceError::Input(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a row given as `(column, value)` pairs.
    ///
    /// Unknown columns are added at the end (earlier rows get `null`);
    /// known columns missing from the record are set to `null`.
    pub fn push_record<I, K>(&mut self, record: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in record {
            let name = name.into();
            match self.column_index(&name) {
                Some(idx) => row[idx] = value,
                None => {
                    self.columns.push(name);
                    for existing in &mut self.rows {
                        existing.push(Value::Null);
                    }
                    row.push(value);
                }
            }
        }
        self.rows.push(row);
    }

    /// Cell at `row` in `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Iterate rows as column-aware views.
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Set a column from one value per row, replacing it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] if `values` does not have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ServiceError::Input(format!(
                "column {name} has {} values but table has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Set every row's cell in `name` to `value`, adding the column if needed.
    pub fn fill_column(&mut self, name: &str, value: Value) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Concatenate tables in order.
    ///
    /// Columns are the union of all input columns in first-seen order; cells
    /// for columns a table does not have are `null`.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Table>,
    {
        let mut out = Self::new();
        for table in tables {
            for column in &table.columns {
                if !out.has_column(column) {
                    out.columns.push(column.clone());
                    for row in &mut out.rows {
                        row.push(Value::Null);
                    }
                }
            }
            let positions: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| out.column_index(c))
                .collect();
            let width = out.columns.len();
            for values in table.rows {
                let mut row = vec![Value::Null; width];
                for (pos, value) in positions.iter().zip(values) {
                    row[*pos] = value;
                }
                out.rows.push(row);
            }
        }
        out
    }

    /// Move the `leading` columns that exist to the front, in that order.
    ///
    /// All other columns keep their relative order.
    pub fn reorder_columns(&mut self, leading: &[&str]) {
        let mut order: Vec<usize> = leading
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        for idx in 0..self.columns.len() {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }
        if order.iter().enumerate().all(|(i, idx)| i == *idx) {
            return;
        }
        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            let mut old = std::mem::take(row);
            *row = order
                .iter()
                .map(|&i| std::mem::replace(&mut old[i], Value::Null))
                .collect();
        }
    }

    /// Put `qid, query, docno, score, rank` first (those present).
    pub fn normalize_columns(&mut self) {
        self.reorder_columns(&LEADING_COLUMNS);
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Cell in the named column.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Cell in the named column, if it is a string.
    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
