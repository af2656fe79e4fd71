//! Row/column view over fetched records.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::pagination::Record;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Columns are the union of record keys in first-seen order; absent keys
    /// become `null`.
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.index_of(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Replaces every column name, in order.
    pub fn rename_columns<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.columns.len() {
            return Err(Error::ColumnCount {
                expected: self.columns.len(),
                found: names.len(),
            });
        }
        self.columns = names;
        Ok(())
    }

    /// One row per element of each array cell in `column`. An empty array
    /// yields a single `null` row; other cells are left as they are.
    pub fn explode(&self, column: &str) -> Table {
        let Some(idx) = self.index_of(column) else {
            return self.clone();
        };

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match &row[idx] {
                Value::Array(items) if items.is_empty() => {
                    let mut r = row.clone();
                    r[idx] = Value::Null;
                    rows.push(r);
                }
                Value::Array(items) => {
                    for item in items {
                        let mut r = row.clone();
                        r[idx] = item.clone();
                        rows.push(r);
                    }
                }
                _ => rows.push(row.clone()),
            }
        }

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Inner join of `self[left_key] == other[right_key]`, then duplicate
    /// rows are dropped.
    ///
    /// Names present on both sides get `_x` (left) and `_y` (right) suffixes.
    /// Explode list-valued keys first if rows should match per element.
    pub fn merge(&self, other: &Table, left_key: &str, right_key: &str) -> Table {
        let (Some(li), Some(ri)) = (self.index_of(left_key), other.index_of(right_key)) else {
            return Table {
                columns: merged_columns(&self.columns, &other.columns),
                rows: Vec::new(),
            };
        };

        let mut rows = Vec::new();
        for left in &self.rows {
            if left[li].is_null() {
                continue;
            }
            for right in other.rows.iter().filter(|r| r[ri] == left[li]) {
                let mut row = left.clone();
                row.extend(right.iter().cloned());
                rows.push(row);
            }
        }

        let mut out = Table {
            columns: merged_columns(&self.columns, &other.columns),
            rows,
        };
        out.drop_duplicates();
        out
    }

    /// Drops repeated rows, keeping the first occurrence.
    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows
            .retain(|row| seen.insert(Value::Array(row.clone()).to_string()));
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn merged_columns(left: &[String], right: &[String]) -> Vec<String> {
    let shared = |name: &String, other: &[String]| other.iter().any(|o| o == name);
    left.iter()
        .map(|c| {
            if shared(c, right) {
                format!("{}_x", c)
            } else {
                c.clone()
            }
        })
        .chain(right.iter().map(|c| {
            if shared(c, left) {
                format!("{}_y", c)
            } else {
                c.clone()
            }
        }))
        .collect()
}
