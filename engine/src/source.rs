//! FILENAME: engine/src/source.rs
//! PURPOSE: The row-storage contract every loader must implement.
//! CONTEXT: The core reads rows one at a time and never assumes O(1)
//! random access, so the same algorithms run against the in-memory
//! `Table` or a large-file-backed virtual array living outside this
//! repo. Single-reader, single-writer; no concurrency guarantee.

use crate::table::Table;
use crate::value::Value;

/// Capability contract consumed by the evaluator, the joins, and the
/// breakdown aggregator.
pub trait RowSource {
    /// Row count, excluding the header.
    fn size(&self) -> usize;

    /// Ordered column names.
    fn header(&self) -> Vec<String>;

    /// Reads cells from a row; an empty `cols` list returns the full row.
    fn get(&self, row: usize, cols: &[&str]) -> Vec<Value>;

    /// Writes one cell, creating the column if it does not exist.
    fn set(&mut self, row: usize, col: &str, value: Value);

    /// Resolves a column name (exact, case-insensitive, synonyms).
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Single-cell read convenience.
    fn get_one(&self, row: usize, col: &str) -> Value {
        self.get(row, &[col]).into_iter().next().unwrap_or(Value::Empty)
    }
}

impl RowSource for Table {
    fn size(&self) -> usize {
        Table::size(self)
    }

    fn header(&self) -> Vec<String> {
        Table::header(self).to_vec()
    }

    fn get(&self, row: usize, cols: &[&str]) -> Vec<Value> {
        Table::get(self, row, cols)
    }

    fn set(&mut self, row: usize, col: &str, value: Value) {
        Table::set(self, row, col, value)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        Table::column_index(self, name)
    }
}
