//! FILENAME: engine/src/ops.rs
//! PURPOSE: Table bookkeeping operations: multi-key sort and two-table diff.
//! CONTEXT: Straightforward helpers layered on the Table API. Sort is a
//! stable multi-key sort that compares numerically when a key column is
//! numeric throughout, lexically otherwise. Compare is a set-difference
//! restricted to a column list, with near-equal numbers treated as equal.

use std::cmp::Ordering;

use crate::table::Table;
use crate::value::Value;

/// Absolute difference below which two numbers compare equal in a diff.
const NUMERIC_TOLERANCE: f64 = 0.01;

/// Sorts the table's data rows in place by the given key columns, in
/// order of significance. The sort is stable, so equal keys keep their
/// original relative order. Key names that do not resolve are skipped.
pub fn sort_rows(table: &mut Table, keys: &[&str]) {
    let cols: Vec<usize> = keys
        .iter()
        .filter_map(|key| table.column_index(key))
        .collect();
    if cols.is_empty() {
        return;
    }

    // A key column compares numerically only when every non-missing
    // value in it matches the numeric pattern.
    let numeric: Vec<bool> = cols
        .iter()
        .map(|&col| {
            let mut any = false;
            for row in 0..table.size() {
                let cell = cell_at(table, row, col);
                if cell == Value::Empty {
                    continue;
                }
                if cell.as_number().is_none() {
                    return false;
                }
                any = true;
            }
            any
        })
        .collect();

    table.rows_mut().sort_by(|a, b| {
        for (i, &col) in cols.iter().enumerate() {
            let va = a.get(col).cloned().unwrap_or(Value::Empty);
            let vb = b.get(col).cloned().unwrap_or(Value::Empty);
            let ord = if numeric[i] {
                let na = va.as_number().unwrap_or(f64::NEG_INFINITY);
                let nb = vb.as_number().unwrap_or(f64::NEG_INFINITY);
                na.partial_cmp(&nb).unwrap_or(Ordering::Equal)
            } else {
                va.display_value().cmp(&vb.display_value())
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Returns the indices of rows in `left` that have no equal row in
/// `right`, with equality restricted to `columns`. Numbers within 0.01
/// absolute compare equal; everything else compares as display text.
pub fn compare_tables(left: &Table, right: &Table, columns: &[&str]) -> Vec<usize> {
    let mut unmatched = Vec::new();

    for lrow in 0..left.size() {
        let lcells = left.get(lrow, columns);
        let mut found = false;
        for rrow in 0..right.size() {
            let rcells = right.get(rrow, columns);
            if rows_equal(&lcells, &rcells) {
                found = true;
                break;
            }
        }
        if !found {
            unmatched.push(lrow);
        }
    }

    unmatched
}

fn rows_equal(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(va, vb)| cells_equal(va, vb))
}

fn cells_equal(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(na), Some(nb)) => (na - nb).abs() < NUMERIC_TOLERANCE,
        _ => a.display_value() == b.display_value(),
    }
}

fn cell_at(table: &Table, row: usize, col: usize) -> Value {
    table.get(row, &[]).get(col).cloned().unwrap_or(Value::Empty)
}
