//! FILENAME: join-engine/src/key.rs
//! PURPOSE: Equality join of two tables on a key column or on row ordinals.
//! CONTEXT: The right table is indexed by key once; each left row then
//! looks up its match. Soft columns (everything but the key) from both
//! sides are carried into the output, with the right side winning a
//! contested name unless the spec's override list claims it for the left.

use std::collections::HashMap;

use engine::{RowSource, Table, Value};

use crate::definition::{JoinMode, KeyJoinSpec};

/// Runs a key join and returns the combined table.
pub fn key_join(spec: &KeyJoinSpec, left: &dyn RowSource, right: &dyn RowSource) -> Table {
    let (left_soft, right_soft) = soft_columns(spec, left, right);

    let mut header: Vec<String> = Vec::new();
    if let Some(key) = &spec.key {
        header.push(key.clone());
    }
    header.extend(left_soft.iter().cloned());
    header.extend(right_soft.iter().cloned());

    let left_refs: Vec<&str> = left_soft.iter().map(|s| s.as_str()).collect();
    let right_refs: Vec<&str> = right_soft.iter().map(|s| s.as_str()).collect();

    // Index the right table by key. First occurrence wins a duplicate.
    let right_index: HashMap<String, usize> = match &spec.key {
        Some(key) => {
            let mut index = HashMap::new();
            for row in 0..right.size() {
                let value = right.get_one(row, key);
                if value.is_missing() {
                    continue;
                }
                index.entry(value.display_value()).or_insert(row);
            }
            index
        }
        None => HashMap::new(),
    };

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut right_matched = vec![false; right.size()];

    for lrow in 0..left.size() {
        let (key_value, matched) = match &spec.key {
            Some(key) => {
                let value = left.get_one(lrow, key);
                let found = if value.is_missing() {
                    None
                } else {
                    right_index.get(&value.display_value()).copied()
                };
                (Some(value), found)
            }
            // Ordinal join: row i pairs with row i
            None => (None, (lrow < right.size()).then_some(lrow)),
        };

        if matched.is_none() && matches!(spec.mode, JoinMode::Inner | JoinMode::Right) {
            continue;
        }

        let mut row: Vec<Value> = Vec::with_capacity(header.len());
        if let Some(value) = key_value {
            row.push(value);
        }
        // get() with an empty column list would return the whole row
        if !left_refs.is_empty() {
            row.extend(left.get(lrow, &left_refs));
        }
        match matched {
            Some(rrow) => {
                right_matched[rrow] = true;
                if !right_refs.is_empty() {
                    row.extend(right.get(rrow, &right_refs));
                }
            }
            None => row.extend(std::iter::repeat(Value::Empty).take(right_refs.len())),
        }
        rows.push(row);
    }

    // Right rows with no left match are appended for right/outer joins
    if matches!(spec.mode, JoinMode::Right | JoinMode::Outer) {
        for rrow in 0..right.size() {
            if right_matched[rrow] {
                continue;
            }
            let mut row: Vec<Value> = Vec::with_capacity(header.len());
            if let Some(key) = &spec.key {
                row.push(right.get_one(rrow, key));
            }
            row.extend(std::iter::repeat(Value::Empty).take(left_refs.len()));
            if !right_refs.is_empty() {
                row.extend(right.get(rrow, &right_refs));
            }
            rows.push(row);
        }
    }

    Table::from_rows(header, rows)
}

/// Splits both headers into soft-column lists: the key is dropped from
/// each side, and a name carried by both sides is kept only on the side
/// that wins it (right by default, left when the override list names it).
fn soft_columns(
    spec: &KeyJoinSpec,
    left: &dyn RowSource,
    right: &dyn RowSource,
) -> (Vec<String>, Vec<String>) {
    let key_index_left = spec.key.as_deref().and_then(|k| left.column_index(k));
    let key_index_right = spec.key.as_deref().and_then(|k| right.column_index(k));

    let left_all: Vec<String> = left
        .header()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != key_index_left)
        .map(|(_, name)| name)
        .collect();
    let right_all: Vec<String> = right
        .header()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != key_index_right)
        .map(|(_, name)| name)
        .collect();

    let left_priority = |name: &str| {
        spec.output_columns
            .as_ref()
            .map(|cols| cols.iter().any(|c| c == name))
            .unwrap_or(false)
    };

    let left_soft: Vec<String> = left_all
        .iter()
        .filter(|name| !right_all.contains(name) || left_priority(name))
        .cloned()
        .collect();
    let right_soft: Vec<String> = right_all
        .iter()
        .filter(|name| !left_all.contains(name) || !left_priority(name))
        .cloned()
        .collect();

    (left_soft, right_soft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_table() -> Table {
        let mut t = Table::new(vec!["id".to_string(), "grade".to_string()]);
        for (id, grade) in [(1.0, 0.5), (2.0, 1.1), (3.0, 0.9)] {
            t.add_row(vec![Value::from(id), Value::from(grade)]);
        }
        t
    }

    fn right_table() -> Table {
        let mut t = Table::new(vec!["id".to_string(), "rock".to_string()]);
        for (id, rock) in [(2.0, "OX"), (3.0, "FR"), (4.0, "TR")] {
            t.add_row(vec![Value::from(id), Value::from(rock)]);
        }
        t
    }

    fn ids(table: &Table) -> Vec<f64> {
        (0..table.size())
            .map(|r| table.get_one(r, "id").as_number().unwrap())
            .collect()
    }

    #[test]
    fn test_inner_join_keeps_matches_only() {
        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Inner),
            &left_table(),
            &right_table(),
        );
        assert_eq!(ids(&out), vec![2.0, 3.0]);
        assert_eq!(out.header(), &["id", "grade", "rock"]);
        assert_eq!(out.get_one(0, "rock"), Value::from("OX"));
    }

    #[test]
    fn test_left_join_null_fills_unmatched() {
        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Left),
            &left_table(),
            &right_table(),
        );
        assert_eq!(ids(&out), vec![1.0, 2.0, 3.0]);
        assert_eq!(out.get_one(0, "rock"), Value::Empty);
        assert_eq!(out.get_one(1, "rock"), Value::from("OX"));
    }

    #[test]
    fn test_outer_join_appends_right_only_rows() {
        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Outer),
            &left_table(),
            &right_table(),
        );
        assert_eq!(ids(&out), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.get_one(3, "grade"), Value::Empty);
        assert_eq!(out.get_one(3, "rock"), Value::from("TR"));
    }

    #[test]
    fn test_right_join() {
        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Right),
            &left_table(),
            &right_table(),
        );
        assert_eq!(ids(&out), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_right_wins_contested_column_by_default() {
        let mut right = Table::new(vec!["id".to_string(), "grade".to_string()]);
        right.add_row(vec![Value::from(2.0), Value::from(9.9)]);

        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Inner),
            &left_table(),
            &right,
        );
        assert_eq!(out.header(), &["id", "grade"]);
        assert_eq!(out.get_one(0, "grade"), Value::from(9.9));
    }

    #[test]
    fn test_override_list_gives_left_the_slot() {
        let mut right = Table::new(vec!["id".to_string(), "grade".to_string()]);
        right.add_row(vec![Value::from(2.0), Value::from(9.9)]);

        let mut spec = KeyJoinSpec::new(Some("id"), JoinMode::Inner);
        spec.output_columns = Some(vec!["grade".to_string()]);
        let out = key_join(&spec, &left_table(), &right);
        assert_eq!(out.header(), &["id", "grade"]);
        assert_eq!(out.get_one(0, "grade"), Value::from(1.1));
    }

    #[test]
    fn test_ordinal_join_pairs_rows_by_position() {
        let mut left = Table::new(vec!["a".to_string()]);
        left.add_row(vec![Value::from(10.0)]);
        left.add_row(vec![Value::from(20.0)]);
        let mut right = Table::new(vec!["b".to_string()]);
        right.add_row(vec![Value::from("x")]);

        let out = key_join(&KeyJoinSpec::new(None, JoinMode::Left), &left, &right);
        assert_eq!(out.header(), &["a", "b"]);
        assert_eq!(out.get_one(0, "b"), Value::from("x"));
        assert_eq!(out.get_one(1, "b"), Value::Empty);
    }

    #[test]
    fn test_missing_key_never_matches() {
        let mut left = Table::new(vec!["id".to_string(), "v".to_string()]);
        left.add_row(vec![Value::Empty, Value::from(1.0)]);
        let out = key_join(
            &KeyJoinSpec::new(Some("id"), JoinMode::Left),
            &left,
            &right_table(),
        );
        assert_eq!(out.size(), 1);
        assert_eq!(out.get_one(0, "rock"), Value::Empty);
    }
}
