//! FILENAME: join-engine/src/interval.rs
//! PURPOSE: Joins two range-tagged tables into their maximal common refinement.
//! CONTEXT: Each row carries a group key plus a numeric from/to range
//! (drillhole intervals, by default). Per group, every from and to value
//! from both sides becomes a breakpoint; each consecutive breakpoint pair
//! is one output fragment, paired with the covering source interval from
//! each side. When several source intervals cover a fragment (a synthetic
//! gap-filling interval over a real one), the narrowest span wins.
//!
//! Fields marked `sum` in the proration specs are scaled by
//! fragment/interval length so their values distribute proportionally
//! across splits.

use std::collections::HashMap;

use breakdown_engine::AggregationType;
use engine::{RowSource, Table, Value};

use crate::definition::IntervalJoinSpec;

/// One source interval: the backing row plus its parsed range.
#[derive(Debug, Clone, Copy)]
struct Interval {
    row: usize,
    from: f64,
    to: f64,
}

impl Interval {
    fn span(&self) -> f64 {
        self.to - self.from
    }

    /// Whether this interval fully contains the fragment.
    /// A degenerate interval (from > to) can never cover anything,
    /// which is how malformed input partitions without raising.
    fn covers(&self, lo: f64, hi: f64) -> bool {
        self.from <= lo && hi <= self.to
    }
}

/// Runs an interval join and returns the refined table. Output columns:
/// key, from, to, length, then the left side's soft columns, then the
/// right side's.
pub fn interval_join(
    spec: &IntervalJoinSpec,
    left: &dyn RowSource,
    right: &dyn RowSource,
) -> Table {
    let left_soft = soft_columns(left, spec);
    let right_soft = soft_columns(right, spec);

    let mut header = vec![
        spec.key.clone(),
        spec.from.clone(),
        spec.to.clone(),
        "length".to_string(),
    ];
    header.extend(left_soft.iter().cloned());
    header.extend(right_soft.iter().cloned());

    // Group keys in first-seen order: left table first, then any keys
    // appearing only on the right.
    let mut key_order: Vec<(String, Value)> = Vec::new();
    let left_groups = collect_intervals(left, spec, &mut key_order);
    let right_groups = collect_intervals(right, spec, &mut key_order);

    let mut rows: Vec<Vec<Value>> = Vec::new();

    for (canon, raw) in &key_order {
        let lefts = left_groups.get(canon).map(Vec::as_slice).unwrap_or(&[]);
        let rights = right_groups.get(canon).map(Vec::as_slice).unwrap_or(&[]);

        if rights.is_empty() {
            // No right rows for this group: the left rows pass through
            // unfragmented, with the right side's cells left null.
            for interval in lefts {
                let mut row = fragment_prefix(raw, interval.from, interval.to);
                row.extend(side_cells(left, Some(interval), &left_soft, spec, interval.span()));
                row.extend(std::iter::repeat(Value::Empty).take(right_soft.len()));
                rows.push(row);
            }
            continue;
        }

        // Breakpoints: the sorted, de-duplicated set of every from and to
        let mut points: Vec<f64> = Vec::with_capacity((lefts.len() + rights.len()) * 2);
        for interval in lefts.iter().chain(rights.iter()) {
            points.push(interval.from);
            points.push(interval.to);
        }
        points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        points.dedup();

        for pair in points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if hi <= lo {
                continue;
            }
            let mut row = fragment_prefix(raw, lo, hi);
            row.extend(side_cells(left, covering(lefts, lo, hi), &left_soft, spec, hi - lo));
            row.extend(side_cells(right, covering(rights, lo, hi), &right_soft, spec, hi - lo));
            rows.push(row);
        }
    }

    Table::from_rows(header, rows)
}

/// Key, from, to, length cells shared by every output row.
fn fragment_prefix(key: &Value, lo: f64, hi: f64) -> Vec<Value> {
    vec![
        key.clone(),
        Value::Number(lo),
        Value::Number(hi),
        Value::Number(hi - lo),
    ]
}

/// The source interval covering a fragment, narrowest span first so a
/// specific real interval beats an enclosing gap-filler. Equal spans keep
/// the earlier row.
fn covering(intervals: &[Interval], lo: f64, hi: f64) -> Option<&Interval> {
    let mut best: Option<&Interval> = None;
    for interval in intervals {
        if !interval.covers(lo, hi) {
            continue;
        }
        best = match best {
            Some(current) if current.span() <= interval.span() => Some(current),
            _ => Some(interval),
        };
    }
    best
}

/// Reads one side's soft cells for a fragment, null-filled when the side
/// has no covering interval. Sum-marked fields are prorated by
/// fragment/interval length (a zero-length interval passes through
/// unscaled).
fn side_cells(
    source: &dyn RowSource,
    cover: Option<&Interval>,
    soft: &[String],
    spec: &IntervalJoinSpec,
    fragment_length: f64,
) -> Vec<Value> {
    let interval = match cover {
        Some(interval) => interval,
        None => return vec![Value::Empty; soft.len()],
    };

    let refs: Vec<&str> = soft.iter().map(|s| s.as_str()).collect();
    let mut cells = if refs.is_empty() {
        Vec::new()
    } else {
        source.get(interval.row, &refs)
    };

    for (i, name) in soft.iter().enumerate() {
        if !is_prorated(spec, name) || cells[i].is_missing() {
            continue;
        }
        if let Some(value) = cells[i].as_number() {
            let length = interval.span();
            let factor = if length > 0.0 {
                (fragment_length / length).min(1.0)
            } else {
                1.0
            };
            cells[i] = Value::Number(value * factor);
        }
    }

    cells
}

fn is_prorated(spec: &IntervalJoinSpec, name: &str) -> bool {
    spec.prorate
        .iter()
        .any(|cs| cs.aggregation == AggregationType::Sum && cs.source_name() == name)
}

/// Everything except the key and range columns, by resolved index.
fn soft_columns(source: &dyn RowSource, spec: &IntervalJoinSpec) -> Vec<String> {
    let skip: Vec<usize> = [spec.key.as_str(), spec.from.as_str(), spec.to.as_str()]
        .iter()
        .filter_map(|name| source.column_index(name))
        .collect();

    source
        .header()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(_, name)| name)
        .collect()
}

/// Gathers each row's parsed interval, grouped by key, registering keys
/// in first-seen order. Rows without numeric from/to are skipped.
fn collect_intervals(
    source: &dyn RowSource,
    spec: &IntervalJoinSpec,
    key_order: &mut Vec<(String, Value)>,
) -> HashMap<String, Vec<Interval>> {
    let mut groups: HashMap<String, Vec<Interval>> = HashMap::new();

    for row in 0..source.size() {
        let raw = source.get_one(row, &spec.key);
        let canon = raw.display_value();
        let from = source.get_one(row, &spec.from).as_number();
        let to = source.get_one(row, &spec.to).as_number();
        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            _ => continue,
        };

        if !key_order.iter().any(|(existing, _)| existing == &canon) {
            key_order.push((canon.clone(), raw));
        }
        groups.entry(canon).or_default().push(Interval { row, from, to });
    }

    groups
}
