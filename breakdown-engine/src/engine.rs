//! FILENAME: breakdown-engine/src/engine.rs
//! Breakdown Engine - The calculation core that folds a table into one
//! aggregated row per group.
//!
//! This module takes an ordered list of ColumnSpecs (configuration) and a
//! RowSource (data) and produces a new Table (one row per group).
//!
//! Algorithm:
//! 1. Decide the grouping discipline: a trie with dense first-seen ids,
//!    or run-length grouping against the previous row's key only
//! 2. Walk the rows in table order, accumulating per group and per spec
//! 3. Resolve deferred statistics (quartiles, variance, standard error)
//!    in a post-processing pass over the buffered raw values
//! 4. Emit groups in increasing id order under the specs' display names
//!
//! All grouping state lives in this module for the duration of one
//! `calculate` call and is never stored on the shared table, so repeated
//! breakdowns over the same table cannot interfere.

use engine::{RowSource, Table, Value, SENTINEL};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{AggregationType, ColumnSpec, WeightArg};
use crate::stats;

// ============================================================================
// GROUP KEYS
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// A normalized, hashable cell value used in group-key tuples.
/// The -99 sentinel folds into Empty so that rows with a null key and
/// rows with a sentinel key land in the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
}

impl From<&Value> for GroupValue {
    fn from(value: &Value) -> Self {
        if value.is_missing() {
            return GroupValue::Empty;
        }
        match value {
            Value::Empty => GroupValue::Empty,
            Value::Number(n) => GroupValue::Number(OrderedFloat(*n)),
            Value::Text(s) => GroupValue::Text(s.clone()),
        }
    }
}

/// The tuple of key-column values identifying one group.
type GroupKey = SmallVec<[GroupValue; 4]>;

/// One level of the grouping trie.
#[derive(Default)]
struct GroupNode {
    children: FxHashMap<GroupValue, GroupNode>,
    id: Option<usize>,
}

/// Allocates dense, increasing group ids.
///
/// Trie mode ("breakdown"): identical key tuples always reach the same
/// leaf and therefore the same id, even when the rows are not adjacent.
///
/// Sequential mode ("group"): only the immediately preceding row's tuple
/// is remembered, so a tuple that recurs after an intervening different
/// tuple gets a fresh id. This changes results on unsorted input and is
/// relied upon by callers; do not "fix" it to global grouping.
struct Grouper {
    sequential: bool,
    root: GroupNode,
    next_id: usize,
    last: Option<(GroupKey, usize)>,
}

impl Grouper {
    fn new(sequential: bool) -> Self {
        Grouper {
            sequential,
            root: GroupNode::default(),
            next_id: 0,
            last: None,
        }
    }

    fn group_id(&mut self, key: &GroupKey) -> usize {
        if self.sequential {
            if let Some((last_key, id)) = &self.last {
                if last_key == key {
                    return *id;
                }
            }
            let id = self.next_id;
            self.next_id += 1;
            self.last = Some((key.clone(), id));
            return id;
        }

        let mut node = &mut self.root;
        for value in key {
            node = node.children.entry(value.clone()).or_default();
        }
        match node.id {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                node.id = Some(id);
                id
            }
        }
    }
}

// ============================================================================
// ACCUMULATORS
// ============================================================================

/// Per-group, per-spec accumulation state.
enum Accumulator {
    /// Last seen value (key columns).
    Last(Value),
    /// Fixed literal; nothing accumulates.
    Text,
    /// Running total of value * weight.
    Sum(f64),
    /// Weighted online mean.
    Mean { sum_weight: f64, mean: f64 },
    /// value label -> accumulated weight, in first-seen order.
    /// Shared by major, list and list_weight.
    Weighted(Vec<(String, f64)>),
    Min(Option<f64>),
    Max(Option<f64>),
    Count(u64),
    /// Raw values buffered for the deferred statistics pass.
    Buffer(Vec<f64>),
}

impl Accumulator {
    fn new(aggregation: AggregationType) -> Self {
        match aggregation {
            AggregationType::Breakdown | AggregationType::Group => {
                Accumulator::Last(Value::Empty)
            }
            AggregationType::Text => Accumulator::Text,
            AggregationType::Sum => Accumulator::Sum(0.0),
            AggregationType::Mean => Accumulator::Mean {
                sum_weight: 0.0,
                mean: 0.0,
            },
            AggregationType::Major | AggregationType::List | AggregationType::ListWeight => {
                Accumulator::Weighted(Vec::new())
            }
            AggregationType::Min => Accumulator::Min(None),
            AggregationType::Max => Accumulator::Max(None),
            AggregationType::Count => Accumulator::Count(0),
            _ => Accumulator::Buffer(Vec::new()),
        }
    }

    /// Folds one row's value in. The caller has already dropped missing
    /// values and computed the effective weight.
    fn accumulate(&mut self, value: &Value, weight: f64) {
        match self {
            Accumulator::Last(last) => *last = value.clone(),
            Accumulator::Text => {}
            Accumulator::Sum(total) => {
                if let Some(n) = value.as_number() {
                    *total += n * weight;
                }
            }
            Accumulator::Mean { sum_weight, mean } => {
                // Near-zero weights are skipped rather than folded in,
                // so a run of zero-weight rows cannot poison the mean.
                if weight < 0.01 {
                    return;
                }
                if let Some(n) = value.as_number() {
                    *sum_weight += weight;
                    *mean += (n - *mean) * weight / *sum_weight;
                }
            }
            Accumulator::Weighted(entries) => {
                let label = value.display_value();
                match entries.iter_mut().find(|(name, _)| *name == label) {
                    Some((_, w)) => *w += weight,
                    None => entries.push((label, weight)),
                }
            }
            Accumulator::Min(min) => {
                if let Some(n) = value.as_number() {
                    *min = Some(min.map_or(n, |m| m.min(n)));
                }
            }
            Accumulator::Max(max) => {
                if let Some(n) = value.as_number() {
                    *max = Some(max.map_or(n, |m| m.max(n)));
                }
            }
            Accumulator::Count(count) => *count += 1,
            Accumulator::Buffer(values) => {
                if let Some(n) = value.as_number() {
                    values.push(n);
                }
            }
        }
    }

    /// Computes the final output value. Deferred statistics resolve here,
    /// in the post-processing pass.
    fn finish(&self, spec: &ColumnSpec) -> Value {
        match self {
            Accumulator::Last(last) => last.clone(),
            Accumulator::Text => Value::Text(spec.display_name().to_string()),
            Accumulator::Sum(total) => Value::Number(*total),
            Accumulator::Mean { sum_weight, mean } => {
                if *sum_weight > 0.0 {
                    Value::Number(*mean)
                } else {
                    Value::Empty
                }
            }
            Accumulator::Weighted(entries) => match spec.aggregation {
                AggregationType::Major => major(entries),
                AggregationType::List => list(entries),
                AggregationType::ListWeight => list_weight(entries),
                _ => Value::Empty,
            },
            Accumulator::Min(min) => min.map(Value::Number).unwrap_or(Value::Empty),
            Accumulator::Max(max) => max.map(Value::Number).unwrap_or(Value::Empty),
            Accumulator::Count(count) => Value::Number(*count as f64),
            Accumulator::Buffer(values) => {
                let result = match spec.aggregation {
                    AggregationType::Quartile1 => stats::percentile(values, 0.25),
                    AggregationType::Median => stats::percentile(values, 0.50),
                    AggregationType::Quartile3 => stats::percentile(values, 0.75),
                    AggregationType::Variance => stats::sample_variance(values),
                    AggregationType::StandardError => stats::standard_error(values),
                    _ => None,
                };
                result.map(Value::Number).unwrap_or(Value::Empty)
            }
        }
    }
}

/// The value whose accumulated weight is greatest; earlier entries win
/// ties because later entries must be strictly greater to take over.
fn major(entries: &[(String, f64)]) -> Value {
    let mut best: Option<(&str, f64)> = None;
    for (label, weight) in entries {
        match best {
            Some((_, w)) if *weight <= w => {}
            _ => best = Some((label, *weight)),
        }
    }
    best.map(|(label, _)| Value::Text(label.to_string()))
        .unwrap_or(Value::Empty)
}

/// Values ranked by descending accumulated weight, space-joined. The
/// sort is stable, so equal weights keep first-seen order.
fn list(entries: &[(String, f64)]) -> Value {
    if entries.is_empty() {
        return Value::Empty;
    }
    let mut ranked: Vec<&(String, f64)> = entries.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Value::Text(
        ranked
            .iter()
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Normalized weight shares (2 decimals), descending.
fn list_weight(entries: &[(String, f64)]) -> Value {
    let total: f64 = entries.iter().map(|(_, w)| w).sum();
    if entries.is_empty() || total <= 0.0 {
        return Value::Empty;
    }
    let mut ranked: Vec<&(String, f64)> = entries.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Value::Text(
        ranked
            .iter()
            .map(|(_, w)| format!("{:.2}", w / total))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

// ============================================================================
// BREAKDOWN CALCULATOR
// ============================================================================

/// The breakdown aggregator: an ordered spec list applied to a table.
pub struct Breakdown {
    specs: Vec<ColumnSpec>,
}

impl Breakdown {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Breakdown { specs }
    }

    /// The output header: one display name per spec, in spec order.
    pub fn header(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| spec.display_name().to_string())
            .collect()
    }

    /// Runs the aggregation and returns one row per group, in increasing
    /// group-id order.
    pub fn calculate(&self, source: &dyn RowSource) -> Table {
        let key_indices: Vec<usize> = self
            .specs
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.aggregation.is_key())
            .map(|(i, _)| i)
            .collect();

        // One spec typed `group` switches the whole key to run-length
        // grouping; an all-`breakdown` key uses the trie.
        let sequential = self
            .specs
            .iter()
            .any(|spec| spec.aggregation == AggregationType::Group);

        let mut grouper = Grouper::new(sequential);
        let mut groups: Vec<Vec<Accumulator>> = Vec::new();

        for row in 0..source.size() {
            let mut key = GroupKey::new();
            for &i in &key_indices {
                let value = source.get_one(row, self.specs[i].source_name());
                key.push(GroupValue::from(&value));
            }

            let gid = grouper.group_id(&key);
            if gid == groups.len() {
                groups.push(
                    self.specs
                        .iter()
                        .map(|spec| Accumulator::new(spec.aggregation))
                        .collect(),
                );
            }

            for (i, spec) in self.specs.iter().enumerate() {
                let value = source.get_one(row, spec.source_name());
                // Sentinel and missing cells contribute nothing
                if value.is_missing() {
                    continue;
                }
                let weight = row_weight(source, row, &spec.weights);
                groups[gid][i].accumulate(&value, weight);
            }
        }

        let rows: Vec<Vec<Value>> = groups
            .iter()
            .map(|accumulators| {
                accumulators
                    .iter()
                    .zip(&self.specs)
                    .map(|(accumulator, spec)| accumulator.finish(spec))
                    .collect()
            })
            .collect();

        Table::from_rows(self.header(), rows)
    }
}

/// Convenience wrapper: build and run a Breakdown in one call.
pub fn calculate_breakdown(specs: Vec<ColumnSpec>, source: &dyn RowSource) -> Table {
    Breakdown::new(specs).calculate(source)
}

/// The effective weight of one row for one spec: the product of the
/// declared factors. Any factor resolving to the -99 sentinel
/// short-circuits the product to 0; remaining factors are not read.
fn row_weight(source: &dyn RowSource, row: usize, weights: &[WeightArg]) -> f64 {
    let mut product = 1.0;
    for arg in weights {
        let factor = match arg {
            WeightArg::Literal(x) => *x,
            WeightArg::Column(name) => {
                let value = source.get_one(row, name);
                if value.is_missing() {
                    return 0.0;
                }
                value.as_number().unwrap_or(0.0)
            }
        };
        if factor == SENTINEL {
            return 0.0;
        }
        product *= factor;
    }
    product
}
