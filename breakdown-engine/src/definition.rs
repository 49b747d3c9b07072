//! FILENAME: breakdown-engine/src/definition.rs
//! Breakdown Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a breakdown run.
//! These structures are designed to be:
//! - Serializable (for saving/loading job definitions)
//! - Immutable snapshots of caller intent
//!
//! A breakdown is driven by an ordered list of column specs. Specs typed
//! `breakdown` or `group` form the grouping key in the order given; every
//! other type is an accumulation over the rows of each group.

use serde::{Deserialize, Serialize};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation types for breakdown columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    /// Grouping key column; value in the output is the last seen.
    Breakdown,
    /// Grouping key column with run-length semantics: a new group starts
    /// whenever the key tuple differs from the immediately preceding
    /// row's, even if an identical tuple occurred earlier.
    Group,
    /// Fixed literal taken from the spec's display name.
    Text,
    /// Running total of value * weight.
    Sum,
    /// Weighted online mean; updates with effective weight below 0.01
    /// are skipped.
    Mean,
    /// The value with the greatest accumulated weight, ties resolved by
    /// first-seen order.
    Major,
    /// Space-joined values ranked by descending accumulated weight.
    List,
    /// Space-joined normalized weight shares (2 decimals), descending.
    ListWeight,
    /// Running extremum, ignoring null.
    Min,
    Max,
    /// Contributing-row count. Also the fallback for unknown type names.
    Count,
    /// Deferred: lower quartile of the buffered raw values.
    Quartile1,
    /// Deferred: median of the buffered raw values.
    Median,
    /// Deferred: upper quartile of the buffered raw values.
    Quartile3,
    /// Deferred: sample variance of the buffered raw values.
    Variance,
    /// Deferred: standard error of the buffered raw values.
    StandardError,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Group
    }
}

impl AggregationType {
    /// Parses the type name used in spec lists. A blank name defaults to
    /// `group`; an unrecognized name falls back to `count`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "breakdown" => AggregationType::Breakdown,
            "" | "group" => AggregationType::Group,
            "text" => AggregationType::Text,
            "sum" => AggregationType::Sum,
            "mean" | "average" => AggregationType::Mean,
            "major" => AggregationType::Major,
            "list" => AggregationType::List,
            "list_weight" => AggregationType::ListWeight,
            "min" => AggregationType::Min,
            "max" => AggregationType::Max,
            "q1" => AggregationType::Quartile1,
            "q2" => AggregationType::Median,
            "q3" => AggregationType::Quartile3,
            "variance" => AggregationType::Variance,
            "standard_error" => AggregationType::StandardError,
            _ => AggregationType::Count,
        }
    }

    /// True for the grouping-key types.
    pub fn is_key(self) -> bool {
        matches!(self, AggregationType::Breakdown | AggregationType::Group)
    }

    /// True for types resolved in the post-processing pass over buffered
    /// raw values rather than online.
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            AggregationType::Quartile1
                | AggregationType::Median
                | AggregationType::Quartile3
                | AggregationType::Variance
                | AggregationType::StandardError
        )
    }
}

// ============================================================================
// COLUMN SPECS
// ============================================================================

/// One weight factor for a column spec. The effective weight of a row is
/// the product of all factors; a factor that resolves to the -99 sentinel
/// short-circuits the whole product to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeightArg {
    /// A numeric literal multiplier.
    Literal(f64),
    /// A column name; multiplies by that row's value for the column.
    Column(String),
}

/// One column of a breakdown: where the data comes from, how it is
/// accumulated, and how contributions are weighted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Source column name, optionally with a parenthesized display name
    /// suffix: `au(Gold g/t)` reads from `au` and labels the output
    /// column `Gold g/t`.
    pub column: String,

    /// The aggregation applied to this column.
    pub aggregation: AggregationType,

    /// Weight factors; empty means weight 1.
    #[serde(default)]
    pub weights: Vec<WeightArg>,
}

impl ColumnSpec {
    pub fn new(column: impl Into<String>, aggregation: AggregationType) -> Self {
        ColumnSpec {
            column: column.into(),
            aggregation,
            weights: Vec::new(),
        }
    }

    pub fn with_weights(
        column: impl Into<String>,
        aggregation: AggregationType,
        weights: Vec<WeightArg>,
    ) -> Self {
        ColumnSpec {
            column: column.into(),
            aggregation,
            weights,
        }
    }

    /// The column name data is read from (display suffix stripped).
    pub fn source_name(&self) -> &str {
        match self.column.find('(') {
            Some(pos) if self.column.ends_with(')') => self.column[..pos].trim_end(),
            _ => &self.column,
        }
    }

    /// The output column label: the parenthesized suffix when present,
    /// the raw name otherwise.
    pub fn display_name(&self) -> &str {
        match self.column.find('(') {
            Some(pos) if self.column.ends_with(')') => {
                &self.column[pos + 1..self.column.len() - 1]
            }
            _ => &self.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregation_names() {
        assert_eq!(AggregationType::parse("breakdown"), AggregationType::Breakdown);
        assert_eq!(AggregationType::parse(""), AggregationType::Group);
        assert_eq!(AggregationType::parse("group"), AggregationType::Group);
        assert_eq!(AggregationType::parse("average"), AggregationType::Mean);
        assert_eq!(AggregationType::parse("MEAN"), AggregationType::Mean);
        assert_eq!(AggregationType::parse("list_weight"), AggregationType::ListWeight);
        assert_eq!(AggregationType::parse("q2"), AggregationType::Median);
        // Unknown names count contributing rows
        assert_eq!(AggregationType::parse("bogus"), AggregationType::Count);
    }

    #[test]
    fn test_display_name_override() {
        let spec = ColumnSpec::new("au(Gold g/t)", AggregationType::Mean);
        assert_eq!(spec.source_name(), "au");
        assert_eq!(spec.display_name(), "Gold g/t");

        let plain = ColumnSpec::new("au", AggregationType::Mean);
        assert_eq!(plain.source_name(), "au");
        assert_eq!(plain.display_name(), "au");
    }

    #[test]
    fn test_spec_roundtrips_through_serde() {
        let spec = ColumnSpec::with_weights(
            "au",
            AggregationType::Mean,
            vec![
                WeightArg::Column("length".to_string()),
                WeightArg::Literal(2.65),
            ],
        );
        let json = serde_json::to_string(&spec).unwrap();
        let back: ColumnSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.column, "au");
        assert_eq!(back.weights.len(), 2);
    }
}
