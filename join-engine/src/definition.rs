//! FILENAME: join-engine/src/definition.rs
//! Join Definitions - The serializable configuration for both join kinds.
//!
//! A KeyJoinSpec describes an equality join on a named column (or on row
//! ordinals when no key is given). An IntervalJoinSpec describes a join
//! of two range-tagged tables into their maximal common refinement.

use serde::{Deserialize, Serialize};

use breakdown_engine::ColumnSpec;

/// Which side's unmatched rows survive the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinMode {
    Left,
    Right,
    Inner,
    Outer,
}

impl Default for JoinMode {
    fn default() -> Self {
        JoinMode::Left
    }
}

/// Configuration for a key join.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyJoinSpec {
    /// Key column name. None joins rows by ordinal position.
    #[serde(default)]
    pub key: Option<String>,

    /// Which unmatched rows to keep.
    #[serde(default)]
    pub mode: JoinMode,

    /// Column names the LEFT side keeps when both sides carry the name.
    /// Without an entry here, the right side wins the schema slot.
    #[serde(default)]
    pub output_columns: Option<Vec<String>>,
}

impl KeyJoinSpec {
    pub fn new(key: Option<&str>, mode: JoinMode) -> Self {
        KeyJoinSpec {
            key: key.map(|k| k.to_string()),
            mode,
            output_columns: None,
        }
    }
}

/// Configuration for an interval join. The defaults match drillhole
/// interval tables: a hole id plus from/to depths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalJoinSpec {
    /// Group key column.
    pub key: String,

    /// Range start column.
    pub from: String,

    /// Range end column.
    pub to: String,

    /// Breakdown specs controlling proration: a field marked `sum` here
    /// is scaled by fragment/interval length so its values distribute
    /// proportionally across splits.
    #[serde(default)]
    pub prorate: Vec<ColumnSpec>,
}

impl Default for IntervalJoinSpec {
    fn default() -> Self {
        IntervalJoinSpec {
            key: "holeid".to_string(),
            from: "from".to_string(),
            to: "to".to_string(),
            prorate: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_spec_defaults() {
        let spec = IntervalJoinSpec::default();
        assert_eq!(spec.key, "holeid");
        assert_eq!(spec.from, "from");
        assert_eq!(spec.to, "to");
        assert!(spec.prorate.is_empty());
    }

    #[test]
    fn test_join_mode_default_is_left() {
        assert_eq!(JoinMode::default(), JoinMode::Left);
    }
}
