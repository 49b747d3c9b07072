//! FILENAME: engine/src/config.rs
//! PURPOSE: Construction-time configuration applied when a table is loaded.
//! CONTEXT: Loaders hand the core a synonym-group list and an optional
//! filter formula. The synonyms are installed on the table; the filter is
//! evaluated per data row (strict mode) and non-matching rows are pruned
//! before anything takes an index into the table.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::table::Table;

/// Configuration consumed while a table is being constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// Synonym groups: each inner list is one set of interchangeable
    /// column names.
    #[serde(default)]
    pub synonyms: Vec<Vec<String>>,

    /// Optional filter condition, evaluated per row at load time.
    #[serde(default)]
    pub filter: Option<String>,
}

impl TableConfig {
    /// Installs the synonym groups and applies the filter, deleting rows
    /// the condition rejects. Rows whose evaluation errors are treated as
    /// evaluating to null and are pruned with the rest; the error count
    /// is not fatal.
    pub fn apply(&self, table: &mut Table) -> Result<(), EngineError> {
        for group in &self.synonyms {
            table.add_synonym_group(group.clone());
        }

        if let Some(filter) = &self.filter {
            let evaluator = Evaluator::new();
            let mut keep = Vec::with_capacity(table.size());
            for row in 0..table.size() {
                let passed = match evaluator.evaluate(table, row, filter) {
                    Ok(outcome) => outcome.passed,
                    Err(_) => false,
                };
                keep.push(passed);
            }
            // Delete from the bottom so earlier indices stay valid
            for row in (0..keep.len()).rev() {
                if !keep[row] {
                    table.delete_row(row);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> Table {
        let mut t = Table::new(vec!["holeid".to_string(), "au".to_string()]);
        t.add_row(vec![Value::from("DH001"), Value::from(0.2)]);
        t.add_row(vec![Value::from("DH002"), Value::from(1.4)]);
        t.add_row(vec![Value::from("DH003"), Value::from(0.9)]);
        t
    }

    #[test]
    fn test_filter_prunes_rows() {
        let mut t = sample();
        let config = TableConfig {
            synonyms: vec![],
            filter: Some("au > 0.5".to_string()),
        };
        config.apply(&mut t).unwrap();
        assert_eq!(t.size(), 2);
        assert_eq!(t.get_one(0, "holeid"), Value::from("DH002"));
    }

    #[test]
    fn test_synonyms_installed() {
        let mut t = sample();
        let config = TableConfig {
            synonyms: vec![vec!["bhid".to_string(), "holeid".to_string()]],
            filter: None,
        };
        config.apply(&mut t).unwrap();
        assert_eq!(t.column_index("bhid"), Some(0));
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let json = r#"{
            "synonyms": [["holeid", "bhid", "dhid"]],
            "filter": "au > 0.5"
        }"#;
        let config: TableConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.synonyms.len(), 1);
        assert_eq!(config.filter.as_deref(), Some("au > 0.5"));
    }
}
