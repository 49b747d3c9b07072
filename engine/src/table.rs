//! FILENAME: engine/src/table.rs
//! PURPOSE: Manages the table data: header, data rows, and name resolution.
//! CONTEXT: This file defines the `Table` struct, the in-memory row store
//! that every other component reads from and writes to. Column lookup goes
//! through a cached name→index map with a case-insensitive fallback and
//! synonym groups, so callers can use whichever alias a data file happens
//! to carry.

use std::collections::HashMap;
use crate::value::Value;

/// An in-memory table: an ordered header plus ordered data rows.
/// Data rows are 0-based and exclude the header. Rows may be shorter than
/// the header; missing cells read back as `Value::Empty`.
#[derive(Debug, Clone)]
pub struct Table {
    /// Ordered column names. Unique by construction.
    header: Vec<String>,

    /// Data rows. Each row is an ordered list of cell values.
    rows: Vec<Vec<Value>>,

    /// Exact name → column index. Rebuilt on any structural header change.
    name_index: HashMap<String, usize>,

    /// Lower-cased name → column index, for the case-insensitive fallback.
    /// Rebuilt together with `name_index`.
    folded_index: HashMap<String, usize>,

    /// Synonym groups: sets of interchangeable column names. Groups are
    /// independent and may name columns that exist in no header yet.
    synonyms: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table from a header row.
    /// Blank names are rewritten to `col{index+1}`; duplicates get a
    /// `_{n}` suffix so that header names are always unique.
    pub fn new(header: Vec<String>) -> Self {
        let mut table = Table {
            header: Vec::new(),
            rows: Vec::new(),
            name_index: HashMap::new(),
            folded_index: HashMap::new(),
            synonyms: Vec::new(),
        };
        table.header = uniquify_header(header);
        table.rebuild_index();
        table
    }

    /// Creates a table from a header plus pre-built data rows.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Table::new(header);
        table.rows = rows;
        table
    }

    /// Number of data rows (the header is not counted).
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// The ordered column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rebuilds the cached name→index maps from the current header.
    /// Every previously returned index is invalid after a structural
    /// header change; callers must resolve again.
    fn rebuild_index(&mut self) {
        self.name_index.clear();
        self.folded_index.clear();
        for (idx, name) in self.header.iter().enumerate() {
            self.name_index.insert(name.clone(), idx);
            // First occurrence wins for the folded map
            self.folded_index
                .entry(name.to_lowercase())
                .or_insert(idx);
        }
    }

    /// Resolves a column name to its index.
    ///
    /// Resolution order:
    /// 1. exact header match
    /// 2. case-insensitive header match
    /// 3. a synonym group containing `name` whose other members match
    ///    the header (exact first, then case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.name_index.get(name) {
            return Some(idx);
        }
        if let Some(&idx) = self.folded_index.get(&name.to_lowercase()) {
            return Some(idx);
        }

        let folded = name.to_lowercase();
        for group in &self.synonyms {
            let in_group = group
                .iter()
                .any(|member| member == name || member.to_lowercase() == folded);
            if !in_group {
                continue;
            }
            for member in group {
                if let Some(&idx) = self.name_index.get(member) {
                    return Some(idx);
                }
                if let Some(&idx) = self.folded_index.get(&member.to_lowercase()) {
                    return Some(idx);
                }
            }
        }

        None
    }

    /// Declares `a` and `b` interchangeable. Joins an existing group
    /// containing either name, else starts a new group. Entries are never
    /// removed. Returns the column index the pair now resolves to, if any.
    pub fn create_synonym(&mut self, a: &str, b: &str) -> Option<usize> {
        let existing = self
            .synonyms
            .iter()
            .position(|group| group.iter().any(|m| m == a || m == b));

        match existing {
            Some(gi) => {
                if !self.synonyms[gi].iter().any(|m| m == a) {
                    self.synonyms[gi].push(a.to_string());
                }
                if !self.synonyms[gi].iter().any(|m| m == b) {
                    self.synonyms[gi].push(b.to_string());
                }
            }
            None => {
                self.synonyms.push(vec![a.to_string(), b.to_string()]);
            }
        }

        self.column_index(a).or_else(|| self.column_index(b))
    }

    /// Installs whole synonym groups (construction-time configuration).
    pub fn add_synonym_group(&mut self, group: Vec<String>) {
        if !group.is_empty() {
            self.synonyms.push(group);
        }
    }

    /// Ordered column names, skipping any that resolve to the same index
    /// as one of the `excluding` names.
    pub fn field_list(&self, excluding: &[&str]) -> Vec<String> {
        let excluded: Vec<usize> = excluding
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        self.header
            .iter()
            .enumerate()
            .filter(|(idx, _)| !excluded.contains(idx))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Appends a column and returns its index. If the name already
    /// resolves to a column, that index is reused instead.
    pub fn add_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.header.push(name.to_string());
        self.rebuild_index();
        self.header.len() - 1
    }

    /// Renames a column in place. Returns false when `old` does not
    /// resolve.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        match self.column_index(old) {
            Some(idx) => {
                self.header[idx] = new.to_string();
                self.rebuild_index();
                true
            }
            None => false,
        }
    }

    /// Removes a column from the header and from every row, then rebuilds
    /// the index cache. All previously resolved indices are invalid after
    /// this. Returns false when the name does not resolve.
    pub fn delete_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.header.remove(idx);
                for row in &mut self.rows {
                    if idx < row.len() {
                        row.remove(idx);
                    }
                }
                self.rebuild_index();
                true
            }
            None => false,
        }
    }

    /// Appends a data row. Short rows are fine; missing cells read back
    /// as empty.
    pub fn add_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Removes a data row by index. Out-of-range indices are ignored.
    pub fn delete_row(&mut self, row: usize) {
        if row < self.rows.len() {
            self.rows.remove(row);
        }
    }

    /// Direct access to the row storage for in-place reordering (sort).
    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    /// Reads cells from a row. With an empty `cols` list the whole row is
    /// returned, padded to the header width. A column that does not
    /// resolve reads as `Value::Empty` (unresolved columns are never
    /// fatal).
    pub fn get(&self, row: usize, cols: &[&str]) -> Vec<Value> {
        let data = match self.rows.get(row) {
            Some(r) => r,
            None => {
                let width = if cols.is_empty() { self.header.len() } else { cols.len() };
                return vec![Value::Empty; width];
            }
        };

        if cols.is_empty() {
            let mut full: Vec<Value> = data.clone();
            full.resize(self.header.len(), Value::Empty);
            return full;
        }

        cols.iter()
            .map(|col| match self.column_index(col) {
                Some(idx) => data.get(idx).cloned().unwrap_or(Value::Empty),
                None => Value::Empty,
            })
            .collect()
    }

    /// Convenience accessor for a single cell.
    pub fn get_one(&self, row: usize, col: &str) -> Value {
        self.get(row, &[col]).into_iter().next().unwrap_or(Value::Empty)
    }

    /// Writes one cell, creating the column first if it does not resolve.
    /// Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, col: &str, value: Value) {
        let idx = match self.column_index(col) {
            Some(idx) => idx,
            None => self.add_column(col),
        };
        if let Some(data) = self.rows.get_mut(row) {
            if data.len() <= idx {
                data.resize(idx + 1, Value::Empty);
            }
            data[idx] = value;
        }
    }
}

/// Rewrites blank and duplicate header names so that every name is
/// unique. Blanks become `col{index+1}`; a duplicate `name` becomes
/// `name_{n}` with the smallest free n >= 2.
fn uniquify_header(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(header.len());

    for (idx, raw) in header.into_iter().enumerate() {
        let trimmed = raw.trim();
        let base = if trimmed.is_empty() {
            format!("col{}", idx + 1)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        if seen.contains_key(&name) {
            let mut n = 2;
            while seen.contains_key(&format!("{}_{}", base, n)) {
                n += 1;
            }
            name = format!("{}_{}", base, n);
        }
        seen.insert(name.clone(), idx);
        result.push(name);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec![
            "holeid".to_string(),
            "from".to_string(),
            "to".to_string(),
            "au".to_string(),
        ]);
        t.add_row(vec![
            Value::from("DH001"),
            Value::from(0.0),
            Value::from(1.5),
            Value::from(0.32),
        ]);
        t.add_row(vec![
            Value::from("DH001"),
            Value::from(1.5),
            Value::from(3.0),
            Value::from(1.07),
        ]);
        t
    }

    #[test]
    fn test_blank_and_duplicate_headers_are_rewritten() {
        let t = Table::new(vec![
            "au".to_string(),
            "".to_string(),
            "au".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(t.header(), &["au", "col2", "au_2", "col4"]);
    }

    #[test]
    fn test_column_index_resolution_order() {
        let t = sample();
        assert_eq!(t.column_index("holeid"), Some(0));
        // Case-insensitive fallback
        assert_eq!(t.column_index("HoleID"), Some(0));
        assert_eq!(t.column_index("missing"), None);
    }

    #[test]
    fn test_synonym_resolution() {
        let mut t = sample();
        assert_eq!(t.column_index("bhid"), None);
        let idx = t.create_synonym("bhid", "holeid");
        assert_eq!(idx, Some(0));
        assert_eq!(t.column_index("bhid"), t.column_index("holeid"));
    }

    #[test]
    fn test_synonym_groups_merge_and_never_shrink() {
        let mut t = sample();
        t.create_synonym("bhid", "dhid");
        t.create_synonym("dhid", "holeid");
        // All three now reach the real column through the merged group
        assert_eq!(t.column_index("bhid"), Some(0));
        assert_eq!(t.column_index("dhid"), Some(0));
    }

    #[test]
    fn test_synonym_may_reference_nonexistent_columns() {
        let mut t = sample();
        assert_eq!(t.create_synonym("ghost", "phantom"), None);
        assert_eq!(t.column_index("ghost"), None);
    }

    #[test]
    fn test_field_list_excludes_by_resolution() {
        let mut t = sample();
        t.create_synonym("bhid", "holeid");
        // Excluding via the synonym removes the real column
        assert_eq!(t.field_list(&["bhid"]), vec!["from", "to", "au"]);
        assert_eq!(
            t.field_list(&[]),
            vec!["holeid", "from", "to", "au"]
        );
    }

    #[test]
    fn test_add_then_delete_column_restores_indices() {
        let mut t = sample();
        let before: Vec<String> = t.header().to_vec();
        let idx = t.add_column("x");
        assert_eq!(idx, 4);
        assert!(t.delete_column("x"));
        assert_eq!(t.header(), before.as_slice());
        assert_eq!(t.column_index("au"), Some(3));
    }

    #[test]
    fn test_add_column_reuses_existing_index() {
        let mut t = sample();
        assert_eq!(t.add_column("au"), 3);
        assert_eq!(t.header().len(), 4);
    }

    #[test]
    fn test_rename_column() {
        let mut t = sample();
        assert!(t.rename_column("au", "au_ppm"));
        assert_eq!(t.column_index("au_ppm"), Some(3));
        assert_eq!(t.column_index("au"), None);
        assert!(!t.rename_column("nope", "x"));
    }

    #[test]
    fn test_get_full_row_and_selected_columns() {
        let t = sample();
        let row = t.get(0, &[]);
        assert_eq!(row.len(), 4);
        let cells = t.get(1, &["au", "holeid"]);
        assert_eq!(cells, vec![Value::from(1.07), Value::from("DH001")]);
        // Unresolved columns read as empty, never fail
        assert_eq!(t.get(0, &["nope"]), vec![Value::Empty]);
    }

    #[test]
    fn test_set_creates_missing_column() {
        let mut t = sample();
        t.set(0, "cu", Value::from(0.5));
        assert_eq!(t.column_index("cu"), Some(4));
        assert_eq!(t.get_one(0, "cu"), Value::from(0.5));
        // Rows that were never touched read empty in the new column
        assert_eq!(t.get_one(1, "cu"), Value::Empty);
    }

    #[test]
    fn test_delete_row() {
        let mut t = sample();
        t.delete_row(0);
        assert_eq!(t.size(), 1);
        assert_eq!(t.get_one(0, "au"), Value::from(1.07));
    }
}
