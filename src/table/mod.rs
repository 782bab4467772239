/// In-memory tabular datasets
///
/// This module provides the row-major table the bridge reads from and writes to:
/// - Schema: ordered, typed column list
/// - Value: a single typed cell
/// - Table: rows plus the column operations graph preparation needs
///   (rename, drop, append, dedup, distinct)
/// - CSV import/export with an explicit schema

pub mod csv_io;
pub mod schema;
pub mod value;

pub use csv_io::CsvOptions;
pub use schema::{Column, ColumnType, Schema};
pub use value::Value;

use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Table errors
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Row {row} out of range for a table of {count} rows")]
    RowOutOfRange { row: usize, count: usize },

    #[error("Row {row} has {actual} values, schema has {expected} columns")]
    Arity {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("Row {row}: cannot parse '{value}' as {dtype} for column '{column}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
        dtype: ColumnType,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TableResult<T> = Result<T, TableError>;

/// Row-major table with a typed schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Create a table from rows, checking arity and cell types
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> TableResult<Self> {
        let mut table = Self::new(schema);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> TableResult<()> {
        if row.len() != self.schema.len() {
            return Err(TableError::Arity {
                row: self.rows.len(),
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        for (value, column) in row.iter().zip(self.schema.columns()) {
            value.check_type(&column.name, column.dtype)?;
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in column `name`
    pub fn value(&self, row: usize, name: &str) -> TableResult<&Value> {
        let idx = self.schema.require(name)?;
        let cells = self.rows.get(row).ok_or(TableError::RowOutOfRange {
            row,
            count: self.rows.len(),
        })?;
        Ok(&cells[idx])
    }

    /// All values of one column, in row order
    pub fn column_values(&self, name: &str) -> TableResult<Vec<&Value>> {
        let idx = self.schema.require(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Distinct values of one column, sorted
    pub fn distinct(&self, name: &str) -> TableResult<BTreeSet<Value>> {
        let idx = self.schema.require(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Rename columns in place
    ///
    /// Renames are applied together, so `{a: b, b: a}` swaps two columns.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) -> TableResult<()> {
        let mut names: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        for (from, to) in renames {
            let idx = self.schema.require(from)?;
            names[idx] = to.to_string();
        }
        let columns = names
            .into_iter()
            .zip(self.schema.columns())
            .map(|(name, column)| Column::new(name, column.dtype))
            .collect();
        self.schema = Schema::new(columns)?;
        Ok(())
    }

    /// Remove columns in place
    pub fn drop_columns(&mut self, names: &[&str]) -> TableResult<()> {
        let mut dropped = HashSet::new();
        for name in names {
            dropped.insert(self.schema.require(name)?);
        }
        self.schema
            .columns_mut()
            .retain_indexed(|idx| !dropped.contains(&idx));
        for row in &mut self.rows {
            row.retain_indexed(|idx| !dropped.contains(&idx));
        }
        Ok(())
    }

    /// Append the rows of `other`, matching columns by name
    ///
    /// Columns only present in `other` are added to this table's schema and
    /// existing rows get `Null` for them; columns missing from `other` are
    /// filled with `Null` in the appended rows.
    pub fn append(&mut self, other: &Table) -> TableResult<()> {
        for column in other.schema.columns() {
            match self.schema.index_of(&column.name) {
                Some(idx) => {
                    let mine = self.schema.columns()[idx].dtype;
                    if mine != column.dtype {
                        return Err(TableError::TypeMismatch {
                            column: column.name.clone(),
                            expected: mine,
                            actual: column.dtype,
                        });
                    }
                }
                None => {
                    self.schema.columns_mut().push(column.clone());
                    for row in &mut self.rows {
                        row.push(Value::Null);
                    }
                }
            }
        }

        let mapping: Vec<Option<usize>> = self
            .schema
            .columns()
            .iter()
            .map(|c| other.schema.index_of(&c.name))
            .collect();
        self.rows.reserve(other.rows.len());
        for row in &other.rows {
            let mapped = mapping
                .iter()
                .map(|src| src.map(|i| row[i].clone()).unwrap_or(Value::Null))
                .collect();
            self.rows.push(mapped);
        }
        Ok(())
    }

    /// Remove rows whose key columns repeat an earlier row; first occurrence wins
    pub fn drop_duplicates(&mut self, keys: &[&str]) -> TableResult<()> {
        let indices = keys
            .iter()
            .map(|k| self.schema.require(k))
            .collect::<TableResult<Vec<_>>>()?;
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<Value> = indices.iter().map(|&i| row[i].clone()).collect();
            seen.insert(key)
        });
        Ok(())
    }

    /// Group row indices by the text of a column
    pub fn group_by(&self, name: &str) -> TableResult<HashMap<String, Vec<usize>>> {
        let idx = self.schema.require(name)?;
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            groups.entry(row[idx].to_string()).or_default().push(i);
        }
        Ok(groups)
    }
}

/// `Vec::retain` with access to the element index
trait RetainIndexed<T> {
    fn retain_indexed<F: FnMut(usize) -> bool>(&mut self, keep: F);
}

impl<T> RetainIndexed<T> for Vec<T> {
    fn retain_indexed<F: FnMut(usize) -> bool>(&mut self, mut keep: F) {
        let mut idx = 0;
        self.retain(|_| {
            let k = keep(idx);
            idx += 1;
            k
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_table() -> Table {
        let schema = Schema::parse("src:str,dst:str,src_type:str,dst_type:str,edge_type:str").unwrap();
        let rows = vec![
            vec!["1".into(), "2".into(), "F".into(), "M".into(), "friend".into()],
            vec!["2".into(), "3".into(), "M".into(), "M".into(), "follower".into()],
            vec!["1".into(), "3".into(), "F".into(), "M".into(), "friend".into()],
        ];
        Table::from_rows(schema, rows).unwrap()
    }

    #[test]
    fn test_from_rows_checks_arity_and_types() {
        let schema = Schema::parse("id:str,age:int").unwrap();
        let arity = Table::from_rows(schema.clone(), vec![vec!["a".into()]]);
        assert!(matches!(arity, Err(TableError::Arity { expected: 2, actual: 1, .. })));

        let typed = Table::from_rows(schema, vec![vec!["a".into(), "x".into()]]);
        assert!(matches!(typed, Err(TableError::TypeMismatch { .. })));
    }

    #[test]
    fn test_value_out_of_range() {
        let table = edge_table();
        assert_eq!(table.value(2, "edge_type").unwrap(), &Value::from("friend"));
        assert!(matches!(
            table.value(3, "edge_type"),
            Err(TableError::RowOutOfRange { row: 3, count: 3 })
        ));
        assert!(matches!(table.value(0, "ERR"), Err(TableError::ColumnNotFound(_))));
    }

    #[test]
    fn test_vertex_table_preparation() {
        let edges = edge_table();

        let mut vertices = edges.clone();
        vertices.rename_columns(&[("src", "id"), ("src_type", "gender")]).unwrap();
        vertices.drop_columns(&["dst", "dst_type", "edge_type"]).unwrap();

        let mut targets = edges.clone();
        targets.rename_columns(&[("dst", "id"), ("dst_type", "gender")]).unwrap();
        targets.drop_columns(&["src", "src_type", "edge_type"]).unwrap();

        vertices.append(&targets).unwrap();
        assert_eq!(vertices.count(), 6);

        vertices.drop_duplicates(&["id"]).unwrap();
        assert_eq!(vertices.schema().names(), vec!["id", "gender"]);
        assert_eq!(vertices.count(), 3);

        let ids: Vec<String> = vertices
            .column_values("id")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_rename_swaps() {
        let mut edges = edge_table();
        edges.rename_columns(&[("src", "dst"), ("dst", "src")]).unwrap();
        assert_eq!(edges.schema().names()[..2], ["dst", "src"]);
    }

    #[test]
    fn test_rename_collision_rejected() {
        let mut edges = edge_table();
        let result = edges.rename_columns(&[("src", "dst")]);
        assert!(matches!(result, Err(TableError::DuplicateColumn(_))));
    }

    #[test]
    fn test_append_fills_missing_columns() {
        let mut left = Table::from_rows(
            Schema::parse("id:str").unwrap(),
            vec![vec!["a".into()]],
        )
        .unwrap();
        let right = Table::from_rows(
            Schema::parse("id:str,age:int").unwrap(),
            vec![vec!["b".into(), Value::Int(4)]],
        )
        .unwrap();

        left.append(&right).unwrap();
        assert_eq!(left.schema().names(), vec!["id", "age"]);
        assert_eq!(left.rows()[0], vec![Value::from("a"), Value::Null]);
        assert_eq!(left.rows()[1], vec![Value::from("b"), Value::Int(4)]);
    }

    #[test]
    fn test_distinct_and_group_by() {
        let edges = edge_table();
        let kinds: Vec<Value> = edges.distinct("edge_type").unwrap().into_iter().collect();
        assert_eq!(kinds, vec![Value::from("follower"), Value::from("friend")]);

        let groups = edges.group_by("edge_type").unwrap();
        assert_eq!(groups["friend"], vec![0, 2]);
        assert_eq!(groups["follower"], vec![1]);
        assert!(edges.group_by("missing").is_err());
    }
}
