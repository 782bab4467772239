use super::{TableError, TableResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar type of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Str,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Str => "str",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ColumnType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "string" | "unicode" => Ok(ColumnType::Str),
            "int" | "int32" | "int64" | "long" => Ok(ColumnType::Int),
            "float" | "float32" | "float64" | "double" => Ok(ColumnType::Float),
            "bool" | "boolean" => Ok(ColumnType::Bool),
            other => Err(TableError::InvalidSchema(format!("unknown column type '{}'", other))),
        }
    }
}

/// Named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// Ordered list of columns
///
/// Column names are unique; every row of a table carries one value per column,
/// in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Build a schema from `(name, type)` pairs
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, ColumnType)]) -> TableResult<Self> {
        Self::new(
            pairs
                .iter()
                .map(|(name, dtype)| Column::new(name.as_ref(), *dtype))
                .collect(),
        )
    }

    /// Parse a compact `name:type,name:type` description
    pub fn parse(text: &str) -> TableResult<Self> {
        let mut columns = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, dtype) = part.split_once(':').ok_or_else(|| {
                TableError::InvalidSchema(format!("expected name:type, got '{}'", part))
            })?;
            columns.push(Column::new(name.trim(), dtype.parse()?));
        }
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of a column that must exist
    pub fn require(&self, name: &str) -> TableResult<usize> {
        self.index_of(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        let schema = Schema::parse("src:str, dst:str, weight:float").unwrap();
        assert_eq!(schema.names(), vec!["src", "dst", "weight"]);
        assert_eq!(schema.columns()[2].dtype, ColumnType::Float);
        assert_eq!(schema.index_of("dst"), Some(1));
        assert!(matches!(schema.require("nope"), Err(TableError::ColumnNotFound(_))));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Schema::from_pairs(&[("id", ColumnType::Str), ("id", ColumnType::Int)]);
        assert!(matches!(result, Err(TableError::DuplicateColumn(name)) if name == "id"));
    }

    #[test]
    fn test_bad_type_name() {
        assert!(Schema::parse("id:uuid").is_err());
        assert!(Schema::parse("id").is_err());
    }
}
