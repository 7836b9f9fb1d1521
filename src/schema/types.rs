//! Schema type definitions
//!
//! Supported declared types:
//! - INTEGER: 64-bit signed integer
//! - REAL: 64-bit floating point
//! - BOOLEAN: Boolean
//! - DATE: calendar date
//! - TEXT: UTF-8 string

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::Column;

/// Declared column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Integer,
    Real,
    Boolean,
    Date,
    Text,
}

impl DataType {
    /// Returns the canonical type name
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Text => "TEXT",
        }
    }

    /// Strict parse of a declared type name (case-insensitive).
    ///
    /// Anything other than the five canonical names is a schema error.
    pub fn parse(declared: &str) -> Result<Self> {
        match declared.trim().to_ascii_uppercase().as_str() {
            "INTEGER" => Ok(DataType::Integer),
            "REAL" => Ok(DataType::Real),
            "BOOLEAN" => Ok(DataType::Boolean),
            "DATE" => Ok(DataType::Date),
            "TEXT" => Ok(DataType::Text),
            _ => Err(Error::Schema(format!("Invalid data type: {}", declared))),
        }
    }

    /// Lenient mapping of a CREATE TABLE type token.
    ///
    /// Common SQL spellings map onto the five kinds; unknown tokens are TEXT.
    pub fn from_sql_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" => DataType::Integer,
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" | "DECIMAL" => DataType::Real,
            "BOOL" | "BOOLEAN" => DataType::Boolean,
            "DATE" => DataType::Date,
            _ => DataType::Text,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// One column declaration: name plus declared type token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

/// Column name → declared type mapping for one table, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column declaration (builder style)
    pub fn with_column(mut self, name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            declared_type: declared_type.into(),
        });
        self
    }

    /// Builds a schema from (name, type) pairs
    pub fn from_pairs<N, T>(pairs: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |schema, (n, t)| schema.with_column(n, t))
    }

    /// Describes the columns of an existing table
    pub fn of_columns(columns: &[Column]) -> Self {
        Self::from_pairs(
            columns
                .iter()
                .map(|c| (c.name.clone(), c.data_type.type_name())),
        )
    }

    /// Loads a schema from a JSON file (`[{"name": .., "type": ..}, ..]`)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Schema(format!("Invalid schema file {}: {}", path.display(), e))
        })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Declared type token for a column
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.declared_type.as_str())
    }

    /// Resolves every declared type, failing on the first unrecognized one
    pub fn resolve(&self) -> Result<Vec<Column>> {
        self.columns
            .iter()
            .map(|c| Ok(Column::new(c.name.clone(), DataType::parse(&c.declared_type)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> Schema {
        Schema::new()
            .with_column("id", "INTEGER")
            .with_column("name", "TEXT")
            .with_column("age", "integer")
    }

    #[test]
    fn test_resolve_valid_schema() {
        let columns = users_schema().resolve().unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].data_type, DataType::Integer);
    }

    #[test]
    fn test_resolve_rejects_unknown_type() {
        let schema = Schema::new().with_column("a", "INTEGER").with_column("b", "BLOB");
        let err = schema.resolve().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("BLOB"));
    }

    #[test]
    fn test_sql_token_mapping() {
        assert_eq!(DataType::from_sql_token("int"), DataType::Integer);
        assert_eq!(DataType::from_sql_token("DOUBLE"), DataType::Real);
        assert_eq!(DataType::from_sql_token("VARCHAR"), DataType::Text);
        assert_eq!(DataType::from_sql_token("bool"), DataType::Boolean);
    }

    #[test]
    fn test_schema_json_round_trip() {
        let json = serde_json::to_string(&users_schema()).unwrap();
        assert!(json.starts_with('['));
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, users_schema());
        assert_eq!(back.get("age"), Some("integer"));
    }
}
