//! Untyped staging form used only at the persistence boundary

use super::table::{Column, Table};
use super::value::Value;
use crate::schema::DataType;

/// Header plus rows of optional text cells (None = empty field)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Lifts the raw cells into a TEXT-typed table; empty fields become Null
    pub fn into_table(self) -> Table {
        let columns = self
            .header
            .into_iter()
            .map(|name| Column::new(name, DataType::Text))
            .collect();
        let mut table = Table::new(columns);
        *table.rows_mut() = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        Some(s) if !s.is_empty() => Value::Text(s),
                        _ => Value::Null,
                    })
                    .collect()
            })
            .collect();
        table
    }
}
