//! Select-list projection

use crate::error::{Error, Result};
use crate::parser::{ColumnRef, SelectItem};
use crate::table::{Column, Table};

/// Output columns of a select list and the input column feeding each
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    sources: Vec<usize>,
    columns: Vec<Column>,
}

impl Projection {
    /// Input column index for a reference to an output column, if any
    pub fn source_of(&self, column: &ColumnRef) -> Option<usize> {
        Table::new(self.columns.clone())
            .resolve(column)
            .ok()
            .map(|idx| self.sources[idx])
    }

    /// Copies the projected cells of every row of `table`
    pub fn apply(&self, table: &Table) -> Result<Table> {
        let rows = table
            .rows()
            .iter()
            .map(|row| self.sources.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table::with_rows(self.columns.clone(), rows)
    }
}

/// Maps a table onto the select list
pub struct Projector;

impl Projector {
    /// Resolves the select list against `table`.
    ///
    /// Columns are named by alias, else by the unqualified column name.
    /// The n-th aggregate item reads `aggregate_columns[n]`.
    pub fn plan(
        table: &Table,
        items: &[SelectItem],
        aggregate_columns: &[usize],
    ) -> Result<Projection> {
        let mut sources: Vec<usize> = Vec::new();
        let mut columns: Vec<Column> = Vec::new();
        let mut aggregates = aggregate_columns.iter();

        for item in items {
            match item {
                SelectItem::Wildcard => {
                    sources.extend(0..table.column_count());
                    columns.extend(table.columns().iter().cloned());
                }
                SelectItem::Column { column, alias } => {
                    let idx = table.resolve(column)?;
                    let name = alias.clone().unwrap_or_else(|| column.name.clone());
                    sources.push(idx);
                    columns.push(Column::new(name, table.columns()[idx].data_type));
                }
                SelectItem::Aggregate { alias, .. } => {
                    let idx = aggregates
                        .next()
                        .copied()
                        .filter(|&idx| idx < table.column_count())
                        .ok_or_else(|| Error::NotFound(format!("Column not found: {}", alias)))?;
                    sources.push(idx);
                    columns.push(Column::new(alias.clone(), table.columns()[idx].data_type));
                }
            }
        }

        Ok(Projection { sources, columns })
    }

    /// Builds the output table in select-list order
    pub fn project(
        table: &Table,
        items: &[SelectItem],
        aggregate_columns: &[usize],
    ) -> Result<Table> {
        Self::plan(table, items, aggregate_columns)?.apply(table)
    }
}
