//! Inner equi-join
//!
//! Builds a hash index over the right table's key column, then probes it
//! with each left row. Output order is left row order, then right match
//! order. Null keys never match.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::parser::{ColumnRef, JoinClause};
use crate::table::{Column, Row, Table, ValueKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// One side of a join: the table plus the name it is referenced by
pub struct JoinInput<'a> {
    pub name: &'a str,
    pub table: &'a Table,
}

/// Executes inner equi-joins
pub struct HashJoin;

impl HashJoin {
    /// Joins `left` with `right` on the clause's equality condition.
    ///
    /// Column names present on both sides are exposed as `table.column`,
    /// except a shared key name, which appears once.
    pub fn execute(left: JoinInput<'_>, right: JoinInput<'_>, clause: &JoinClause) -> Result<Table> {
        let (left_key, right_key) = Self::key_columns(&left, &right, clause)?;
        let left_idx = Self::index_of(left.table, &left_key)?;
        let right_idx = Self::index_of(right.table, &right_key)?;

        let drop_right_key = left_key.name == right_key.name;
        let right_kept: Vec<usize> = (0..right.table.column_count())
            .filter(|i| !(drop_right_key && *i == right_idx))
            .collect();

        let columns = Self::output_columns(&left, &right, &right_kept);

        let mut index: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        for (i, row) in right.table.rows().iter().enumerate() {
            let key = row[right_idx].key();
            if key != ValueKey::Null {
                index.entry(key).or_default().push(i);
            }
        }

        let mut rows: Vec<Row> = Vec::new();
        for left_row in left.table.rows() {
            let key = left_row[left_idx].key();
            let Some(matches) = index.get(&key) else {
                continue;
            };
            for &r in matches {
                let right_row = &right.table.rows()[r];
                let mut row = left_row.clone();
                row.extend(right_kept.iter().map(|&c| right_row[c].clone()));
                rows.push(row);
            }
        }

        Table::with_rows(columns, rows)
    }

    /// Orients the ON condition so the first column belongs to the left table
    fn key_columns(
        left: &JoinInput<'_>,
        right: &JoinInput<'_>,
        clause: &JoinClause,
    ) -> Result<(ColumnRef, ColumnRef)> {
        let a = Self::side_of(&clause.left, left, right)?;
        let b = Self::side_of(&clause.right, left, right)?;
        match (a, b) {
            (Side::Left, Side::Right) => Ok((clause.left.clone(), clause.right.clone())),
            (Side::Right, Side::Left) => Ok((clause.right.clone(), clause.left.clone())),
            _ => Err(Error::Parse(format!(
                "JOIN condition must compare a column of {} with a column of {}",
                left.name, right.name
            ))),
        }
    }

    fn side_of(column: &ColumnRef, left: &JoinInput<'_>, right: &JoinInput<'_>) -> Result<Side> {
        match column.qualifier.as_deref() {
            Some(q) if q == left.name => Ok(Side::Left),
            Some(q) if q == right.name => Ok(Side::Right),
            Some(q) => Err(Error::NotFound(format!(
                "Table {} is not part of this JOIN",
                q
            ))),
            None => {
                let in_left = left.table.column_index(&column.name).is_some();
                let in_right = right.table.column_index(&column.name).is_some();
                match (in_left, in_right) {
                    (true, false) => Ok(Side::Left),
                    (false, true) => Ok(Side::Right),
                    (true, true) => Err(Error::Parse(format!(
                        "Column reference is ambiguous: {}",
                        column.name
                    ))),
                    (false, false) => {
                        Err(Error::NotFound(format!("Column not found: {}", column.name)))
                    }
                }
            }
        }
    }

    fn index_of(table: &Table, column: &ColumnRef) -> Result<usize> {
        table
            .column_index(&column.name)
            .ok_or_else(|| Error::NotFound(format!("Column not found: {}", column)))
    }

    fn output_columns(
        left: &JoinInput<'_>,
        right: &JoinInput<'_>,
        right_kept: &[usize],
    ) -> Vec<Column> {
        let right_names: HashSet<&str> = right_kept
            .iter()
            .map(|&i| right.table.columns()[i].name.as_str())
            .collect();
        let left_names: HashSet<&str> = left.table.column_names().into_iter().collect();

        let mut columns: Vec<Column> = left
            .table
            .columns()
            .iter()
            .map(|c| {
                if right_names.contains(c.name.as_str()) {
                    Column::new(format!("{}.{}", left.name, c.name), c.data_type)
                } else {
                    c.clone()
                }
            })
            .collect();

        columns.extend(right_kept.iter().map(|&i| {
            let c = &right.table.columns()[i];
            if left_names.contains(c.name.as_str()) {
                Column::new(format!("{}.{}", right.name, c.name), c.data_type)
            } else {
                c.clone()
            }
        }));
        columns
    }
}
