//! Result types for statement execution

use crate::table::Table;

/// Outcome of executing one statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// SELECT result; owns its rows, independent of the source tables
    Rows(Table),
    /// Rows inserted, updated or deleted
    Affected(usize),
    /// CREATE / DROP
    Done,
}

impl ExecutionOutcome {
    /// Row count as reported by a cursor; -1 when the statement has none
    pub fn rowcount(&self) -> i64 {
        match self {
            ExecutionOutcome::Rows(table) => table.row_count() as i64,
            ExecutionOutcome::Affected(n) => *n as i64,
            ExecutionOutcome::Done => -1,
        }
    }

    /// Returns the result table for SELECT
    pub fn into_table(self) -> Option<Table> {
        match self {
            ExecutionOutcome::Rows(table) => Some(table),
            _ => None,
        }
    }
}
