//! Result sorting for query execution
//!
//! Multi-key stable sort. Each key sorts ascending or descending on its
//! own; Null sorts last in both directions.

use std::cmp::Ordering;

use crate::error::Result;
use crate::parser::{OrderByItem, SortDirection};
use crate::table::{Table, Value};

/// Sorts table rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows in place.
    ///
    /// Sort is stable: rows with equal keys keep their input order.
    pub fn sort(table: &mut Table, order_by: &[OrderByItem]) -> Result<()> {
        let keys = order_by
            .iter()
            .map(|item| Ok((table.resolve(&item.column)?, item.direction)))
            .collect::<Result<Vec<_>>>()?;
        Self::sort_by_columns(table, &keys);
        Ok(())
    }

    /// Stable sort on already resolved `(column index, direction)` keys
    pub fn sort_by_columns(table: &mut Table, keys: &[(usize, SortDirection)]) {
        table.rows_mut().sort_by(|a, b| {
            keys.iter()
                .map(|&(idx, direction)| Self::compare_values(&a[idx], &b[idx], direction))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Compares two cells for one key.
    ///
    /// Ordering rules:
    /// - Null after every value, whatever the direction
    /// - Otherwise `Value::compare`, reversed for DESC
    fn compare_values(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match direction {
                SortDirection::Asc => a.compare(b),
                SortDirection::Desc => a.compare(b).reverse(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ColumnRef;

    fn people() -> Table {
        Table::from_rows(
            &["id", "age", "city"],
            vec![
                vec![Value::from("c"), Value::Int(30), Value::from("Oslo")],
                vec![Value::from("a"), Value::Int(20), Value::from("Rome")],
                vec![Value::from("n"), Value::Null, Value::from("Oslo")],
                vec![Value::from("b"), Value::Int(25), Value::from("Oslo")],
                vec![Value::from("d"), Value::Int(20), Value::from("Oslo")],
            ],
        )
        .unwrap()
    }

    fn ids(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn test_sort_ascending() {
        let mut table = people();
        ResultSorter::sort(&mut table, &[OrderByItem::asc(ColumnRef::bare("age"))]).unwrap();
        assert_eq!(ids(&table), vec!["a", "d", "b", "c", "n"]);
    }

    #[test]
    fn test_sort_descending_nulls_last() {
        let mut table = people();
        ResultSorter::sort(&mut table, &[OrderByItem::desc(ColumnRef::bare("age"))]).unwrap();
        assert_eq!(ids(&table), vec!["c", "b", "a", "d", "n"]);
    }

    #[test]
    fn test_sort_multi_key() {
        let mut table = people();
        ResultSorter::sort(
            &mut table,
            &[
                OrderByItem::asc(ColumnRef::bare("city")),
                OrderByItem::desc(ColumnRef::bare("age")),
            ],
        )
        .unwrap();
        assert_eq!(ids(&table), vec!["c", "b", "d", "n", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        // Same city, original order preserved
        let mut table = people();
        ResultSorter::sort(&mut table, &[OrderByItem::asc(ColumnRef::bare("city"))]).unwrap();
        assert_eq!(ids(&table), vec!["c", "n", "b", "d", "a"]);
    }

    #[test]
    fn test_unknown_key() {
        let mut table = people();
        assert!(ResultSorter::sort(&mut table, &[OrderByItem::asc(ColumnRef::bare("zip"))]).is_err());
    }
}
