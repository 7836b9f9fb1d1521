//! Predicate filtering for query execution
//!
//! Evaluates a single `column op literal` comparison into a boolean mask
//! aligned to row order. Null cells never match.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::parser::{CompareOp, Comparison, Literal};
use crate::schema::{parse_date, DataType};
use crate::table::{Table, Value};

/// Literal operand prepared once per comparison
#[derive(Debug)]
enum Operand {
    /// NULL literal: nothing matches
    Null,
    /// Equality operand: text form plus numeric/date readings when available
    Equality {
        text: String,
        number: Option<f64>,
        date: Option<NaiveDate>,
    },
    Number(f64),
    Date(NaiveDate),
}

/// Evaluates WHERE comparisons against tables
pub struct PredicateFilter;

impl PredicateFilter {
    /// Returns one flag per row, true where the row satisfies the comparison
    pub fn mask(table: &Table, comparison: &Comparison) -> Result<Vec<bool>> {
        let idx = table.resolve(&comparison.column)?;
        let column = &table.columns()[idx];
        let operand = Self::prepare(comparison, column.data_type)?;

        Ok(table
            .rows()
            .iter()
            .map(|row| Self::matches(&row[idx], comparison.op, &operand))
            .collect())
    }

    /// Returns a new table holding only the matching rows
    pub fn apply(table: &Table, comparison: &Comparison) -> Result<Table> {
        let mask = Self::mask(table, comparison)?;
        Ok(table.filtered(&mask))
    }

    fn prepare(comparison: &Comparison, data_type: DataType) -> Result<Operand> {
        let text = match comparison.value.as_text() {
            Some(text) => text,
            None => return Ok(Operand::Null),
        };

        if !comparison.op.is_ordering() {
            let number = match comparison.value {
                Literal::Bool(_) => None,
                _ => text.trim().parse::<f64>().ok(),
            };
            let date = parse_date(&text);
            return Ok(Operand::Equality { text, number, date });
        }

        if data_type == DataType::Date {
            return parse_date(&text).map(Operand::Date).ok_or_else(|| {
                Error::Data(format!(
                    "Cannot compare DATE column {} with {}",
                    comparison.column, comparison.value
                ))
            });
        }

        text.trim().parse::<f64>().map(Operand::Number).map_err(|_| {
            Error::Data(format!(
                "Cannot compare {} {} {}: value is not numeric",
                comparison.column,
                comparison.op.symbol(),
                comparison.value
            ))
        })
    }

    fn matches(cell: &Value, op: CompareOp, operand: &Operand) -> bool {
        if cell.is_null() {
            return false;
        }
        match operand {
            Operand::Null => false,
            Operand::Equality { text, number, date } => {
                let equal = Self::equals(cell, text, *number, *date);
                match op {
                    CompareOp::NotEq => !equal,
                    _ => equal,
                }
            }
            Operand::Number(bound) => match cell {
                Value::Date(_) => false,
                other => other
                    .as_f64()
                    .map(|v| Self::ordered(op, v.partial_cmp(bound)))
                    .unwrap_or(false),
            },
            Operand::Date(bound) => match cell {
                Value::Date(d) => Self::ordered(op, Some(d.cmp(bound))),
                Value::Text(s) => parse_date(s)
                    .map(|d| Self::ordered(op, Some(d.cmp(bound))))
                    .unwrap_or(false),
                _ => false,
            },
        }
    }

    fn equals(cell: &Value, text: &str, number: Option<f64>, date: Option<NaiveDate>) -> bool {
        match cell {
            Value::Int(_) | Value::Float(_) => match (cell.as_f64(), number) {
                (Some(a), Some(b)) => a == b,
                _ => cell.to_string() == text,
            },
            Value::Bool(b) => b.to_string().eq_ignore_ascii_case(text.trim()),
            Value::Date(d) => match date {
                Some(other) => *d == other,
                None => cell.to_string() == text,
            },
            Value::Text(s) => s == text,
            Value::Null => false,
        }
    }

    fn ordered(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
        use std::cmp::Ordering;

        match (op, ordering) {
            (_, None) => false,
            (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
            (CompareOp::Lt, Some(o)) => o == Ordering::Less,
            (CompareOp::GtEq, Some(o)) => o != Ordering::Less,
            (CompareOp::LtEq, Some(o)) => o != Ordering::Greater,
            (CompareOp::Eq, Some(o)) => o == Ordering::Equal,
            (CompareOp::NotEq, Some(o)) => o != Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ColumnRef;

    fn users() -> Table {
        Table::from_rows(
            &["name", "age", "active"],
            vec![
                vec![Value::from("Alice"), Value::Int(25), Value::Bool(true)],
                vec![Value::from("Bob"), Value::Int(30), Value::Bool(false)],
                vec![Value::from("Cara"), Value::Null, Value::Bool(true)],
                vec![Value::from("Dan"), Value::Int(35), Value::Null],
            ],
        )
        .unwrap()
    }

    fn cmp(column: &str, op: CompareOp, value: Literal) -> Comparison {
        Comparison {
            column: ColumnRef::bare(column),
            op,
            value,
        }
    }

    fn num(n: &str) -> Literal {
        Literal::Number(n.into())
    }

    #[test]
    fn test_numeric_ordering() {
        let mask = PredicateFilter::mask(&users(), &cmp("age", CompareOp::Gt, num("25"))).unwrap();
        assert_eq!(mask, vec![false, true, false, true]);

        let mask =
            PredicateFilter::mask(&users(), &cmp("age", CompareOp::LtEq, num("30"))).unwrap();
        assert_eq!(mask, vec![true, true, false, false]);
    }

    #[test]
    fn test_quoted_number_literal_is_numeric_for_ordering() {
        let lit = Literal::Text("29.5".into());
        let mask = PredicateFilter::mask(&users(), &cmp("age", CompareOp::GtEq, lit)).unwrap();
        assert_eq!(mask, vec![false, true, false, true]);
    }

    #[test]
    fn test_equality_as_text() {
        let lit = Literal::Text("Bob".into());
        let mask = PredicateFilter::mask(&users(), &cmp("name", CompareOp::Eq, lit)).unwrap();
        assert_eq!(mask, vec![false, true, false, false]);

        let mask = PredicateFilter::mask(&users(), &cmp("age", CompareOp::Eq, num("30"))).unwrap();
        assert_eq!(mask, vec![false, true, false, false]);
    }

    #[test]
    fn test_null_never_matches() {
        let mask =
            PredicateFilter::mask(&users(), &cmp("age", CompareOp::NotEq, num("30"))).unwrap();
        assert_eq!(mask, vec![true, false, false, true]);

        let mask =
            PredicateFilter::mask(&users(), &cmp("age", CompareOp::Eq, Literal::Null)).unwrap();
        assert_eq!(mask, vec![false; 4]);
    }

    #[test]
    fn test_boolean_equality() {
        let lit = Literal::Bool(true);
        let mask = PredicateFilter::mask(&users(), &cmp("active", CompareOp::Eq, lit)).unwrap();
        assert_eq!(mask, vec![true, false, true, false]);
    }

    #[test]
    fn test_non_numeric_ordering_literal_is_data_error() {
        let lit = Literal::Text("abc".into());
        let err = PredicateFilter::mask(&users(), &cmp("age", CompareOp::Gt, lit)).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[test]
    fn test_date_ordering() {
        let d = |s: &str| Value::Date(parse_date(s).unwrap());
        let table = Table::from_rows(
            &["day"],
            vec![vec![d("2024-01-01")], vec![d("2024-06-01")]],
        )
        .unwrap();
        let lit = Literal::Text("2024-03-01".into());
        let mask = PredicateFilter::mask(&table, &cmp("day", CompareOp::Gt, lit)).unwrap();
        assert_eq!(mask, vec![false, true]);
    }

    #[test]
    fn test_unknown_column() {
        let err =
            PredicateFilter::mask(&users(), &cmp("salary", CompareOp::Gt, num("1"))).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_apply_filters_rows() {
        let filtered =
            PredicateFilter::apply(&users(), &cmp("age", CompareOp::Lt, num("31"))).unwrap();
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.rows()[1][0], Value::from("Bob"));
    }
}
