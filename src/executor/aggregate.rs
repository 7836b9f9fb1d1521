//! GROUP BY and aggregate evaluation
//!
//! Output columns are the grouping columns followed by one column per
//! aggregate, named by its alias. Groups appear in first-seen input order.
//! Without GROUP BY, every row belongs to one global group.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::parser::{AggregateArg, AggregateCall, AggregateFunction, ColumnRef, SelectItem};
use crate::schema::DataType;
use crate::table::{Column, Row, Table, Value, ValueKey};

/// An aggregate bound to its input column
struct BoundAggregate {
    func: AggregateFunction,
    /// None counts rows
    input: Option<usize>,
    alias: String,
}

/// Result of grouping
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    pub table: Table,
    /// Output column of each aggregate item, in select-list order
    pub aggregate_columns: Vec<usize>,
}

/// Groups rows and evaluates aggregates
pub struct Aggregator;

impl Aggregator {
    /// Groups `table` by `group_by` and evaluates every aggregate in `items`.
    ///
    /// Plain select items must name a grouping column.
    pub fn group(table: &Table, group_by: &[ColumnRef], items: &[SelectItem]) -> Result<Grouped> {
        let keys = group_by
            .iter()
            .map(|c| table.resolve(c))
            .collect::<Result<Vec<_>>>()?;

        let mut aggregates = Vec::new();
        for item in items {
            match item {
                SelectItem::Wildcard => {
                    for (idx, column) in table.columns().iter().enumerate() {
                        Self::check_grouped(&keys, idx, &column.name)?;
                    }
                }
                SelectItem::Column { column, .. } => {
                    let idx = table.resolve(column)?;
                    Self::check_grouped(&keys, idx, &column.to_string())?;
                }
                SelectItem::Aggregate { call, alias } => {
                    aggregates.push(Self::bind(table, call, alias)?);
                }
            }
        }

        let groups = Self::partition(table, &keys);

        let mut rows: Vec<Row> = Vec::with_capacity(groups.len());
        for members in &groups {
            let first = members.first().map(|&r| &table.rows()[r]);
            let mut row: Row = keys
                .iter()
                .map(|&k| first.map(|r| r[k].clone()).unwrap_or(Value::Null))
                .collect();
            for aggregate in &aggregates {
                row.push(Self::evaluate(table, members, aggregate)?);
            }
            rows.push(row);
        }

        let mut columns: Vec<Column> = keys.iter().map(|&k| table.columns()[k].clone()).collect();
        for (offset, aggregate) in aggregates.iter().enumerate() {
            let position = keys.len() + offset;
            let data_type = Self::output_type(table, aggregate, &mut rows, position);
            columns.push(Column::new(aggregate.alias.clone(), data_type));
        }

        Ok(Grouped {
            table: Table::with_rows(columns, rows)?,
            aggregate_columns: (keys.len()..keys.len() + aggregates.len()).collect(),
        })
    }

    fn check_grouped(keys: &[usize], idx: usize, name: &str) -> Result<()> {
        if keys.contains(&idx) {
            Ok(())
        } else {
            Err(Error::Grouping(format!(
                "Column {} must appear in GROUP BY or be used in an aggregate function",
                name
            )))
        }
    }

    fn bind(table: &Table, call: &AggregateCall, alias: &str) -> Result<BoundAggregate> {
        let input = match &call.arg {
            AggregateArg::Rows => None,
            AggregateArg::Column(column) => Some(table.resolve(column)?),
        };
        Ok(BoundAggregate {
            func: call.func,
            input,
            alias: alias.to_string(),
        })
    }

    /// Row indices per group, groups in first-seen order
    fn partition(table: &Table, keys: &[usize]) -> Vec<Vec<usize>> {
        if keys.is_empty() {
            return vec![(0..table.row_count()).collect()];
        }

        let mut slots: HashMap<Vec<ValueKey>, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (r, row) in table.rows().iter().enumerate() {
            let key: Vec<ValueKey> = keys.iter().map(|&k| row[k].key()).collect();
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(r);
        }
        groups
    }

    fn evaluate(table: &Table, members: &[usize], aggregate: &BoundAggregate) -> Result<Value> {
        let Some(input) = aggregate.input else {
            return Ok(Value::Int(members.len() as i64));
        };
        let values: Vec<&Value> = members
            .iter()
            .map(|&r| &table.rows()[r][input])
            .filter(|v| !v.is_null())
            .collect();

        match aggregate.func {
            AggregateFunction::Count => Ok(Value::Int(values.len() as i64)),
            AggregateFunction::Sum => Self::sum(&values, &aggregate.alias),
            AggregateFunction::Avg => {
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let total = Self::numbers(&values, &aggregate.alias)?.iter().sum::<f64>();
                Ok(Value::Float(total / values.len() as f64))
            }
            AggregateFunction::Max => Ok(values
                .into_iter()
                .max_by(|a, b| a.compare(b))
                .cloned()
                .unwrap_or(Value::Null)),
            AggregateFunction::Min => Ok(values
                .into_iter()
                .min_by(|a, b| a.compare(b))
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    fn sum(values: &[&Value], alias: &str) -> Result<Value> {
        if values.is_empty() {
            return Ok(Value::Null);
        }
        if values.iter().all(|v| matches!(v, Value::Int(_))) {
            let total: i128 = values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => *i as i128,
                    _ => 0,
                })
                .sum();
            if let Ok(total) = i64::try_from(total) {
                return Ok(Value::Int(total));
            }
            return Ok(Value::Float(total as f64));
        }
        Ok(Value::Float(Self::numbers(values, alias)?.iter().sum()))
    }

    fn numbers(values: &[&Value], alias: &str) -> Result<Vec<f64>> {
        values
            .iter()
            .map(|v| {
                let number = match v {
                    Value::Date(_) => None,
                    other => other.as_f64(),
                };
                number.ok_or_else(|| Error::Data(format!("{}: non-numeric value {}", alias, v)))
            })
            .collect()
    }

    /// Picks the declared type of an aggregate column, widening its cells to match
    fn output_type(
        table: &Table,
        aggregate: &BoundAggregate,
        rows: &mut [Row],
        position: usize,
    ) -> DataType {
        let input_type = aggregate.input.map(|i| table.columns()[i].data_type);
        match aggregate.func {
            AggregateFunction::Count => DataType::Integer,
            AggregateFunction::Avg => DataType::Real,
            AggregateFunction::Max | AggregateFunction::Min => {
                input_type.unwrap_or(DataType::Text)
            }
            AggregateFunction::Sum => {
                let all_int = rows
                    .iter()
                    .all(|r| matches!(r[position], Value::Int(_) | Value::Null));
                if all_int {
                    return DataType::Integer;
                }
                for row in rows.iter_mut() {
                    if let Value::Int(i) = row[position] {
                        row[position] = Value::Float(i as f64);
                    }
                }
                DataType::Real
            }
        }
    }
}
