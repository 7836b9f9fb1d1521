//! Schema-driven type coercion
//!
//! Conversion is best-effort per cell: a cell that cannot be represented in
//! the declared type becomes Null instead of failing. Only an unrecognized
//! declared type (or a schema column missing from the table) fails, and it
//! fails before any cell is touched.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::table::{Table, Value};

use super::types::{DataType, Schema};

/// Converts a table to the declared types of `schema`.
///
/// Columns not named by the schema are left unchanged.
pub fn convert(mut table: Table, schema: &Schema) -> Result<Table> {
    let targets = schema.resolve()?;

    let mut plan = Vec::with_capacity(targets.len());
    for target in &targets {
        let idx = table.column_index(&target.name).ok_or_else(|| {
            Error::Schema(format!("Column {} declared in schema but missing from table", target.name))
        })?;
        plan.push((idx, target.data_type));
    }

    for (idx, data_type) in plan {
        for row in table.rows_mut().iter_mut() {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = coerce_value(cell, data_type);
        }
        table.set_column_type(idx, data_type);
    }

    Ok(table)
}

/// Infers declared types for a table of text cells.
///
/// A text column becomes INTEGER, REAL or BOOLEAN only when every non-null
/// cell parses as that type and renders back to exactly the same text, so
/// committing an unmodified table leaves its file unchanged. Anything else
/// stays TEXT. Typed columns keep their type.
pub fn infer_schema(table: &Table) -> Schema {
    Schema::from_pairs(table.columns().iter().enumerate().map(|(idx, column)| {
        let data_type = match column.data_type {
            DataType::Text => {
                let cells: Vec<&str> = table
                    .rows()
                    .iter()
                    .filter_map(|row| match &row[idx] {
                        Value::Text(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                infer_type(&cells)
            }
            other => other,
        };
        (column.name.clone(), data_type.type_name())
    }))
}

fn infer_type(cells: &[&str]) -> DataType {
    if cells.is_empty() {
        DataType::Text
    } else if cells.iter().all(|c| is_canonical_integer(c)) {
        DataType::Integer
    } else if cells.iter().all(|c| is_canonical_real(c)) {
        DataType::Real
    } else if cells.iter().all(|c| *c == "true" || *c == "false") {
        DataType::Boolean
    } else {
        DataType::Text
    }
}

fn is_canonical_integer(cell: &str) -> bool {
    cell.parse::<i64>()
        .map(|i| Value::Int(i).to_string() == cell)
        .unwrap_or(false)
}

// Non-finite values (`nan`, `inf`) are text
fn is_canonical_real(cell: &str) -> bool {
    cell.parse::<f64>()
        .map(|f| f.is_finite() && Value::Float(f).to_string() == cell)
        .unwrap_or(false)
}

/// Coerces one value to a declared type
pub fn coerce_value(value: Value, data_type: DataType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match data_type {
        DataType::Integer => to_integer(value),
        DataType::Real => to_real(value),
        DataType::Boolean => to_boolean(value),
        DataType::Date => to_date(value),
        DataType::Text => match value {
            Value::Text(_) => value,
            other => Value::Text(other.to_string()),
        },
    }
}

fn to_integer(value: Value) -> Value {
    match value {
        Value::Int(_) => value,
        Value::Bool(b) => Value::Int(b as i64),
        Value::Float(f) => integral(f),
        Value::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => s.parse::<f64>().map(integral).unwrap_or(Value::Null),
            }
        }
        Value::Null | Value::Date(_) => Value::Null,
    }
}

fn integral(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Null
    }
}

fn to_real(value: Value) -> Value {
    match value {
        Value::Float(_) => value,
        Value::Int(i) => Value::Float(i as f64),
        Value::Bool(b) => Value::Float(if b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        Value::Null | Value::Date(_) => Value::Null,
    }
}

fn to_boolean(value: Value) -> Value {
    match value {
        Value::Bool(_) => value,
        Value::Text(s) => {
            if s.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if s.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                // general truthiness: any non-empty text
                Value::Bool(!s.is_empty())
            }
        }
        Value::Int(i) => Value::Bool(i != 0),
        Value::Float(f) => Value::Bool(f != 0.0),
        Value::Date(_) => Value::Bool(true),
        Value::Null => Value::Null,
    }
}

fn to_date(value: Value) -> Value {
    match value {
        Value::Date(_) => value,
        Value::Text(s) => parse_date(&s).map(Value::Date).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Parses a calendar date from common text forms
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y/%m/%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}
