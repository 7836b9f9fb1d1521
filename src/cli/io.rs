//! JSON output for the CLI
//!
//! - One JSON object per line
//! - Result rows map column name to value
//! - Statements without a result print `{"rowcount": n}`

use std::io::Write;

use serde_json::{json, Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::table::{Row, Value};

/// Write result rows as JSON lines
pub fn write_rows<W: Write>(out: &mut W, columns: &[String], rows: &[Row]) -> Result<()> {
    for row in rows {
        let object = row_object(columns, row)?;
        write_line(out, &JsonValue::Object(object))?;
    }
    out.flush().map_err(stdout_error)
}

/// Write the affected-row count of a statement without a result
pub fn write_rowcount<W: Write>(out: &mut W, rowcount: i64) -> Result<()> {
    write_line(out, &json!({ "rowcount": rowcount }))?;
    out.flush().map_err(stdout_error)
}

/// Write one name per line
pub fn write_names<W: Write>(out: &mut W, names: &[String]) -> Result<()> {
    for name in names {
        writeln!(out, "{}", name).map_err(stdout_error)?;
    }
    out.flush().map_err(stdout_error)
}

fn row_object(columns: &[String], row: &[Value]) -> Result<Map<String, JsonValue>> {
    let mut object = Map::with_capacity(columns.len());
    for (name, value) in columns.iter().zip(row) {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::Data(format!("Cannot encode value in '{}': {}", name, e)))?;
        object.insert(name.clone(), value);
    }
    Ok(object)
}

fn write_line<W: Write>(out: &mut W, value: &JsonValue) -> Result<()> {
    serde_json::to_writer(&mut *out, value)
        .map_err(|e| Error::Interface(format!("Failed to write output: {}", e)))?;
    writeln!(out).map_err(stdout_error)
}

fn stdout_error(e: std::io::Error) -> Error {
    Error::io("<stdout>", e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_as_json_lines() {
        let mut out = Vec::new();
        let columns = vec!["name".to_string(), "age".to_string()];
        let rows = vec![
            vec![Value::from("Alice"), Value::Int(30)],
            vec![Value::from("Bob"), Value::Null],
        ];
        write_rows(&mut out, &columns, &rows).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: JsonValue = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "Alice");
        assert_eq!(first["age"], 30);
        let second: JsonValue = serde_json::from_str(lines[1]).unwrap();
        assert!(second["age"].is_null());
    }

    #[test]
    fn test_rowcount_line() {
        let mut out = Vec::new();
        write_rowcount(&mut out, 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"rowcount\":3}\n");
    }
}
