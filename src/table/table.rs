//! In-memory typed tables

use crate::error::{Error, Result};
use crate::parser::ColumnRef;
use crate::schema::DataType;

use super::raw::RawTable;
use super::value::Value;

/// A row is one value per column, in column order
pub type Row = Vec<Value>;

/// Column name and declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered columns plus ordered rows.
///
/// Every cell is Null or matches its column's declared type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table with the given columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows, checking row arity
    pub fn with_rows(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Builds a table from column names and values, inferring column types.
    ///
    /// A column takes the type shared by all its non-null values; columns
    /// with mixed or no values are TEXT and their cells are rendered as text.
    pub fn from_rows(names: &[&str], rows: Vec<Row>) -> Result<Self> {
        let mut types: Vec<Option<DataType>> = vec![None; names.len()];
        let mut mixed = vec![false; names.len()];
        for row in &rows {
            if row.len() != names.len() {
                return Err(Error::Data(format!(
                    "Row has {} values but table has {} columns",
                    row.len(),
                    names.len()
                )));
            }
            for (i, value) in row.iter().enumerate() {
                if let Some(t) = value.data_type() {
                    match types[i] {
                        None => types[i] = Some(t),
                        Some(existing) if existing != t => mixed[i] = true,
                        _ => {}
                    }
                }
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let t = if mixed[i] {
                    DataType::Text
                } else {
                    types[i].unwrap_or(DataType::Text)
                };
                Column::new(*name, t)
            })
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(i, v)| match (&v, columns[i].data_type) {
                        (Value::Null, _) | (Value::Text(_), DataType::Text) => v,
                        (_, DataType::Text) => Value::Text(v.to_string()),
                        _ => v,
                    })
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with exactly this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolves a (possibly qualified) column reference to an index.
    ///
    /// An exact match on the qualified text wins. Otherwise the qualifier is
    /// stripped and the bare name must identify exactly one column, either
    /// by name or as the suffix of a `table.column` name produced by a join.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        if column.qualifier.is_some() {
            if let Some(idx) = self.column_index(&column.to_string()) {
                return Ok(idx);
            }
        }
        if let Some(idx) = self.column_index(&column.name) {
            return Ok(idx);
        }

        let suffix = format!(".{}", column.name);
        let matches: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.ends_with(&suffix))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [idx] => Ok(*idx),
            [] => Err(Error::NotFound(format!("Column not found: {}", column))),
            _ => Err(Error::Parse(format!("Column reference is ambiguous: {}", column))),
        }
    }

    /// Appends a row, checking arity
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Data(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub(crate) fn set_column_type(&mut self, idx: usize, data_type: DataType) {
        self.columns[idx].data_type = data_type;
    }

    /// Keeps rows whose mask entry is true
    pub fn retain_by_mask(&mut self, mask: &[bool]) {
        let mut flags = mask.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));
    }

    /// Returns a new table with the rows whose mask entry is true
    pub fn filtered(&self, mask: &[bool]) -> Table {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Removes every row, keeping the columns
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Untyped staging form for the file codec
    pub fn to_raw(&self) -> RawTable {
        RawTable {
            header: self.columns.iter().map(|c| c.name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(Value::to_raw).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> Table {
        Table::new(vec![
            Column::new("users.id", DataType::Integer),
            Column::new("name", DataType::Text),
            Column::new("orders.id", DataType::Integer),
        ])
    }

    #[test]
    fn test_from_rows_infers_types() {
        let table = Table::from_rows(
            &["id", "name", "misc"],
            vec![
                vec![Value::Int(1), Value::from("Alice"), Value::Int(3)],
                vec![Value::Int(2), Value::Null, Value::from("x")],
            ],
        )
        .unwrap();
        assert_eq!(table.columns()[0].data_type, DataType::Integer);
        assert_eq!(table.columns()[1].data_type, DataType::Text);
        assert_eq!(table.columns()[2].data_type, DataType::Text);
        assert_eq!(table.rows()[0][2], Value::from("3"));
    }

    #[test]
    fn test_push_row_checks_arity() {
        let mut table = Table::new(vec![Column::new("a", DataType::Integer)]);
        assert!(table.push_row(vec![Value::Int(1)]).is_ok());
        assert!(matches!(
            table.push_row(vec![Value::Int(1), Value::Int(2)]),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_resolve_qualified_and_bare() {
        let table = joined();
        assert_eq!(table.resolve(&ColumnRef::qualified("orders", "id")).unwrap(), 2);
        assert_eq!(table.resolve(&ColumnRef::bare("name")).unwrap(), 1);
        assert_eq!(table.resolve(&ColumnRef::qualified("users", "name")).unwrap(), 1);
        assert!(matches!(
            table.resolve(&ColumnRef::bare("id")),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            table.resolve(&ColumnRef::bare("age")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_mask_operations() {
        let mut table = Table::from_rows(
            &["n"],
            vec![vec![Value::Int(1)], vec![Value::Int(2)], vec![Value::Int(3)]],
        )
        .unwrap();
        let kept = table.filtered(&[true, false, true]);
        assert_eq!(kept.row_count(), 2);

        table.retain_by_mask(&[false, true, false]);
        assert_eq!(table.rows(), &[vec![Value::Int(2)]]);
    }
}
