//! Cursor: statement execution and sequential result retrieval

use tracing::debug;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::executor::ExecutionOutcome;
use crate::parser::{bind, Params};
use crate::table::{Row, Table};

/// Metadata for one result column.
///
/// Only the name is known; type and size fields are always None.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: Option<String>,
    pub display_size: Option<usize>,
    pub internal_size: Option<usize>,
    pub precision: Option<usize>,
    pub scale: Option<usize>,
    pub null_ok: bool,
}

impl ColumnDescription {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: None,
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: true,
        }
    }
}

/// Executes statements and iterates their results
pub struct Cursor<'conn> {
    connection: &'conn Connection,
    result: Option<Table>,
    position: usize,
    rowcount: i64,
    /// Default batch size for `fetchmany`
    pub arraysize: usize,
    last_query: Option<String>,
    closed: bool,
}

impl<'conn> Cursor<'conn> {
    pub(crate) fn new(connection: &'conn Connection) -> Self {
        Self {
            connection,
            result: None,
            position: 0,
            rowcount: -1,
            arraysize: connection.options().arraysize,
            last_query: None,
            closed: false,
        }
    }

    /// Executes one statement.
    ///
    /// Failures surface as `Error::Database` wrapping the structured error;
    /// using a closed cursor is an `Error::Interface`.
    pub fn execute(&mut self, sql: &str, params: impl Into<Params>) -> Result<&mut Self> {
        self.check_open()?;
        let params = params.into();

        match self.run(sql, &params) {
            Ok(outcome) => {
                self.rowcount = outcome.rowcount();
                self.result = outcome.into_table();
                self.position = 0;
                Ok(self)
            }
            Err(e) => {
                debug!(error = %e, "statement failed");
                self.result = None;
                self.position = 0;
                self.rowcount = -1;
                Err(e.into_database())
            }
        }
    }

    fn run(&mut self, sql: &str, params: &Params) -> Result<ExecutionOutcome> {
        let bound = bind(sql, params)?;
        self.last_query = Some(bound.clone());
        self.connection.run(&bound)
    }

    /// Executes the statement once per parameter set; rowcount is the total
    pub fn executemany<I, P>(&mut self, sql: &str, param_sets: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Params>,
    {
        self.check_open()?;
        let mut total = 0;
        for params in param_sets {
            self.execute(sql, params)?;
            total += self.rowcount.max(0);
        }
        self.rowcount = total;
        Ok(self)
    }

    /// Next row, or None when exhausted
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.check_open()?;
        let Some(table) = &self.result else {
            return Ok(None);
        };
        let row = table.rows().get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    /// Up to `size` rows (default `arraysize`), fewer when exhausted
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.check_open()?;
        let size = size.unwrap_or(self.arraysize);
        let mut rows = Vec::with_capacity(size);
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// All remaining rows
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.check_open()?;
        let Some(table) = &self.result else {
            return Ok(Vec::new());
        };
        let rows = table.rows()[self.position.min(table.row_count())..].to_vec();
        self.position = table.row_count();
        Ok(rows)
    }

    /// Iterates the remaining rows
    pub fn rows(&mut self) -> Rows<'_, 'conn> {
        Rows { cursor: self }
    }

    /// Result column metadata; None before any query or after a mutation
    pub fn description(&self) -> Option<Vec<ColumnDescription>> {
        self.result.as_ref().map(|table| {
            table
                .column_names()
                .into_iter()
                .map(ColumnDescription::named)
                .collect()
        })
    }

    /// Rows returned or affected by the last statement; -1 when unknown
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Statement text of the last execution, after parameter binding
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Releases the result; later calls fail
    pub fn close(&mut self) {
        self.result = None;
        self.position = 0;
        self.closed = true;
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Interface("Cursor is closed".into()));
        }
        self.connection.check_open()
    }
}

/// Iterator over a cursor's remaining rows
pub struct Rows<'c, 'conn> {
    cursor: &'c mut Cursor<'conn>,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.fetchone().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::error::ErrorCategory;
    use crate::table::Value;
    use crate::{named_params, params};

    fn connection() -> Connection {
        let fruits = Table::from_rows(
            &["id", "name", "price"],
            vec![
                vec![Value::Int(1), Value::from("Apple"), Value::Int(100)],
                vec![Value::Int(2), Value::from("Banana"), Value::Int(80)],
                vec![Value::Int(3), Value::from("Cherry"), Value::Int(300)],
            ],
        )
        .unwrap();
        let mut tables = std::collections::BTreeMap::new();
        tables.insert("fruits".to_string(), fruits);
        Connection::builder()
            .tables(tables)
            .store(Box::new(MemoryStore::new()))
            .connect()
            .unwrap()
    }

    #[test]
    fn test_fresh_cursor_state() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        assert_eq!(cursor.rowcount(), -1);
        assert!(cursor.description().is_none());
        assert_eq!(cursor.fetchone().unwrap(), None);
        assert!(cursor.fetchall().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_sequence() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT name FROM fruits", ()).unwrap();

        assert_eq!(cursor.rowcount(), 3);
        assert_eq!(cursor.fetchone().unwrap(), Some(vec![Value::from("Apple")]));
        assert_eq!(cursor.fetchmany(None).unwrap().len(), 1);
        assert_eq!(cursor.fetchmany(Some(5)).unwrap(), vec![vec![Value::from("Cherry")]]);
        assert!(cursor.fetchall().unwrap().is_empty());
        assert_eq!(cursor.fetchone().unwrap(), None);
    }

    #[test]
    fn test_description() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .execute("SELECT name AS fruit, price FROM fruits", ())
            .unwrap();
        let description = cursor.description().unwrap();
        assert_eq!(description.len(), 2);
        assert_eq!(description[0].name, "fruit");
        assert!(description[0].type_code.is_none());
        assert!(description[1].null_ok);
    }

    #[test]
    fn test_mutation_clears_result() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT * FROM fruits", ()).unwrap();
        cursor
            .execute("UPDATE fruits SET price = ? WHERE name = ?", params![90, "Banana"])
            .unwrap();
        assert_eq!(cursor.rowcount(), 1);
        assert!(cursor.description().is_none());
        assert_eq!(
            cursor.last_query(),
            Some("UPDATE fruits SET price = 90 WHERE name = 'Banana'")
        );
    }

    #[test]
    fn test_errors_surface_as_database_error() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT * FROM fruits", ()).unwrap();

        let err = cursor
            .execute("SELECT * FROM fruits WHERE a = 1 AND b = 2", ())
            .err()
            .unwrap();
        assert_eq!(err.category(), ErrorCategory::Database);
        assert!(matches!(err.root(), Error::NotSupported(_)));
        assert!(cursor.description().is_none());
        assert_eq!(cursor.rowcount(), -1);
    }

    #[test]
    fn test_executemany_sums_rowcount() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .executemany(
                "INSERT INTO fruits (id, name) VALUES (:id, :name)",
                vec![
                    named_params! { "id" => 4, "name" => "Kiwi" },
                    named_params! { "id" => 5, "name" => "Lime" },
                ],
            )
            .unwrap();
        assert_eq!(cursor.rowcount(), 2);

        cursor.execute("SELECT COUNT(*) FROM fruits", ()).unwrap();
        assert_eq!(cursor.fetchone().unwrap(), Some(vec![Value::Int(5)]));
    }

    #[test]
    fn test_rows_iterator() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .execute("SELECT id FROM fruits WHERE price > ?", params![90])
            .unwrap();
        let ids: Vec<Value> = cursor.rows().map(|r| r.unwrap()[0].clone()).collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn test_closed_cursor_is_interface_error() {
        let conn = connection();
        let mut cursor = conn.cursor().unwrap();
        cursor.close();
        let err = cursor.execute("SELECT * FROM fruits", ()).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Interface);
        assert!(matches!(cursor.fetchone(), Err(Error::Interface(_))));
    }

    #[test]
    fn test_results_independent_of_later_mutation() {
        let conn = connection();
        let mut reader = conn.cursor().unwrap();
        let mut writer = conn.cursor().unwrap();
        reader.execute("SELECT name FROM fruits", ()).unwrap();
        writer.execute("DELETE FROM fruits", ()).unwrap();
        assert_eq!(reader.fetchall().unwrap().len(), 3);
    }
}
