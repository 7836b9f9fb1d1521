//! Statement executor for tabula
//!
//! SELECT flow (strict order):
//! 1. WHERE, applied to the base table when it names only base columns
//! 2. JOIN (then WHERE, if it was not applied before the join)
//! 3. GROUP BY / aggregates
//! 4. ORDER BY, on output names or input columns
//! 5. Projection
//! 6. LIMIT
//!
//! Mutations act on catalog tables in place. A failure part way through a
//! mutation is not undone; only `Catalog::rollback` restores state.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::parser::{
    ColumnRef, Comparison, CreateTableStatement, DeleteStatement, DropTableStatement,
    InsertStatement, Literal, SelectStatement, Statement, UpdateStatement,
};
use crate::schema::{coerce_value, DataType, Schema};
use crate::table::{Table, Value};

use super::aggregate::Aggregator;
use super::filters::PredicateFilter;
use super::join::{HashJoin, JoinInput};
use super::projection::Projector;
use super::result::ExecutionOutcome;
use super::sorter::ResultSorter;

/// Executes parsed statements against a catalog
pub struct QueryExecutor<'a> {
    catalog: &'a mut Catalog,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self { catalog }
    }

    /// Executes one statement
    pub fn execute(&mut self, statement: &Statement) -> Result<ExecutionOutcome> {
        debug!(kind = statement.kind(), "executing statement");
        match statement {
            Statement::Select(s) => self.select(s).map(ExecutionOutcome::Rows),
            Statement::Insert(s) => self.insert(s).map(ExecutionOutcome::Affected),
            Statement::Update(s) => self.update(s).map(ExecutionOutcome::Affected),
            Statement::Delete(s) => self.delete(s).map(ExecutionOutcome::Affected),
            Statement::CreateTable(s) => self.create(s).map(|_| ExecutionOutcome::Done),
            Statement::DropTable(s) => self.drop(s).map(|_| ExecutionOutcome::Done),
        }
    }

    fn select(&mut self, stmt: &SelectStatement) -> Result<Table> {
        self.catalog.ensure_loaded(&stmt.from)?;
        if let Some(join) = &stmt.join {
            self.catalog.ensure_loaded(&join.table)?;
        }
        let base = self.catalog.get(&stmt.from)?;

        // Step 1: WHERE on the base table
        let pushdown = match (&stmt.selection, &stmt.join) {
            (Some(cmp), Some(join)) => {
                let right = self.catalog.get(&join.table)?;
                Self::applies_to_base(base, &stmt.from, right, &cmp.column)
            }
            (Some(_), None) => true,
            (None, _) => false,
        };
        let mut working = match &stmt.selection {
            Some(cmp) if pushdown => PredicateFilter::apply(base, cmp)?,
            _ => base.clone(),
        };
        if pushdown {
            debug!(rows = working.row_count(), "after WHERE");
        }

        // Step 2: JOIN
        if let Some(join) = &stmt.join {
            let right = self.catalog.get(&join.table)?;
            working = HashJoin::execute(
                JoinInput {
                    name: &stmt.from,
                    table: &working,
                },
                JoinInput {
                    name: &join.table,
                    table: right,
                },
                join,
            )?;
            debug!(rows = working.row_count(), table = %join.table, "after JOIN");

            if let Some(cmp) = stmt.selection.as_ref().filter(|_| !pushdown) {
                working = PredicateFilter::apply(&working, cmp)?;
                debug!(rows = working.row_count(), "after WHERE");
            }
        }

        // Step 3: GROUP BY
        let mut aggregate_columns = Vec::new();
        if !stmt.group_by.is_empty() || stmt.has_aggregates() {
            let grouped = Aggregator::group(&working, &stmt.group_by, &stmt.items)?;
            working = grouped.table;
            aggregate_columns = grouped.aggregate_columns;
            debug!(groups = working.row_count(), "after GROUP BY");
        }

        // Step 4: ORDER BY, each key on an output name first, else on an input column
        let projection = Projector::plan(&working, &stmt.items, &aggregate_columns)?;
        if !stmt.order_by.is_empty() {
            let keys = stmt
                .order_by
                .iter()
                .map(|item| {
                    let idx = match projection.source_of(&item.column) {
                        Some(idx) => idx,
                        None => working.resolve(&item.column)?,
                    };
                    Ok((idx, item.direction))
                })
                .collect::<Result<Vec<_>>>()?;
            ResultSorter::sort_by_columns(&mut working, &keys);
        }

        // Step 5: projection
        let mut result = projection.apply(&working)?;

        // Step 6: LIMIT
        if let Some(limit) = stmt.limit {
            result.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(result)
    }

    /// True when a WHERE column belongs unambiguously to the base table
    fn applies_to_base(base: &Table, base_name: &str, right: &Table, column: &ColumnRef) -> bool {
        let in_base = base.column_index(&column.name).is_some();
        match column.qualifier.as_deref() {
            Some(q) => q == base_name && in_base,
            None => in_base && right.column_index(&column.name).is_none(),
        }
    }

    fn insert(&mut self, stmt: &InsertStatement) -> Result<usize> {
        self.catalog.ensure_loaded(&stmt.table)?;
        let table = self.catalog.get_mut(&stmt.table)?;

        let targets: Vec<usize> = match &stmt.columns {
            Some(names) => names
                .iter()
                .map(|n| {
                    table
                        .column_index(n)
                        .ok_or_else(|| Error::NotFound(format!("Column not found: {}", n)))
                })
                .collect::<Result<_>>()?,
            None => (0..table.column_count()).collect(),
        };

        let mut rows = Vec::with_capacity(stmt.rows.len());
        for literals in &stmt.rows {
            if literals.len() != targets.len() {
                return Err(Error::Parse(format!(
                    "INSERT has {} values but {} columns are expected",
                    literals.len(),
                    targets.len()
                )));
            }
            let mut row = vec![Value::Null; table.column_count()];
            for (&idx, literal) in targets.iter().zip(literals) {
                row[idx] = literal_value(literal, table.columns()[idx].data_type);
            }
            rows.push(row);
        }

        let inserted = rows.len();
        for row in rows {
            table.push_row(row)?;
        }
        debug!(table = %stmt.table, rows = inserted, "inserted");
        Ok(inserted)
    }

    fn update(&mut self, stmt: &UpdateStatement) -> Result<usize> {
        self.catalog.ensure_loaded(&stmt.table)?;
        let table = self.catalog.get_mut(&stmt.table)?;

        let assignments = stmt
            .assignments
            .iter()
            .map(|a| {
                let idx = table
                    .column_index(&a.column)
                    .ok_or_else(|| Error::NotFound(format!("Column not found: {}", a.column)))?;
                Ok((idx, literal_value(&a.value, table.columns()[idx].data_type)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mask = Self::mask(table, stmt.selection.as_ref())?;
        let mut affected = 0;
        for (row, hit) in table.rows_mut().iter_mut().zip(&mask) {
            if !*hit {
                continue;
            }
            for (idx, value) in &assignments {
                row[*idx] = value.clone();
            }
            affected += 1;
        }
        debug!(table = %stmt.table, rows = affected, "updated");
        Ok(affected)
    }

    fn delete(&mut self, stmt: &DeleteStatement) -> Result<usize> {
        self.catalog.ensure_loaded(&stmt.table)?;
        let table = self.catalog.get_mut(&stmt.table)?;

        let removed = match &stmt.selection {
            None => {
                let n = table.row_count();
                table.clear();
                n
            }
            Some(cmp) => {
                let mask = PredicateFilter::mask(table, cmp)?;
                let keep: Vec<bool> = mask.iter().map(|hit| !hit).collect();
                table.retain_by_mask(&keep);
                mask.iter().filter(|hit| **hit).count()
            }
        };
        debug!(table = %stmt.table, rows = removed, "deleted");
        Ok(removed)
    }

    fn create(&mut self, stmt: &CreateTableStatement) -> Result<()> {
        if self.catalog.contains(&stmt.table) {
            if stmt.if_not_exists {
                debug!(table = %stmt.table, "table exists, skipping CREATE");
                return Ok(());
            }
            return Err(Error::DuplicateTable(stmt.table.clone()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = stmt.columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(Error::Parse(format!("Duplicate column name: {}", dup.name)));
        }

        let schema = Schema::from_pairs(stmt.columns.iter().map(|c| {
            (
                c.name.clone(),
                DataType::from_sql_token(&c.type_token).type_name(),
            )
        }));
        self.catalog.create(&stmt.table, schema)
    }

    fn drop(&mut self, stmt: &DropTableStatement) -> Result<()> {
        if stmt.if_exists && !self.catalog.contains(&stmt.table) {
            debug!(table = %stmt.table, "table absent, skipping DROP");
            return Ok(());
        }
        self.catalog.drop(&stmt.table)
    }

    fn mask(table: &Table, selection: Option<&Comparison>) -> Result<Vec<bool>> {
        match selection {
            Some(cmp) => PredicateFilter::mask(table, cmp),
            None => Ok(vec![true; table.row_count()]),
        }
    }
}

/// Converts a literal to a cell of the given column type
fn literal_value(literal: &Literal, data_type: DataType) -> Value {
    let value = match literal {
        Literal::Null => Value::Null,
        Literal::Number(n) => Value::Text(n.clone()),
        Literal::Text(s) => Value::Text(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
    };
    coerce_value(value, data_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::parser::parse;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(Box::new(MemoryStore::new()));
        let fruits = Table::from_rows(
            &["id", "name", "price"],
            vec![
                vec![Value::Int(1), Value::from("Apple"), Value::Int(100)],
                vec![Value::Int(2), Value::from("Banana"), Value::Int(80)],
                vec![Value::Int(3), Value::from("Cherry"), Value::Int(300)],
            ],
        )
        .unwrap();
        catalog.register("fruits", fruits, None).unwrap();
        catalog
    }

    fn run(catalog: &mut Catalog, sql: &str) -> Result<ExecutionOutcome> {
        QueryExecutor::new(catalog).execute(&parse(sql)?)
    }

    fn rows(catalog: &mut Catalog, sql: &str) -> Vec<Vec<Value>> {
        run(catalog, sql)
            .unwrap()
            .into_table()
            .unwrap()
            .into_rows()
    }

    #[test]
    fn test_update_counts_matches() {
        let mut catalog = catalog();
        let outcome = run(&mut catalog, "UPDATE fruits SET price = 90 WHERE name = 'Banana'");
        assert_eq!(outcome.unwrap(), ExecutionOutcome::Affected(1));
        assert_eq!(
            rows(&mut catalog, "SELECT price FROM fruits"),
            vec![vec![Value::Int(100)], vec![Value::Int(90)], vec![Value::Int(300)]]
        );
    }

    #[test]
    fn test_insert_coerces_and_counts() {
        let mut catalog = catalog();
        let outcome = run(
            &mut catalog,
            "INSERT INTO fruits VALUES (4, 'Kiwi', '120'), (5, 'Lime', 'cheap')",
        );
        assert_eq!(outcome.unwrap(), ExecutionOutcome::Affected(2));
        let inserted = rows(&mut catalog, "SELECT id, price FROM fruits WHERE id >= 4");
        assert_eq!(
            inserted,
            vec![vec![Value::Int(4), Value::Int(120)], vec![Value::Int(5), Value::Null]]
        );
    }

    #[test]
    fn test_insert_with_column_list() {
        let mut catalog = catalog();
        run(&mut catalog, "INSERT INTO fruits (name, id) VALUES ('Fig', 9)").unwrap();
        assert_eq!(
            rows(&mut catalog, "SELECT * FROM fruits WHERE id = 9"),
            vec![vec![Value::Int(9), Value::from("Fig"), Value::Null]]
        );
    }

    #[test]
    fn test_insert_arity_mismatch() {
        let mut catalog = catalog();
        let err = run(&mut catalog, "INSERT INTO fruits VALUES (1, 'x')").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_delete_with_and_without_where() {
        let mut catalog = catalog();
        let outcome = run(&mut catalog, "DELETE FROM fruits WHERE price > 90").unwrap();
        assert_eq!(outcome, ExecutionOutcome::Affected(2));
        assert_eq!(rows(&mut catalog, "SELECT name FROM fruits"), vec![vec![Value::from("Banana")]]);

        let outcome = run(&mut catalog, "DELETE FROM fruits").unwrap();
        assert_eq!(outcome, ExecutionOutcome::Affected(1));
        let table = run(&mut catalog, "SELECT * FROM fruits").unwrap().into_table().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_order_by_unprojected_column_and_limit() {
        let mut catalog = catalog();
        assert_eq!(
            rows(&mut catalog, "SELECT name FROM fruits ORDER BY price DESC LIMIT 2"),
            vec![vec![Value::from("Cherry")], vec![Value::from("Apple")]]
        );
    }

    #[test]
    fn test_order_by_alias() {
        let mut catalog = catalog();
        assert_eq!(
            rows(&mut catalog, "SELECT name AS fruit FROM fruits ORDER BY fruit DESC LIMIT 1"),
            vec![vec![Value::from("Cherry")]]
        );
    }

    #[test]
    fn test_order_by_alias_then_unprojected_column() {
        let mut catalog = catalog();
        run(&mut catalog, "INSERT INTO fruits VALUES (4, 'Apple', 50)").unwrap();
        assert_eq!(
            rows(&mut catalog, "SELECT name AS fruit, id FROM fruits ORDER BY fruit, price"),
            vec![
                vec![Value::from("Apple"), Value::Int(4)],
                vec![Value::from("Apple"), Value::Int(1)],
                vec![Value::from("Banana"), Value::Int(2)],
                vec![Value::from("Cherry"), Value::Int(3)],
            ]
        );
    }

    #[test]
    fn test_aggregate_alias_shadowing_group_column() {
        let mut catalog = catalog();
        run(&mut catalog, "INSERT INTO fruits VALUES (4, 'Apple', 50)").unwrap();
        assert_eq!(
            rows(&mut catalog, "SELECT COUNT(*) AS name, name FROM fruits GROUP BY name"),
            vec![
                vec![Value::Int(2), Value::from("Apple")],
                vec![Value::Int(1), Value::from("Banana")],
                vec![Value::Int(1), Value::from("Cherry")],
            ]
        );
    }

    #[test]
    fn test_create_and_drop() {
        let mut catalog = catalog();
        assert_eq!(
            run(&mut catalog, "CREATE TABLE sample (col1 INT, col2 TEXT)").unwrap(),
            ExecutionOutcome::Done
        );
        let table = run(&mut catalog, "SELECT * FROM sample").unwrap().into_table().unwrap();
        assert_eq!(table.column_names(), vec!["col1", "col2"]);
        assert_eq!(table.columns()[0].data_type, DataType::Integer);

        assert!(run(&mut catalog, "CREATE TABLE IF NOT EXISTS sample (x INT)").is_ok());
        assert!(matches!(
            run(&mut catalog, "CREATE TABLE sample (x INT)"),
            Err(Error::DuplicateTable(_))
        ));

        run(&mut catalog, "DROP TABLE sample").unwrap();
        assert!(matches!(run(&mut catalog, "DROP TABLE sample"), Err(Error::NotFound(_))));
        assert!(run(&mut catalog, "DROP TABLE IF EXISTS sample").is_ok());
    }

    #[test]
    fn test_global_aggregate_without_group_by() {
        let mut catalog = catalog();
        assert_eq!(
            rows(&mut catalog, "SELECT COUNT(*), SUM(price) AS total FROM fruits"),
            vec![vec![Value::Int(3), Value::Int(480)]]
        );
        assert!(matches!(
            run(&mut catalog, "SELECT name, COUNT(*) FROM fruits"),
            Err(Error::Grouping(_))
        ));
    }

    #[test]
    fn test_select_missing_table() {
        let mut catalog = catalog();
        assert!(matches!(
            run(&mut catalog, "SELECT * FROM nothing"),
            Err(Error::NotFound(_))
        ));
    }
}
