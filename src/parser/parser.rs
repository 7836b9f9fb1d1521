//! Recursive-descent statement parser
//!
//! Consumes the token stream produced by the `sqlparser` tokenizer and builds
//! a `Statement`. The grammar is deliberately small:
//!
//! ```text
//! SELECT items FROM t [[INNER] JOIN t2 ON a = b] [WHERE cmp]
//!        [GROUP BY c, ...] [ORDER BY c [ASC|DESC], ...] [LIMIT n]
//! INSERT INTO t [(c, ...)] VALUES (lit, ...)[, (lit, ...)]
//! UPDATE t SET c = lit, ... [WHERE cmp]
//! DELETE FROM t [WHERE cmp]
//! CREATE TABLE [IF NOT EXISTS] t (c type, ...)
//! DROP TABLE [IF EXISTS] t
//! ```
//!
//! WHERE holds exactly one `column op literal` comparison. Compound
//! predicates, IN, LIKE, BETWEEN, outer joins, HAVING and OFFSET are
//! rejected as not supported rather than approximated.

use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::{Error, Result};

use super::ast::*;

/// Words that cannot be used as bare identifiers or aliases
const RESERVED: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "ON",
    "GROUP", "ORDER", "BY", "LIMIT", "OFFSET", "HAVING", "AS", "AND", "OR", "NOT", "IN", "LIKE",
    "BETWEEN", "IS", "VALUES", "SET", "INTO", "UNION", "ASC", "DESC", "DISTINCT",
];

/// Parses one SQL statement
pub fn parse(sql: &str) -> Result<Statement> {
    Parser::new(tokenize(sql)?).parse_statement()
}

/// Tokenizes raw SQL, dropping whitespace
pub fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| Error::Parse(e.to_string()))?;
    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

/// Parser over a whitespace-free token stream
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses a complete statement, dispatching on the leading keyword
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let keyword = match self.peek() {
            Some(Token::Word(w)) => w.value.to_ascii_uppercase(),
            Some(t) => return Err(Error::Parse(format!("Unexpected token at start of statement: {}", t))),
            None => return Err(Error::Parse("Empty statement".into())),
        };

        match keyword.as_str() {
            "SELECT" => self.parse_select().map(Statement::Select),
            "INSERT" => self.parse_insert().map(Statement::Insert),
            "UPDATE" => self.parse_update().map(Statement::Update),
            "DELETE" => self.parse_delete().map(Statement::Delete),
            "CREATE" => self.parse_create().map(Statement::CreateTable),
            "DROP" => self.parse_drop().map(Statement::DropTable),
            other => Err(Error::NotSupported(format!("Unsupported SQL statement: {}", other))),
        }
    }

    // =========================================================================
    // SELECT
    // =========================================================================

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword("SELECT")?;
        let items = self.parse_select_list()?;

        if !self.next_keyword("FROM") {
            return Err(Error::Parse("No FROM keyword found".into()));
        }
        let from = self.parse_identifier("table name")?;

        let join = self.parse_join()?;
        if self.peek_keyword("JOIN") || self.peek_keyword("INNER") {
            return Err(Error::NotSupported("Only one JOIN clause is supported".into()));
        }

        let selection = if self.next_keyword("WHERE") {
            Some(self.parse_comparison()?)
        } else {
            None
        };

        let group_by = if self.next_keyword("GROUP") {
            self.expect_keyword("BY")?;
            self.parse_comma_separated(Self::parse_column_ref)?
        } else {
            Vec::new()
        };
        if self.peek_keyword("HAVING") {
            return Err(Error::NotSupported("HAVING is not supported".into()));
        }

        let order_by = if self.next_keyword("ORDER") {
            self.expect_keyword("BY")?;
            self.parse_comma_separated(Self::parse_order_by_item)?
        } else {
            Vec::new()
        };

        let limit = if self.next_keyword("LIMIT") {
            Some(self.parse_limit()?)
        } else {
            None
        };
        if self.peek_keyword("OFFSET") {
            return Err(Error::NotSupported("OFFSET is not supported".into()));
        }

        self.expect_end()?;

        Ok(SelectStatement {
            items,
            from,
            join,
            selection,
            group_by,
            order_by,
            limit,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        if self.peek().is_none() || self.peek_keyword("FROM") {
            return Err(Error::Parse("Invalid select list: no columns".into()));
        }
        self.parse_comma_separated(Self::parse_select_item)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.next_token_if(&Token::Mul) {
            return Ok(SelectItem::Wildcard);
        }

        match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Word(w)), Some(Token::LParen)) if w.quote_style.is_none() => {
                let name = w.value.clone();
                self.pos += 1;
                self.parse_aggregate(name)
            }
            (Some(Token::Word(_)), _) => {
                let column = self.parse_column_ref()?;
                let alias = self.parse_alias()?;
                Ok(SelectItem::Column { column, alias })
            }
            (Some(t), _) => Err(Error::Parse(format!("Invalid select list item: {}", t))),
            (None, _) => Err(Error::Parse("Invalid select list: unexpected end".into())),
        }
    }

    fn parse_aggregate(&mut self, name: String) -> Result<SelectItem> {
        let func = AggregateFunction::from_name(&name)
            .ok_or_else(|| Error::Parse(format!("Unknown aggregate function: {}", name)))?;
        self.expect_token(&Token::LParen)?;

        let (arg, arg_text) = if self.next_token_if(&Token::Mul) {
            if !func.allows_star() {
                return Err(Error::Parse(format!("{}(*) is not supported", func.name())));
            }
            (AggregateArg::Rows, "*".to_string())
        } else if self.peek() == Some(&Token::RParen) {
            if func.needs_column() {
                return Err(Error::Parse(format!("{} requires a column name", func.name())));
            }
            (AggregateArg::Rows, String::new())
        } else {
            let column = self.parse_column_ref()?;
            let text = column.to_string();
            (AggregateArg::Column(column), text)
        };
        self.expect_token(&Token::RParen)?;

        let alias = self
            .parse_alias()?
            .unwrap_or_else(|| format!("{}({})", name, arg_text));

        Ok(SelectItem::Aggregate {
            call: AggregateCall { func, arg },
            alias,
        })
    }

    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.next_keyword("AS") {
            return self.parse_identifier("alias").map(Some);
        }
        match self.peek() {
            Some(Token::Word(w)) if w.quote_style.is_some() || !is_reserved(&w.value) => {
                self.parse_identifier("alias").map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_join(&mut self) -> Result<Option<JoinClause>> {
        for kind in ["LEFT", "RIGHT", "FULL", "OUTER", "CROSS"] {
            if self.peek_keyword(kind) {
                return Err(Error::NotSupported(format!(
                    "{} JOIN is not supported; only inner equi-joins are",
                    kind
                )));
            }
        }

        let inner = self.next_keyword("INNER");
        if !self.next_keyword("JOIN") {
            if inner {
                return Err(Error::Parse("Expected JOIN after INNER".into()));
            }
            return Ok(None);
        }

        let table = self.parse_identifier("join table")?;
        if !self.next_keyword("ON") {
            return Err(Error::Parse("Invalid JOIN clause: missing ON condition".into()));
        }

        let left = self.parse_column_ref()?;
        match self.next() {
            Some(Token::Eq) | Some(Token::DoubleEq) => {}
            Some(Token::Neq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq) => {
                return Err(Error::NotSupported(
                    "Only equality JOIN conditions are supported".into(),
                ))
            }
            Some(t) => return Err(Error::Parse(format!("Invalid JOIN condition near {}", t))),
            None => return Err(Error::Parse("Invalid JOIN condition: unexpected end".into())),
        }
        let right = self.parse_column_ref()?;

        if self.peek_keyword("AND") || self.peek_keyword("OR") {
            return Err(Error::NotSupported(
                "Compound JOIN conditions are not supported".into(),
            ));
        }

        Ok(Some(JoinClause { table, left, right }))
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByItem> {
        let column = self.parse_column_ref()?;
        if self.next_keyword("DESC") {
            Ok(OrderByItem::desc(column))
        } else {
            self.next_keyword("ASC");
            Ok(OrderByItem::asc(column))
        }
    }

    fn parse_limit(&mut self) -> Result<u64> {
        match self.next() {
            Some(Token::Number(n, _)) => n
                .parse::<u64>()
                .map_err(|_| Error::Parse(format!("Invalid LIMIT value: {}", n))),
            Some(t) => Err(Error::Parse(format!("Invalid LIMIT value: {}", t))),
            None => Err(Error::Parse("Invalid LIMIT clause".into())),
        }
    }

    /// Parses the single `column op literal` comparison of a WHERE clause
    fn parse_comparison(&mut self) -> Result<Comparison> {
        if self.peek() == Some(&Token::LParen) {
            return Err(Error::NotSupported(
                "Parenthesized predicates are not supported".into(),
            ));
        }
        if self.peek_keyword("NOT") {
            return Err(Error::NotSupported("NOT predicates are not supported".into()));
        }
        if !matches!(self.peek(), Some(Token::Word(_))) {
            return Err(Error::Parse(
                "WHERE clause must be a single column comparison".into(),
            ));
        }

        let column = self.parse_column_ref()?;
        let op = match self.next() {
            Some(Token::Eq) | Some(Token::DoubleEq) => CompareOp::Eq,
            Some(Token::Neq) => CompareOp::NotEq,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::GtEq) => CompareOp::GtEq,
            Some(Token::LtEq) => CompareOp::LtEq,
            Some(Token::Word(w))
                if ["IN", "LIKE", "BETWEEN", "IS", "NOT"]
                    .iter()
                    .any(|k| w.value.eq_ignore_ascii_case(k)) =>
            {
                return Err(Error::NotSupported(format!(
                    "{} predicates are not supported",
                    w.value.to_ascii_uppercase()
                )))
            }
            Some(t) => {
                return Err(Error::Parse(format!(
                    "WHERE clause must be a single binary comparison, found {}",
                    t
                )))
            }
            None => {
                return Err(Error::Parse(
                    "WHERE clause must be a single binary comparison".into(),
                ))
            }
        };
        let value = self.parse_literal()?;

        if self.peek_keyword("AND") || self.peek_keyword("OR") {
            return Err(Error::NotSupported(
                "Compound predicates (AND/OR) are not supported".into(),
            ));
        }

        Ok(Comparison { column, op, value })
    }

    // =========================================================================
    // INSERT / UPDATE / DELETE
    // =========================================================================

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keyword("INSERT")?;
        if !self.next_keyword("INTO") {
            return Err(Error::Parse("No INTO keyword found".into()));
        }
        let table = self.parse_identifier("table name")?;

        let columns = if self.next_token_if(&Token::LParen) {
            let cols = self.parse_comma_separated(|p| p.parse_identifier("column name"))?;
            self.expect_token(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        if self.peek_keyword("SELECT") {
            return Err(Error::NotSupported("INSERT ... SELECT is not supported".into()));
        }
        if !self.next_keyword("VALUES") {
            return Err(Error::Parse("Expected VALUES in INSERT statement".into()));
        }

        let rows = self.parse_comma_separated(|p| {
            p.expect_token(&Token::LParen)?;
            let values = p.parse_comma_separated(Self::parse_literal)?;
            p.expect_token(&Token::RParen)?;
            Ok(values)
        })?;
        self.expect_end()?;

        if let Some(cols) = &columns {
            if let Some(row) = rows.iter().find(|r| r.len() != cols.len()) {
                return Err(Error::Parse(format!(
                    "INSERT has {} columns but {} values",
                    cols.len(),
                    row.len()
                )));
            }
        }

        Ok(InsertStatement {
            table,
            columns,
            rows,
        })
    }

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect_keyword("UPDATE")?;
        let table = self.parse_identifier("table name")?;
        if !self.next_keyword("SET") {
            return Err(Error::Parse("No SET clause found in UPDATE statement".into()));
        }

        let assignments = self.parse_comma_separated(|p| {
            let column = p.parse_column_ref()?.name;
            if !(p.next_token_if(&Token::Eq) || p.next_token_if(&Token::DoubleEq)) {
                return Err(Error::Parse(format!("Expected '=' after {} in SET", column)));
            }
            let value = p.parse_literal()?;
            Ok(Assignment { column, value })
        })?;

        let selection = if self.next_keyword("WHERE") {
            Some(self.parse_comparison()?)
        } else {
            None
        };
        self.expect_end()?;

        Ok(UpdateStatement {
            table,
            assignments,
            selection,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect_keyword("DELETE")?;
        if !self.next_keyword("FROM") {
            return Err(Error::Parse("No FROM keyword found".into()));
        }
        let table = self.parse_identifier("table name")?;
        let selection = if self.next_keyword("WHERE") {
            Some(self.parse_comparison()?)
        } else {
            None
        };
        self.expect_end()?;

        Ok(DeleteStatement { table, selection })
    }

    // =========================================================================
    // CREATE / DROP
    // =========================================================================

    fn parse_create(&mut self) -> Result<CreateTableStatement> {
        self.expect_keyword("CREATE")?;
        if !self.next_keyword("TABLE") {
            return match self.peek() {
                Some(Token::Word(w)) if w.value.eq_ignore_ascii_case("INDEX")
                    || w.value.eq_ignore_ascii_case("VIEW") =>
                {
                    Err(Error::NotSupported(format!(
                        "CREATE {} is not supported",
                        w.value.to_ascii_uppercase()
                    )))
                }
                _ => Err(Error::Parse("Invalid CREATE TABLE statement: no TABLE keyword found".into())),
            };
        }

        let if_not_exists = if self.next_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };

        let table = self.parse_identifier("table name")?;
        if !self.next_token_if(&Token::LParen) {
            return Err(Error::Parse(
                "Invalid CREATE TABLE statement: no column definitions found".into(),
            ));
        }
        if self.peek() == Some(&Token::RParen) {
            return Err(Error::Parse(
                "Invalid CREATE TABLE statement: column definitions are empty".into(),
            ));
        }

        let columns = self.parse_comma_separated(Self::parse_column_spec)?;
        self.expect_token(&Token::RParen)?;
        self.expect_end()?;

        Ok(CreateTableStatement {
            table,
            columns,
            if_not_exists,
        })
    }

    fn parse_column_spec(&mut self) -> Result<ColumnSpec> {
        let name = self.parse_identifier("column name")?;
        let type_token = match self.next() {
            Some(Token::Word(w)) => w.value,
            _ => return Err(Error::Parse(format!("Missing type for column {}", name))),
        };

        // length/precision arguments such as VARCHAR(20) or DECIMAL(10, 2)
        if self.next_token_if(&Token::LParen) {
            loop {
                match self.next() {
                    Some(Token::RParen) => break,
                    Some(Token::Number(..)) | Some(Token::Comma) => {}
                    _ => {
                        return Err(Error::Parse(format!(
                            "Invalid type arguments for column {}",
                            name
                        )))
                    }
                }
            }
        }

        match self.peek() {
            Some(Token::Comma) | Some(Token::RParen) => Ok(ColumnSpec { name, type_token }),
            _ => Err(Error::NotSupported(format!(
                "Column constraints are not supported (column {})",
                name
            ))),
        }
    }

    fn parse_drop(&mut self) -> Result<DropTableStatement> {
        self.expect_keyword("DROP")?;
        if !self.next_keyword("TABLE") {
            return Err(Error::Parse("Invalid DROP TABLE statement: no TABLE keyword found".into()));
        }
        let if_exists = if self.next_keyword("IF") {
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };
        let table = self.parse_identifier("table name")?;
        self.expect_end()?;

        Ok(DropTableStatement { table, if_exists })
    }

    // =========================================================================
    // Shared productions
    // =========================================================================

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.parse_identifier("column name")?;
        if !self.next_token_if(&Token::Period) {
            return Ok(ColumnRef::bare(first));
        }
        if self.peek() == Some(&Token::Mul) {
            return Err(Error::NotSupported("Qualified wildcards are not supported".into()));
        }
        let second = self.parse_identifier("column name")?;
        Ok(ColumnRef::qualified(first, second))
    }

    fn parse_identifier(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Token::Word(w)) if w.quote_style.is_some() => Ok(w.value),
            Some(Token::Word(w)) if !is_reserved(&w.value) => Ok(w.value),
            Some(Token::Word(w)) => Err(Error::Parse(format!(
                "Expected {}, found keyword {}",
                what,
                w.value.to_ascii_uppercase()
            ))),
            Some(t) => Err(Error::Parse(format!("Expected {}, found {}", what, t))),
            None => Err(Error::Parse(format!("Expected {}, found end of statement", what))),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.next() {
            Some(Token::Number(n, _)) => Ok(Literal::Number(n)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Number(n, _)) => Ok(Literal::Number(format!("-{}", n))),
                _ => Err(Error::Parse("Expected a number after '-'".into())),
            },
            Some(Token::Plus) => match self.next() {
                Some(Token::Number(n, _)) => Ok(Literal::Number(n)),
                _ => Err(Error::Parse("Expected a number after '+'".into())),
            },
            Some(Token::SingleQuotedString(s)) | Some(Token::DoubleQuotedString(s)) => {
                Ok(Literal::Text(s))
            }
            Some(Token::Word(w)) if w.quote_style.is_some() => Ok(Literal::Text(w.value)),
            Some(Token::Word(w)) => match w.value.to_ascii_uppercase().as_str() {
                "NULL" => Ok(Literal::Null),
                "TRUE" => Ok(Literal::Bool(true)),
                "FALSE" => Ok(Literal::Bool(false)),
                _ => Err(Error::Parse(format!("Expected a literal value, found {}", w.value))),
            },
            Some(Token::LParen) => Err(Error::NotSupported(
                "Value lists are only meaningful with IN, which is not supported".into(),
            )),
            Some(Token::Placeholder(p)) => Err(Error::Parameter(format!("Unbound parameter {}", p))),
            Some(t) => Err(Error::Parse(format!("Expected a literal value, found {}", t))),
            None => Err(Error::Parse("Expected a literal value, found end of statement".into())),
        }
    }

    fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = vec![f(self)?];
        while self.next_token_if(&Token::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w))
            if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
    }

    fn next_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.next_keyword(keyword) {
            return Ok(());
        }
        match self.peek() {
            Some(t) => Err(Error::Parse(format!("Expected {}, found {}", keyword, t))),
            None => Err(Error::Parse(format!("Expected {}, found end of statement", keyword))),
        }
    }

    fn next_token_if(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, token: &Token) -> Result<()> {
        if self.next_token_if(token) {
            return Ok(());
        }
        match self.peek() {
            Some(t) => Err(Error::Parse(format!("Expected '{}', found {}", token, t))),
            None => Err(Error::Parse(format!("Expected '{}', found end of statement", token))),
        }
    }

    /// Accepts trailing semicolons, then requires end of input
    fn expect_end(&mut self) -> Result<()> {
        while self.next_token_if(&Token::SemiColon) {}
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(Error::Parse(format!("Unexpected token: {}", t))),
        }
    }
}

fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|k| word.eq_ignore_ascii_case(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(sql: &str) -> SelectStatement {
        match parse(sql).unwrap() {
            Statement::Select(s) => s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_select_with_where() {
        let s = select("SELECT name, age FROM users WHERE age > 25");
        assert_eq!(s.from, "users");
        assert_eq!(s.items.len(), 2);
        let cmp = s.selection.unwrap();
        assert_eq!(cmp.column, ColumnRef::bare("age"));
        assert_eq!(cmp.op, CompareOp::Gt);
        assert_eq!(cmp.value, Literal::Number("25".into()));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let s = select("select * from users where name = 'Alice' limit 3;");
        assert_eq!(s.items, vec![SelectItem::Wildcard]);
        assert_eq!(s.limit, Some(3));
        assert_eq!(s.selection.unwrap().value, Literal::Text("Alice".into()));
    }

    #[test]
    fn test_aggregates_and_aliases() {
        let s = select(
            "SELECT department, COUNT(*) AS count, AVG(age) avg_age, max(age) \
             FROM users GROUP BY department",
        );
        assert_eq!(s.group_by, vec![ColumnRef::bare("department")]);
        match &s.items[1] {
            SelectItem::Aggregate { call, alias } => {
                assert_eq!(call.func, AggregateFunction::Count);
                assert_eq!(call.arg, AggregateArg::Rows);
                assert_eq!(alias, "count");
            }
            other => panic!("unexpected item {:?}", other),
        }
        match &s.items[2] {
            SelectItem::Aggregate { alias, .. } => assert_eq!(alias, "avg_age"),
            other => panic!("unexpected item {:?}", other),
        }
        match &s.items[3] {
            SelectItem::Aggregate { alias, .. } => assert_eq!(alias, "max(age)"),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_join_order_by() {
        let s = select(
            "SELECT users.name, orders.product FROM users \
             JOIN orders ON users.id = orders.user_id ORDER BY amount DESC, name",
        );
        let join = s.join.unwrap();
        assert_eq!(join.table, "orders");
        assert_eq!(join.left, ColumnRef::qualified("users", "id"));
        assert_eq!(join.right, ColumnRef::qualified("orders", "user_id"));
        assert_eq!(s.order_by[0].direction, SortDirection::Desc);
        assert_eq!(s.order_by[1].direction, SortDirection::Asc);
    }

    #[test]
    fn test_missing_from_is_parse_error() {
        assert!(matches!(parse("SELECT name"), Err(Error::Parse(_))));
        assert!(matches!(parse("SELECT FROM users"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_join_without_on() {
        let err = parse("SELECT * FROM a JOIN b WHERE x = 1").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("ON"));
    }

    #[test]
    fn test_compound_predicates_rejected() {
        for sql in [
            "SELECT * FROM t WHERE a = 1 AND b = 2",
            "SELECT * FROM t WHERE a = 1 OR b = 2",
            "SELECT * FROM t WHERE NOT a = 1",
            "SELECT * FROM t WHERE a IN (1, 2)",
            "SELECT * FROM t WHERE a LIKE 'x%'",
            "SELECT * FROM t WHERE (a = 1)",
        ] {
            assert!(
                matches!(parse(sql), Err(Error::NotSupported(_))),
                "{} should be rejected",
                sql
            );
        }
    }

    #[test]
    fn test_where_needs_binary_comparison() {
        assert!(matches!(parse("SELECT * FROM t WHERE a"), Err(Error::Parse(_))));
        assert!(matches!(parse("SELECT * FROM t WHERE 1 = a"), Err(Error::Parse(_))));
        assert!(matches!(parse("SELECT * FROM t WHERE a = b"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_aggregate_misuse() {
        assert!(matches!(parse("SELECT SUM(*) FROM t"), Err(Error::Parse(_))));
        assert!(matches!(parse("SELECT AVG() FROM t"), Err(Error::Parse(_))));
        assert!(matches!(parse("SELECT MEDIAN(x) FROM t"), Err(Error::Parse(_))));
        assert!(parse("SELECT COUNT() FROM t").is_ok());
    }

    #[test]
    fn test_insert_forms() {
        match parse("INSERT INTO fruits VALUES (4, 'Kiwi', 120.5), (5, 'Lime', -3)").unwrap() {
            Statement::Insert(ins) => {
                assert_eq!(ins.table, "fruits");
                assert!(ins.columns.is_none());
                assert_eq!(ins.rows.len(), 2);
                assert_eq!(ins.rows[1][2], Literal::Number("-3".into()));
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("INSERT INTO fruits (id, name) VALUES (1, NULL)").unwrap() {
            Statement::Insert(ins) => {
                assert_eq!(ins.columns, Some(vec!["id".to_string(), "name".to_string()]));
                assert_eq!(ins.rows[0][1], Literal::Null);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse("INSERT INTO fruits (id, name) VALUES (1)"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_update_and_delete() {
        match parse("UPDATE fruits SET price = 90, name = 'B' WHERE name = 'Banana'").unwrap() {
            Statement::Update(u) => {
                assert_eq!(u.assignments.len(), 2);
                assert_eq!(u.assignments[0].column, "price");
                assert!(u.selection.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("DELETE FROM fruits").unwrap() {
            Statement::Delete(d) => assert!(d.selection.is_none()),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("UPDATE fruits price = 1"), Err(Error::Parse(_))));
        assert!(matches!(parse("DELETE fruits"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_create_and_drop() {
        match parse("CREATE TABLE IF NOT EXISTS sample (col1 INT, col2 VARCHAR(20))").unwrap() {
            Statement::CreateTable(c) => {
                assert!(c.if_not_exists);
                assert_eq!(c.table, "sample");
                assert_eq!(c.columns[1].type_token, "VARCHAR");
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("DROP TABLE sample").unwrap() {
            Statement::DropTable(d) => {
                assert_eq!(d.table, "sample");
                assert!(!d.if_exists);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("CREATE sample (a INT)"), Err(Error::Parse(_))));
        assert!(matches!(parse("DROP sample"), Err(Error::Parse(_))));
        assert!(matches!(parse("CREATE TABLE t ()"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_unsupported_clauses() {
        assert!(matches!(
            parse("SELECT * FROM a LEFT JOIN b ON a.id = b.id"),
            Err(Error::NotSupported(_))
        ));
        assert!(matches!(
            parse("SELECT * FROM a JOIN b ON a.id > b.id"),
            Err(Error::NotSupported(_))
        ));
        assert!(matches!(
            parse("SELECT d, COUNT(*) FROM a GROUP BY d HAVING COUNT(*) > 1"),
            Err(Error::NotSupported(_))
        ));
        assert!(matches!(parse("ALTER TABLE t ADD c INT"), Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(
            parse("SELECT * FROM users LIMIT 5 extra"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(parse("SELECT * FROM users LIMIT x"), Err(Error::Parse(_))));
    }
}
