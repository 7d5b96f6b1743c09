//! Statement representation and extraction.
//!
//! Each variant carries only what its execution path needs: the target
//! relation, the insert column list, the update assignments or the
//! predicate. Placeholders are numbered in textual order across the whole
//! statement, which is what positional binding relies on.

use serde::{Deserialize, Serialize};

use super::token::{render, Token, TokenExt};
use super::{
    ColumnDef, Conjunct, Literal, Operand, ParseError, ParseResult, Predicate, Projection,
    StatementKind,
};

/// A parsed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// CREATE TABLE statement.
    CreateTable(CreateTableStatement),
    /// INSERT statement.
    Insert(InsertStatement),
    /// UPDATE statement.
    Update(UpdateStatement),
    /// DELETE statement.
    Delete(DeleteStatement),
    /// SELECT query.
    Select(SelectStatement),
    /// BEGIN transaction.
    Begin,
    /// COMMIT transaction.
    Commit,
    /// ROLLBACK transaction.
    Rollback,
    /// PRAGMA, accepted and ignored.
    Pragma(String),
}

impl Statement {
    /// Builds a statement from tokens already classified as `kind`.
    pub fn from_tokens(kind: StatementKind, tokens: Vec<Token>) -> ParseResult<Self> {
        let mut cursor = Cursor::new(tokens);
        let statement = match kind {
            StatementKind::CreateTable => Statement::CreateTable(CreateTableStatement::parse(&mut cursor)?),
            StatementKind::Insert => Statement::Insert(InsertStatement::parse(&mut cursor)?),
            StatementKind::Update => Statement::Update(UpdateStatement::parse(&mut cursor)?),
            StatementKind::Delete => Statement::Delete(DeleteStatement::parse(&mut cursor)?),
            StatementKind::Select => Statement::Select(SelectStatement::parse(&mut cursor)?),
            StatementKind::Begin => {
                cursor.skip_rest();
                Statement::Begin
            }
            StatementKind::Commit => {
                cursor.skip_rest();
                Statement::Commit
            }
            StatementKind::Rollback => {
                cursor.expect_keyword("ROLLBACK")?;
                if cursor.next_is_keyword("TO") {
                    return Err(ParseError::Unsupported("ROLLBACK TO savepoint".to_string()));
                }
                cursor.skip_rest();
                Statement::Rollback
            }
            StatementKind::Pragma => {
                cursor.expect_keyword("PRAGMA")?;
                let text = render(cursor.remaining());
                cursor.skip_rest();
                Statement::Pragma(text)
            }
            StatementKind::Unknown => {
                let head = cursor.peek().map(|t| t.to_string()).unwrap_or_default();
                return Err(ParseError::Unsupported(format!("statement starting with '{}'", head)));
            }
        };
        cursor.finish()?;
        Ok(statement)
    }

    /// Returns the statement kind.
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::Select(_) => StatementKind::Select,
            Statement::Begin => StatementKind::Begin,
            Statement::Commit => StatementKind::Commit,
            Statement::Rollback => StatementKind::Rollback,
            Statement::Pragma(_) => StatementKind::Pragma,
        }
    }

    /// Returns the relation the statement targets, if any.
    pub fn relation(&self) -> Option<&str> {
        match self {
            Statement::CreateTable(s) => Some(&s.name),
            Statement::Insert(s) => Some(&s.table),
            Statement::Update(s) => Some(&s.table),
            Statement::Delete(s) => Some(&s.table),
            Statement::Select(s) => Some(&s.table),
            _ => None,
        }
    }
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    /// Relation name.
    pub name: String,
    /// `IF NOT EXISTS` was given. Creation is idempotent either way.
    pub if_not_exists: bool,
    /// Advisory column declarations.
    pub columns: Vec<ColumnDef>,
}

impl CreateTableStatement {
    fn parse(cursor: &mut Cursor) -> ParseResult<Self> {
        cursor.expect_keyword("CREATE")?;
        if !cursor.consume_keyword("TEMP") {
            cursor.consume_keyword("TEMPORARY");
        }
        cursor.expect_keyword("TABLE")?;

        let if_not_exists = if cursor.consume_keyword("IF") {
            cursor.expect_keyword("NOT")?;
            cursor.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };

        let name = cursor.relation_name()?;

        if cursor.next_is_keyword("AS") {
            return Err(ParseError::Unsupported("CREATE TABLE ... AS SELECT".to_string()));
        }

        let mut columns = Vec::new();
        if cursor.peek() == Some(&Token::LParen) {
            let body = cursor.parenthesized()?;
            for def in split_top_level(&body, |t| *t == Token::Comma) {
                apply_definition(def, &mut columns)?;
            }
        }

        // Table options such as WITHOUT ROWID or STRICT
        cursor.skip_rest();

        Ok(Self {
            name,
            if_not_exists,
            columns,
        })
    }
}

/// Keywords that end the type part of a column definition.
const COLUMN_CONSTRAINT_KEYWORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "CHECK",
    "DEFAULT",
    "REFERENCES",
    "COLLATE",
    "GENERATED",
    "AS",
];

fn apply_definition(def: &[Token], columns: &mut Vec<ColumnDef>) -> ParseResult<()> {
    let Some(first) = def.first() else {
        return Err(ParseError::Syntax("empty column definition".to_string()));
    };

    // Table-level constraints only contribute single-column key flags
    if ["CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK"]
        .iter()
        .any(|kw| first.is_keyword(kw))
    {
        let is_primary = def.iter().any(|t| t.is_keyword("PRIMARY"));
        let is_unique = def.iter().any(|t| t.is_keyword("UNIQUE"));
        if !(is_primary || is_unique) || def.iter().any(|t| t.is_keyword("FOREIGN")) {
            return Ok(());
        }
        if let Some(start) = def.iter().position(|t| *t == Token::LParen) {
            let names: Vec<&str> = def[start + 1..]
                .iter()
                .take_while(|t| **t != Token::RParen)
                .filter_map(Token::as_identifier)
                .collect();
            if let [name] = names.as_slice() {
                if let Some(column) = columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name)) {
                    column.primary_key |= is_primary;
                    column.unique |= is_unique;
                }
            }
        }
        return Ok(());
    }

    let name = first
        .as_identifier()
        .ok_or_else(|| ParseError::InvalidIdentifier(first.to_string()))?
        .to_string();

    let rest = &def[1..];
    let type_end = rest
        .iter()
        .position(|t| COLUMN_CONSTRAINT_KEYWORDS.iter().any(|kw| t.is_keyword(kw)))
        .unwrap_or(rest.len());

    let mut column = ColumnDef::new(name, render(&rest[..type_end]));
    let constraints = &rest[type_end..];
    for (i, token) in constraints.iter().enumerate() {
        if token.is_keyword("PRIMARY") {
            column.primary_key = true;
        } else if token.is_keyword("UNIQUE") {
            column.unique = true;
        } else if token.is_keyword("NOT")
            && constraints.get(i + 1).map_or(false, |t| t.is_keyword("NULL"))
        {
            column.not_null = true;
        }
    }

    columns.push(column);
    Ok(())
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    /// Target relation.
    pub table: String,
    /// Column list; empty if the statement did not name its columns.
    pub columns: Vec<String>,
    /// One operand per column.
    pub values: Vec<Operand>,
}

impl InsertStatement {
    fn parse(cursor: &mut Cursor) -> ParseResult<Self> {
        cursor.expect_keyword("INSERT")?;
        if cursor.next_is_keyword("OR") {
            return Err(ParseError::Unsupported("INSERT OR ... conflict clause".to_string()));
        }
        cursor.expect_keyword("INTO")?;
        let table = cursor.relation_name()?;

        let mut columns = Vec::new();
        if cursor.peek() == Some(&Token::LParen) {
            let list = cursor.parenthesized()?;
            for entry in split_top_level(&list, |t| *t == Token::Comma) {
                columns.push(column_name(entry)?);
            }
        }

        if cursor.next_is_keyword("SELECT") || cursor.next_is_keyword("DEFAULT") {
            return Err(ParseError::Unsupported("INSERT without a VALUES list".to_string()));
        }
        cursor.expect_keyword("VALUES")?;

        let list = cursor.parenthesized()?;
        let mut values = Vec::new();
        for item in split_top_level(&list, |t| *t == Token::Comma) {
            values.push(cursor.operand(item)?);
        }

        if cursor.peek() == Some(&Token::Comma) {
            return Err(ParseError::Unsupported("multi-row VALUES".to_string()));
        }
        if !columns.is_empty() && columns.len() != values.len() {
            return Err(ParseError::Syntax(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        Ok(Self {
            table,
            columns,
            values,
        })
    }
}

/// A single `column = value` assignment of an UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned column.
    pub column: String,
    /// New value.
    pub value: Operand,
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    /// Target relation.
    pub table: String,
    /// Assignments in textual order.
    pub assignments: Vec<Assignment>,
    /// WHERE clause.
    pub predicate: Option<Predicate>,
}

impl UpdateStatement {
    fn parse(cursor: &mut Cursor) -> ParseResult<Self> {
        cursor.expect_keyword("UPDATE")?;
        if cursor.next_is_keyword("OR") {
            return Err(ParseError::Unsupported("UPDATE OR ... conflict clause".to_string()));
        }
        let table = cursor.relation_name()?;
        cursor.expect_keyword("SET")?;

        let clause = cursor.take_until(|t| t.is_keyword("WHERE"));
        let mut assignments = Vec::new();
        for entry in split_top_level(&clause, |t| *t == Token::Comma) {
            // Split on the first assignment operator
            let eq = entry
                .iter()
                .position(|t| t.is_eq())
                .ok_or_else(|| ParseError::Syntax(format!("expected '=' in '{}'", render(entry))))?;
            let column = column_name(&entry[..eq])?;
            let value = cursor.operand(&entry[eq + 1..])?;
            assignments.push(Assignment { column, value });
        }
        if assignments.is_empty() {
            return Err(ParseError::Syntax("UPDATE without assignments".to_string()));
        }

        let predicate = cursor.where_clause()?;
        Ok(Self {
            table,
            assignments,
            predicate,
        })
    }
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    /// Source relation.
    pub table: String,
    /// WHERE clause.
    pub predicate: Option<Predicate>,
}

impl DeleteStatement {
    fn parse(cursor: &mut Cursor) -> ParseResult<Self> {
        cursor.expect_keyword("DELETE")?;
        cursor.expect_keyword("FROM")?;
        let table = cursor.relation_name()?;
        let predicate = cursor.where_clause()?;
        Ok(Self { table, predicate })
    }
}

/// SELECT statement over a single relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// Source relation.
    pub table: String,
    /// Select list.
    pub projection: Projection,
    /// WHERE clause.
    pub predicate: Option<Predicate>,
}

impl SelectStatement {
    fn parse(cursor: &mut Cursor) -> ParseResult<Self> {
        cursor.expect_keyword("SELECT")?;

        let list = cursor.take_until(|t| t.is_keyword("FROM"));
        if !cursor.consume_keyword("FROM") {
            return Err(ParseError::Unsupported("SELECT without FROM".to_string()));
        }
        let placeholders = list.iter().filter(|t| t.is_placeholder()).count();
        cursor.skip_slots(placeholders);
        let projection = projection(&list);

        let table = cursor.relation_name()?;
        if cursor.consume_keyword("AS") {
            cursor.identifier()?;
        } else if matches!(cursor.peek(), Some(Token::Word(_))) && !cursor.next_is_clause_keyword() {
            // Bare alias
            cursor.identifier()?;
        }

        if cursor.peek() == Some(&Token::Comma)
            || ["JOIN", "INNER", "LEFT", "RIGHT", "CROSS", "NATURAL"]
                .iter()
                .any(|kw| cursor.next_is_keyword(kw))
        {
            return Err(ParseError::Unsupported("multi-relation SELECT".to_string()));
        }

        let predicate = cursor.where_clause()?;

        if cursor.next_is_keyword("GROUP") || cursor.next_is_keyword("HAVING") {
            return Err(ParseError::Unsupported("GROUP BY".to_string()));
        }
        // Ordering and limits are accepted but rows keep insertion order
        if cursor.next_is_keyword("ORDER") || cursor.next_is_keyword("LIMIT") {
            cursor.skip_rest();
        }

        Ok(Self {
            table,
            projection,
            predicate,
        })
    }
}

fn projection(list: &[Token]) -> Projection {
    if list == [Token::Mul] {
        return Projection::All;
    }

    let mut columns = Vec::new();
    for item in split_top_level(list, |t| *t == Token::Comma) {
        match column_name(item) {
            Ok(name) => columns.push(name),
            Err(_) => return Projection::Expressions(render(list)),
        }
    }
    if columns.is_empty() {
        Projection::Expressions(render(list))
    } else {
        Projection::Columns(columns)
    }
}

/// Reads `name` or `qualifier.name` covering the whole slice.
fn column_name(tokens: &[Token]) -> ParseResult<String> {
    match tokens {
        [single] => single.as_identifier(),
        [_, Token::Period, name] => name.as_identifier(),
        _ => None,
    }
    .map(str::to_string)
    .ok_or_else(|| ParseError::InvalidIdentifier(render(tokens)))
}

/// Splits a token slice on separators that sit outside parentheses.
fn split_top_level<F>(tokens: &[Token], is_separator: F) -> Vec<&[Token]>
where
    F: Fn(&Token) -> bool,
{
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            t if depth == 0 && is_separator(t) => {
                pieces.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        pieces.push(&tokens[start..]);
    }
    pieces
}

/// Keywords that end a WHERE clause.
const CLAUSE_KEYWORDS: &[&str] = &[
    "WHERE", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET", "RETURNING", "JOIN", "INNER", "LEFT",
    "RIGHT", "CROSS", "NATURAL", "ON",
];

/// Token cursor shared by the statement parsers.
struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    /// Next placeholder slot to hand out.
    next_slot: usize,
}

impl Cursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_slot: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn remaining(&self) -> &[Token] {
        let end = self.tokens[self.pos..]
            .iter()
            .position(|t| *t == Token::SemiColon)
            .map_or(self.tokens.len(), |i| self.pos + i);
        &self.tokens[self.pos..end]
    }

    fn next_is_keyword(&self, keyword: &str) -> bool {
        self.peek().map_or(false, |t| t.is_keyword(keyword))
    }

    fn next_is_clause_keyword(&self) -> bool {
        CLAUSE_KEYWORDS.iter().any(|kw| self.next_is_keyword(kw))
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.next_is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(ParseError::Syntax(format!(
                "expected {}, found {}",
                keyword,
                self.describe_next()
            )))
        }
    }

    fn describe_next(&self) -> String {
        self.peek()
            .map(|t| format!("'{}'", t))
            .unwrap_or_else(|| "end of statement".to_string())
    }

    fn identifier(&mut self) -> ParseResult<String> {
        let name = self
            .peek()
            .and_then(Token::as_identifier)
            .map(str::to_string)
            .ok_or_else(|| ParseError::InvalidIdentifier(self.describe_next()))?;
        self.pos += 1;
        Ok(name)
    }

    /// Reads a relation name; a schema qualifier (`main.users`) is dropped.
    fn relation_name(&mut self) -> ParseResult<String> {
        let mut name = self.identifier()?;
        if self.peek() == Some(&Token::Period) {
            self.pos += 1;
            name = self.identifier()?;
        }
        Ok(name)
    }

    /// Consumes a parenthesized group and returns its inner tokens.
    fn parenthesized(&mut self) -> ParseResult<Vec<Token>> {
        if self.peek() != Some(&Token::LParen) {
            return Err(ParseError::Syntax(format!("expected '(', found {}", self.describe_next())));
        }
        let start = self.pos + 1;
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.tokens[start..self.pos].to_vec();
                        self.pos += 1;
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(ParseError::Syntax("unbalanced parentheses".to_string()))
    }

    /// Consumes tokens up to (not including) the first top-level token
    /// matching `stop`, a semicolon, or the end.
    fn take_until<F>(&mut self, stop: F) -> Vec<Token>
    where
        F: Fn(&Token) -> bool,
    {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::SemiColon if depth == 0 => break,
                t if depth == 0 && stop(t) => break,
                _ => {}
            }
            self.pos += 1;
        }
        self.tokens[start..self.pos].to_vec()
    }

    fn take_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn skip_slots(&mut self, count: usize) {
        self.next_slot += count;
    }

    /// Converts a value expression into an operand.
    fn operand(&mut self, tokens: &[Token]) -> ParseResult<Operand> {
        let literal = match tokens {
            [t] if t.is_placeholder() => return Ok(Operand::Placeholder(self.take_slot())),
            [Token::SingleQuotedString(s)] | [Token::DoubleQuotedString(s)] => {
                Literal::String(s.clone())
            }
            // Double-quoted text in a value position is a string
            [Token::Word(w)] if w.quote_style == Some('"') => Literal::String(w.value.clone()),
            [Token::Number(n, _)] => Literal::parse_number(n, false)?,
            [Token::Minus, Token::Number(n, _)] => Literal::parse_number(n, true)?,
            [t] if t.is_keyword("NULL") => Literal::Null,
            [t] if t.is_keyword("TRUE") => Literal::Integer(1),
            [t] if t.is_keyword("FALSE") => Literal::Integer(0),
            _ => {
                return Err(ParseError::Unsupported(format!(
                    "value expression '{}'",
                    render(tokens)
                )))
            }
        };
        Ok(Operand::Literal(literal))
    }

    /// Parses an optional WHERE clause.
    fn where_clause(&mut self) -> ParseResult<Option<Predicate>> {
        if !self.consume_keyword("WHERE") {
            return Ok(None);
        }

        let clause = self.take_until(|t| CLAUSE_KEYWORDS[1..].iter().any(|kw| t.is_keyword(kw)));
        if clause.is_empty() {
            return Err(ParseError::Syntax("empty WHERE clause".to_string()));
        }

        let has_top_level_or = split_top_level(&clause, |t| t.is_keyword("OR")).len() > 1;
        let pieces = if has_top_level_or {
            vec![clause.as_slice()]
        } else {
            split_conjuncts(&clause)
        };

        let mut conjuncts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            conjuncts.push(self.conjunct(piece));
        }
        Ok(Some(Predicate::new(conjuncts)))
    }

    fn conjunct(&mut self, tokens: &[Token]) -> Conjunct {
        let tokens = strip_parens(tokens);
        let column = match tokens {
            [col, eq, p] if eq.is_eq() && p.is_placeholder() => col.as_identifier(),
            [_, Token::Period, col, eq, p] if eq.is_eq() && p.is_placeholder() => {
                col.as_identifier()
            }
            _ => None,
        };

        match column {
            Some(column) => Conjunct::Equals {
                column: column.to_string(),
                slot: self.take_slot(),
            },
            None => {
                let placeholders = tokens.iter().filter(|t| t.is_placeholder()).count();
                self.skip_slots(placeholders);
                Conjunct::Other(render(tokens))
            }
        }
    }

    fn skip_rest(&mut self) {
        while let Some(token) = self.peek() {
            if *token == Token::SemiColon {
                break;
            }
            self.pos += 1;
        }
    }

    /// Checks that only semicolons remain.
    fn finish(&mut self) -> ParseResult<()> {
        while self.peek() == Some(&Token::SemiColon) {
            self.pos += 1;
        }
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(ParseError::Syntax(format!(
                "unexpected {} (one statement at a time)",
                self.describe_next()
            ))),
        }
    }
}

/// Splits on top-level `AND`, keeping `BETWEEN x AND y` together.
fn split_conjuncts(tokens: &[Token]) -> Vec<&[Token]> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_between = false;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            t if depth == 0 && t.is_keyword("BETWEEN") => in_between = true,
            t if depth == 0 && t.is_keyword("AND") => {
                if in_between {
                    in_between = false;
                } else {
                    pieces.push(&tokens[start..i]);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    pieces.push(&tokens[start..]);
    pieces
}

/// Removes parentheses wrapping the whole slice.
fn strip_parens(mut tokens: &[Token]) -> &[Token] {
    while let [Token::LParen, inner @ .., Token::RParen] = tokens {
        // Only strip when the outer pair matches
        let mut depth = 0i32;
        let balanced = inner.iter().all(|t| {
            match t {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
            depth >= 0
        });
        if !balanced || depth != 0 {
            break;
        }
        tokens = inner;
    }
    tokens
}
