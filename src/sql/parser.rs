//! SQL parser for CREATE TABLE and ALTER TABLE statements.
//!
//! The token stream is cut into statements, each table body into top-level
//! clauses, and every clause is parsed on its own. A malformed clause is
//! reported as a [`ClauseError`] and skipped; it never fails the table or the
//! whole input.

use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::{Lexer, Token};
use super::types::normalize_type;
use crate::canvas;
use crate::measure::TableMetrics;
use crate::model::{Column, DEFAULT_POSITION, ForeignKeyRef, Table};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("No CREATE TABLE statements found")]
    NoTableStatements,
}

/// A clause or statement that was skipped.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} in table `{table}`{}", clause_suffix(.clause, .text))]
pub struct ClauseError {
    pub table: String,
    /// Index of the clause within the table body, if the problem is clause-local
    pub clause: Option<usize>,
    pub text: String,
    pub kind: ClauseErrorKind,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClauseErrorKind {
    #[error("expected a column name")]
    MissingColumnName,
    #[error("column `{0}` has no type")]
    MissingType(String),
    #[error("expected a parenthesized column list")]
    MissingColumnList,
    #[error("FOREIGN KEY without REFERENCES")]
    MissingReferences,
    #[error("REFERENCES without a table name")]
    MissingReferencedTable,
    #[error("{columns} referencing column(s) but {referenced} referenced column(s)")]
    ColumnCountMismatch { columns: usize, referenced: usize },
    #[error("column `{0}` is defined more than once")]
    DuplicateColumn(String),
    #[error("primary key names unknown column `{0}`")]
    UnknownKeyColumn(String),
    #[error("table is defined more than once")]
    DuplicateTable,
    #[error("CREATE TABLE without a table name")]
    MissingTableName,
    #[error("CREATE TABLE without a parenthesized body")]
    MissingBody,
    #[error("table body is not closed")]
    UnterminatedBody,
    #[error("table has no column definitions")]
    NoColumns,
    #[error("ALTER TABLE names a table that was not defined")]
    UnknownTable,
}

fn clause_suffix(clause: &Option<usize>, text: &str) -> String {
    match clause {
        Some(i) if text.is_empty() => format!(", clause {}", i + 1),
        Some(i) => format!(", clause {}: `{}`", i + 1, text),
        None if text.is_empty() => String::new(),
        None => format!(": `{}`", text),
    }
}

/// Tables recovered from DDL text plus everything that was skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    pub tables: Vec<Table>,
    pub diagnostics: Vec<ClauseError>,
}

/// Parse DDL text into tables positioned with default metrics.
pub fn parse_sql(input: &str, dialect: Dialect) -> Result<ParsedSchema, ParseError> {
    parse_sql_with_metrics(input, dialect, &TableMetrics::default())
}

pub fn parse_sql_with_metrics(
    input: &str,
    dialect: Dialect,
    metrics: &TableMetrics,
) -> Result<ParsedSchema, ParseError> {
    let tokens = Lexer::new(input)
        .backslash_escapes(dialect == Dialect::MySQL)
        .tokenize();
    let mut parser = Parser::new(tokens, dialect);
    parser.parse();

    let Parser {
        defs,
        mut diagnostics,
        statements,
        ..
    } = parser;

    if statements == 0 {
        return Err(ParseError::NoTableStatements);
    }

    // may be empty when every statement was discarded; the diagnostics say why
    let mut tables = resolve_tables(defs, &mut diagnostics);
    canvas::arrange(&mut tables, metrics);

    for d in &diagnostics {
        log::warn!("skipped: {}", d);
    }
    log::debug!(
        "parsed {} table(s) from {} statement(s) as {}",
        tables.len(),
        statements,
        dialect
    );

    Ok(ParsedSchema {
        tables,
        diagnostics,
    })
}

/// Table as collected from the text, before foreign keys are resolved.
struct TableDef {
    name: String,
    columns: Vec<Column>,
    foreign_keys: Vec<FkDef>,
}

struct FkDef {
    columns: Vec<String>,
    target: String,
    /// Empty means the target's primary key
    target_columns: Vec<String>,
    clause: Option<usize>,
}

enum Clause {
    Column(Column, Option<FkDef>),
    PrimaryKey(Vec<String>),
    ForeignKey(FkDef),
    Skipped,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
    defs: Vec<TableDef>,
    diagnostics: Vec<ClauseError>,
    statements: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, dialect: Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
            defs: Vec::new(),
            diagnostics: Vec::new(),
            statements: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse(&mut self) {
        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => {
                    self.advance();
                    // CREATE [OR REPLACE] [GLOBAL|LOCAL] [TEMP|TEMPORARY|UNLOGGED] TABLE
                    while let Token::Ident(w) = self.current() {
                        let w = w.to_uppercase();
                        if matches!(
                            w.as_str(),
                            "OR" | "REPLACE" | "GLOBAL" | "LOCAL" | "TEMP" | "TEMPORARY" | "UNLOGGED"
                        ) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    if self.eat(&Token::Table) {
                        self.statements += 1;
                        self.parse_create_table();
                    } else {
                        // CREATE INDEX, VIEW, ...
                        self.skip_statement();
                    }
                }
                Token::Alter => self.parse_alter_table(),
                _ => self.advance(),
            }
        }
    }

    /// `public.users` → `users`
    fn qualified_name(&mut self) -> Option<String> {
        let mut name = self.current().ident()?.to_string();
        self.advance();
        while self.current() == &Token::Dot {
            self.advance();
            match self.current().ident() {
                Some(part) => {
                    name = part.to_string();
                    self.advance();
                }
                None => break,
            }
        }
        Some(name)
    }

    fn parse_create_table(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }

        let Some(name) = self.qualified_name() else {
            let text = self.current().to_string();
            self.report(String::new(), None, text, ClauseErrorKind::MissingTableName);
            self.skip_statement();
            return;
        };

        if self.current() != &Token::LParen {
            self.report(name, None, String::new(), ClauseErrorKind::MissingBody);
            self.skip_statement();
            return;
        }

        let (body, closed) = self.balanced_group();
        // table options: ENGINE=..., LOCALITY ..., WITHOUT ROWID
        self.skip_statement();
        if !closed {
            self.report(name.clone(), None, String::new(), ClauseErrorKind::UnterminatedBody);
        }

        if self.defs.iter().any(|d| d.name == name) {
            self.report(name, None, String::new(), ClauseErrorKind::DuplicateTable);
            return;
        }

        let mut def = TableDef {
            name,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        };
        let mut primary_keys: Vec<(usize, Vec<String>)> = Vec::new();

        for (i, clause) in split_clauses(&body).into_iter().enumerate() {
            match parse_clause(clause, self.dialect) {
                Ok(Clause::Column(column, fk)) => {
                    if def.column_index(&column.name).is_some() {
                        let kind = ClauseErrorKind::DuplicateColumn(column.name.clone());
                        self.report(def.name.clone(), Some(i), clause_text(clause), kind);
                        continue;
                    }
                    if let Some(mut fk) = fk {
                        fk.clause = Some(i);
                        def.foreign_keys.push(fk);
                    }
                    def.columns.push(column);
                }
                Ok(Clause::PrimaryKey(columns)) => primary_keys.push((i, columns)),
                Ok(Clause::ForeignKey(mut fk)) => {
                    fk.clause = Some(i);
                    def.foreign_keys.push(fk);
                }
                Ok(Clause::Skipped) => {}
                Err(kind) => self.report(def.name.clone(), Some(i), clause_text(clause), kind),
            }
        }

        // table-level keys may precede the columns they name
        for (i, columns) in primary_keys {
            self.apply_primary_key(&mut def, Some(i), columns);
        }

        if def.columns.is_empty() {
            self.report(def.name, None, String::new(), ClauseErrorKind::NoColumns);
            return;
        }
        self.defs.push(def);
    }

    /// `ALTER TABLE [IF EXISTS] [ONLY] name ADD ... [, ADD ...]`
    fn parse_alter_table(&mut self) {
        self.advance(); // ALTER

        if !self.eat(&Token::Table) {
            self.skip_statement();
            return;
        }
        if self.eat(&Token::If) {
            self.eat(&Token::Exists);
        }
        self.eat(&Token::Only);

        let Some(name) = self.qualified_name() else {
            self.skip_statement();
            return;
        };

        let mut actions = Vec::new();
        while !matches!(
            self.current(),
            Token::Semicolon | Token::Eof | Token::Create | Token::Alter
        ) {
            if self.current() == &Token::LParen {
                let (group, _) = self.balanced_group();
                actions.push(Token::LParen);
                actions.extend(group);
                actions.push(Token::RParen);
            } else {
                actions.push(self.current().clone());
                self.advance();
            }
        }
        self.eat(&Token::Semicolon);

        for action in split_clauses(&actions) {
            let [Token::Add, rest @ ..] = action else {
                // ALTER COLUMN, OWNER TO, ...
                continue;
            };
            let rest = match rest {
                [first, tail @ ..] if first.is_word("COLUMN") => tail,
                _ => rest,
            };

            let Some(index) = self.defs.iter().position(|d| d.name == name) else {
                self.report(name.clone(), None, clause_text(action), ClauseErrorKind::UnknownTable);
                continue;
            };

            match parse_clause(rest, self.dialect) {
                Ok(Clause::Column(column, fk)) => {
                    let mut def = std::mem::replace(&mut self.defs[index], TableDef::placeholder());
                    if def.column_index(&column.name).is_some() {
                        let kind = ClauseErrorKind::DuplicateColumn(column.name.clone());
                        self.report(name.clone(), None, clause_text(action), kind);
                    } else {
                        def.foreign_keys.extend(fk);
                        def.columns.push(column);
                    }
                    self.defs[index] = def;
                }
                Ok(Clause::PrimaryKey(columns)) => {
                    let mut def = std::mem::replace(&mut self.defs[index], TableDef::placeholder());
                    self.apply_primary_key(&mut def, None, columns);
                    self.defs[index] = def;
                }
                Ok(Clause::ForeignKey(fk)) => self.defs[index].foreign_keys.push(fk),
                Ok(Clause::Skipped) => {}
                Err(kind) => self.report(name.clone(), None, clause_text(action), kind),
            }
        }
    }

    fn apply_primary_key(&mut self, def: &mut TableDef, clause: Option<usize>, columns: Vec<String>) {
        for column in columns {
            match def.column_index(&column) {
                Some(i) => def.columns[i].primary_key = true,
                None => {
                    let kind = ClauseErrorKind::UnknownKeyColumn(column);
                    self.report(def.name.clone(), clause, String::new(), kind);
                }
            }
        }
    }

    /// Tokens between the current `(` and its matching `)`, exclusive.
    /// The flag is false when input ended before the group closed.
    fn balanced_group(&mut self) -> (Vec<Token>, bool) {
        self.advance(); // (
        let mut depth = 1usize;
        let mut group = Vec::new();
        loop {
            match self.current() {
                Token::Eof => return (group, false),
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return (group, true);
                    }
                }
                _ => {}
            }
            group.push(self.current().clone());
            self.advance();
        }
    }

    /// Skip to the end of the statement. A `CREATE` or `ALTER` starts a new
    /// statement even when the `;` is missing.
    fn skip_statement(&mut self) {
        while !matches!(
            self.current(),
            Token::Semicolon | Token::Eof | Token::Create | Token::Alter
        ) {
            self.advance();
        }
        self.eat(&Token::Semicolon);
    }

    fn report(&mut self, table: String, clause: Option<usize>, text: String, kind: ClauseErrorKind) {
        self.diagnostics.push(ClauseError {
            table,
            clause,
            text,
            kind,
        });
    }
}

impl TableDef {
    fn placeholder() -> Self {
        Self {
            name: String::new(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Split at commas that are not nested inside parentheses. Empty clauses are
/// dropped.
fn split_clauses(tokens: &[Token]) -> Vec<&[Token]> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                clauses.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(&tokens[start..]);
    clauses.retain(|c| !c.is_empty());
    clauses
}

fn clause_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words that introduce a table-level clause this parser does not model.
pub(super) const SKIPPED_CLAUSE_WORDS: &[&str] = &["FULLTEXT", "SPATIAL", "EXCLUDE", "LIKE", "PERIOD"];

/// Words that continue a multi-word type name.
const TYPE_CONTINUATIONS: &[&str] = &["PRECISION", "VARYING", "WITH", "WITHOUT", "TIME", "ZONE"];

/// Cursor over the tokens of one clause.
struct ClauseCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ClauseCursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek(&self) -> &'a Token {
        self.nth(1)
    }

    fn nth(&self, n: usize) -> &'a Token {
        self.tokens.get(self.pos + n).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn ident(&mut self) -> Option<String> {
        let name = self.current().ident()?.to_string();
        self.advance();
        Some(name)
    }

    fn qualified_name(&mut self) -> Option<String> {
        let mut name = self.ident()?;
        while self.eat(&Token::Dot) {
            match self.ident() {
                Some(part) => name = part,
                None => break,
            }
        }
        Some(name)
    }

    /// `(a, b DESC, c(10))` → `[a, b, c]`
    fn column_list(&mut self) -> Option<Vec<String>> {
        if !self.eat(&Token::LParen) {
            return None;
        }
        let mut columns = Vec::new();
        let mut expect_name = true;
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Comma => {
                    expect_name = true;
                    self.advance();
                }
                Token::LParen => self.skip_parenthesized(),
                token => {
                    if expect_name {
                        if let Some(name) = column_name(token) {
                            columns.push(name);
                        }
                        expect_name = false;
                    }
                    self.advance();
                }
            }
        }
        (!columns.is_empty()).then_some(columns)
    }

    fn skip_parenthesized(&mut self) {
        if !self.eat(&Token::LParen) {
            self.advance();
            return;
        }
        let mut depth = 1usize;
        while depth > 0 && !self.at_end() {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Raw text of a parenthesized group, e.g. `(10,2)`.
    fn group_text(&mut self) -> String {
        let start = self.pos;
        self.skip_parenthesized();
        self.tokens[start..self.pos]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }
}

fn parse_clause(tokens: &[Token], dialect: Dialect) -> Result<Clause, ClauseErrorKind> {
    let mut cursor = ClauseCursor::new(tokens);

    match cursor.current() {
        Token::Constraint => {
            cursor.advance();
            // constraint name, unless the clause jumps straight to its kind
            if cursor.current().ident().is_some() {
                cursor.advance();
            }
            match cursor.current() {
                Token::Primary => parse_primary_key(&mut cursor),
                Token::Foreign => parse_foreign_key(&mut cursor),
                _ => Ok(Clause::Skipped),
            }
        }
        Token::Primary => parse_primary_key(&mut cursor),
        Token::Foreign => parse_foreign_key(&mut cursor),
        Token::Unique | Token::Check => Ok(Clause::Skipped),
        Token::Index | Token::Key if is_index_clause(&cursor) => Ok(Clause::Skipped),
        t if SKIPPED_CLAUSE_WORDS.iter().any(|w| t.is_word(w)) => Ok(Clause::Skipped),
        _ => parse_column(&mut cursor, dialect),
    }
}

/// Identifier text, or a bare `key` / `index` used as a column name. The
/// keyword token keeps no source case, so those come back lowercase.
fn column_name(token: &Token) -> Option<String> {
    match token {
        Token::Key | Token::Index => Some(token.to_string().to_lowercase()),
        _ => token.ident().map(str::to_string),
    }
}

/// `KEY (a)`, `INDEX name (a)` or `KEY name USING BTREE (a)`, as opposed
/// to a column that happens to be called `key` or `index`.
fn is_index_clause(cursor: &ClauseCursor) -> bool {
    match cursor.peek() {
        Token::LParen | Token::Eof => true,
        next if next.ident().is_some() => match cursor.nth(2) {
            // a type argument list holds numbers or strings, an index holds columns
            Token::LParen => {
                !matches!(cursor.nth(3), Token::Num(_) | Token::Str(_) | Token::RParen)
                    && !cursor.nth(3).is_word("MAX")
            }
            t => t.is_word("USING"),
        },
        _ => false,
    }
}

/// `PRIMARY KEY (a, b)`
fn parse_primary_key(cursor: &mut ClauseCursor) -> Result<Clause, ClauseErrorKind> {
    cursor.advance(); // PRIMARY
    cursor.eat(&Token::Key);
    let columns = cursor.column_list().ok_or(ClauseErrorKind::MissingColumnList)?;
    Ok(Clause::PrimaryKey(columns))
}

/// `FOREIGN KEY [name] (a) REFERENCES t(b) [ON DELETE ...]`
fn parse_foreign_key(cursor: &mut ClauseCursor) -> Result<Clause, ClauseErrorKind> {
    cursor.advance(); // FOREIGN
    cursor.eat(&Token::Key);
    // MySQL allows an index name here
    if cursor.current().ident().is_some() && cursor.peek() == &Token::LParen {
        cursor.advance();
    }
    let columns = cursor.column_list().ok_or(ClauseErrorKind::MissingColumnList)?;
    if !cursor.eat(&Token::References) {
        return Err(ClauseErrorKind::MissingReferences);
    }
    let (target, target_columns) = parse_reference(cursor)?;
    if !target_columns.is_empty() && target_columns.len() != columns.len() {
        return Err(ClauseErrorKind::ColumnCountMismatch {
            columns: columns.len(),
            referenced: target_columns.len(),
        });
    }
    // ON DELETE / ON UPDATE / MATCH ... carry nothing the model keeps
    Ok(Clause::ForeignKey(FkDef {
        columns,
        target,
        target_columns,
        clause: None,
    }))
}

/// After `REFERENCES`: `[schema.]table [(col, ...)]`
fn parse_reference(cursor: &mut ClauseCursor) -> Result<(String, Vec<String>), ClauseErrorKind> {
    let target = cursor
        .qualified_name()
        .ok_or(ClauseErrorKind::MissingReferencedTable)?;
    let columns = if cursor.current() == &Token::LParen {
        cursor.column_list().ok_or(ClauseErrorKind::MissingColumnList)?
    } else {
        Vec::new()
    };
    Ok((target, columns))
}

/// `name TYPE [(args)] [[]] [modifiers...]`
fn parse_column(cursor: &mut ClauseCursor, dialect: Dialect) -> Result<Clause, ClauseErrorKind> {
    let name = column_name(cursor.current()).ok_or(ClauseErrorKind::MissingColumnName)?;
    cursor.advance();

    let mut declared = match cursor.current().ident() {
        Some(t) => t.to_string(),
        None => return Err(ClauseErrorKind::MissingType(name)),
    };
    cursor.advance();
    loop {
        match cursor.current() {
            Token::LParen => declared.push_str(&cursor.group_text()),
            Token::Brackets => {
                declared.push_str("[]");
                cursor.advance();
            }
            t if TYPE_CONTINUATIONS.iter().any(|w| t.is_word(w)) => {
                declared.push(' ');
                declared.push_str(&t.to_string());
                cursor.advance();
            }
            _ => break,
        }
    }

    let mut column = Column::new(name, normalize_type(&declared, dialect));
    let mut fk = None;

    while !cursor.at_end() {
        match cursor.current() {
            Token::Primary => {
                cursor.advance();
                cursor.eat(&Token::Key);
                column.primary_key = true;
            }
            Token::Not => {
                cursor.advance();
                if cursor.eat(&Token::Null) {
                    column.not_null = true;
                }
            }
            Token::References => {
                cursor.advance();
                let (target, target_columns) = parse_reference(cursor)?;
                if target_columns.len() > 1 {
                    return Err(ClauseErrorKind::ColumnCountMismatch {
                        columns: 1,
                        referenced: target_columns.len(),
                    });
                }
                fk = Some(FkDef {
                    columns: vec![column.name.clone()],
                    target,
                    target_columns,
                    clause: None,
                });
            }
            Token::Default => {
                cursor.advance();
                // literal, identifier, (expression) or function call
                if cursor.current() == &Token::LParen {
                    cursor.skip_parenthesized();
                } else {
                    cursor.advance();
                    if cursor.current() == &Token::LParen {
                        cursor.skip_parenthesized();
                    }
                }
            }
            Token::Check | Token::LParen => {
                if cursor.current() == &Token::Check {
                    cursor.advance();
                }
                cursor.skip_parenthesized();
            }
            Token::Constraint => {
                cursor.advance();
                if cursor.current().ident().is_some() {
                    cursor.advance();
                }
            }
            _ => cursor.advance(),
        }
    }

    Ok(Clause::Column(column, fk))
}

/// Attach foreign keys whose target resolves and build the final tables.
fn resolve_tables(defs: Vec<TableDef>, diagnostics: &mut Vec<ClauseError>) -> Vec<Table> {
    let mut resolved: Vec<Vec<Option<ForeignKeyRef>>> = defs
        .iter()
        .map(|d| vec![None; d.columns.len()])
        .collect();

    for (table_index, def) in defs.iter().enumerate() {
        for fk in &def.foreign_keys {
            let Some(target) = defs.iter().find(|d| d.name == fk.target) else {
                log::debug!("dropping foreign key {}.{:?} -> missing table {}", def.name, fk.columns, fk.target);
                continue;
            };

            let target_columns: Vec<String> = if fk.target_columns.is_empty() {
                target
                    .columns
                    .iter()
                    .filter(|c| c.primary_key)
                    .map(|c| c.name.clone())
                    .collect()
            } else {
                fk.target_columns.clone()
            };
            if target_columns.len() != fk.columns.len() {
                diagnostics.push(ClauseError {
                    table: def.name.clone(),
                    clause: fk.clause,
                    text: String::new(),
                    kind: ClauseErrorKind::ColumnCountMismatch {
                        columns: fk.columns.len(),
                        referenced: target_columns.len(),
                    },
                });
                continue;
            }

            for (source, referenced) in fk.columns.iter().zip(&target_columns) {
                let Some(source_index) = def.column_index(source) else {
                    log::debug!("dropping foreign key on unknown column {}.{}", def.name, source);
                    continue;
                };
                if target.column_index(referenced).is_none() {
                    log::debug!("dropping foreign key -> missing column {}.{}", target.name, referenced);
                    continue;
                }
                resolved[table_index][source_index] = Some(ForeignKeyRef::new(&target.name, referenced));
            }
        }
    }

    defs.into_iter()
        .zip(resolved)
        .map(|(def, fks)| {
            let columns = def
                .columns
                .into_iter()
                .zip(fks)
                .map(|(column, foreign_key)| Column {
                    foreign_key,
                    ..column
                })
                .collect();
            Table::new(def.name, columns, DEFAULT_POSITION)
        })
        .collect()
}
