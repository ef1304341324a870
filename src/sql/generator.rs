//! DDL generation from the schema model.

use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::keyword;
use super::parser::SKIPPED_CLAUSE_WORDS;
use crate::model::{Column, Table};

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("Table name cannot be empty")]
    EmptyTableName,
    #[error("Column name cannot be empty in table `{0}`")]
    EmptyColumnName(String),
    #[error("Column `{table}.{column}` has no type")]
    EmptyColumnType { table: String, column: String },
    #[error("Formatting failed: {0}")]
    Format(#[from] fmt::Error),
}

/// Generate `CREATE TABLE` statements for `tables`.
///
/// Tables without foreign keys are written first, each group keeping its
/// original order. This is a single partition, not a dependency sort: a table
/// referencing another table that itself has foreign keys may still come
/// before its target.
pub fn generate(tables: &[Table], dialect: Dialect, now: DateTime<Utc>) -> Result<String, GenerationError> {
    for table in tables {
        validate(table)?;
    }

    let (roots, dependents): (Vec<&Table>, Vec<&Table>) =
        tables.iter().partition(|t| !t.has_foreign_keys());

    let mut out = String::new();
    writeln!(out, "-- Generated by SchemaForge")?;
    writeln!(out, "-- Dialect: {}", dialect)?;
    writeln!(out, "-- Generated at: {}", now.to_rfc3339_opts(SecondsFormat::Millis, true))?;
    writeln!(out)?;

    for table in roots.into_iter().chain(dependents) {
        write_table(&mut out, table, dialect)?;
    }

    log::debug!("generated {} table(s) as {}", tables.len(), dialect);
    Ok(out)
}

fn validate(table: &Table) -> Result<(), GenerationError> {
    if table.name.trim().is_empty() {
        return Err(GenerationError::EmptyTableName);
    }
    for column in &table.columns {
        if column.name.trim().is_empty() {
            return Err(GenerationError::EmptyColumnName(table.name.clone()));
        }
        if column.typ.trim().is_empty() {
            return Err(GenerationError::EmptyColumnType {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

fn write_table(out: &mut String, table: &Table, dialect: Dialect) -> fmt::Result {
    writeln!(out, "CREATE TABLE {} (", quote(&table.name, dialect))?;

    let mut clauses: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_definition(c, dialect))
        .collect();
    clauses.extend(table.columns.iter().filter_map(|c| {
        let fk = c.foreign_key.as_ref()?;
        Some(format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            quote(&c.name, dialect),
            quote(&fk.table, dialect),
            quote(&fk.column, dialect)
        ))
    }));

    for (i, clause) in clauses.iter().enumerate() {
        let sep = if i + 1 < clauses.len() { "," } else { "" };
        writeln!(out, "  {}{}", clause, sep)?;
    }
    writeln!(out, ");")?;
    writeln!(out)
}

fn column_definition(column: &Column, dialect: Dialect) -> String {
    let mut def = format!("{} {}", quote(&column.name, dialect), column.typ);
    if column.primary_key {
        def.push_str(" PRIMARY KEY");
    }
    if column.not_null {
        def.push_str(" NOT NULL");
    }
    def
}

/// Quote identifiers the parser would not read back as a plain name.
fn quote(name: &str, dialect: Dialect) -> String {
    if is_plain(name) {
        return name.to_string();
    }
    let q = match dialect {
        Dialect::MySQL => '`',
        _ => '"',
    };
    let escaped = name.replace(q, &format!("{q}{q}"));
    format!("{q}{escaped}{q}")
}

fn is_plain(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && keyword(name).is_none()
        && !SKIPPED_CLAUSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_POSITION, ForeignKeyRef};
    use crate::sql::parse_sql;
    use chrono::TimeZone;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn users_and_pets() -> Vec<Table> {
        vec![
            Table::new(
                "pets",
                vec![
                    Column::new("id", "INT").primary_key(),
                    Column::new("owner_id", "INT").references("users", "id"),
                ],
                DEFAULT_POSITION,
            ),
            Table::new(
                "users",
                vec![
                    Column::new("id", "INT").primary_key().not_null(),
                    Column::new("name", "VARCHAR"),
                ],
                DEFAULT_POSITION,
            ),
        ]
    }

    #[test]
    fn test_generate_output() {
        let sql = generate(&users_and_pets(), Dialect::PostgreSQL, now()).unwrap();
        let expected = indoc! {"
            -- Generated by SchemaForge
            -- Dialect: PostgreSQL
            -- Generated at: 2024-05-01T12:30:00.000Z

            CREATE TABLE users (
              id INT PRIMARY KEY NOT NULL,
              name VARCHAR
            );

            CREATE TABLE pets (
              id INT PRIMARY KEY,
              owner_id INT,
              FOREIGN KEY (owner_id) REFERENCES users(id)
            );

        "};
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_partition_is_stable() {
        let tables = vec![
            Table::new("c", vec![Column::new("x", "INT").references("a", "id")], DEFAULT_POSITION),
            Table::new("a", vec![Column::new("id", "INT")], DEFAULT_POSITION),
            Table::new("d", vec![Column::new("x", "INT").references("a", "id")], DEFAULT_POSITION),
            Table::new("b", vec![Column::new("id", "INT")], DEFAULT_POSITION),
        ];
        let sql = generate(&tables, Dialect::Standard, now()).unwrap();
        let order: Vec<&str> = sql
            .lines()
            .filter_map(|l| l.strip_prefix("CREATE TABLE "))
            .map(|l| l.trim_end_matches(" ("))
            .collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_model() {
        let sql = generate(&[], Dialect::Standard, now()).unwrap();
        assert!(sql.starts_with("-- Generated by SchemaForge"));
        assert!(!sql.contains("CREATE TABLE"));
    }

    #[test]
    fn test_quoting() {
        let tables = vec![Table::new(
            "order items",
            vec![Column::new("key", "TEXT"), Column::new("say\"hi", "INT")],
            DEFAULT_POSITION,
        )];
        let sql = generate(&tables, Dialect::Standard, now()).unwrap();
        assert!(sql.contains("CREATE TABLE \"order items\" ("));
        assert!(sql.contains("  \"key\" TEXT,"));
        assert!(sql.contains("  \"say\"\"hi\" INT"));

        let sql = generate(&tables, Dialect::MySQL, now()).unwrap();
        assert!(sql.contains("CREATE TABLE `order items` ("));
    }

    #[test]
    fn test_rejects_empty_names_and_types() {
        let tables = vec![Table::new("", vec![], DEFAULT_POSITION)];
        assert_eq!(
            generate(&tables, Dialect::Standard, now()),
            Err(GenerationError::EmptyTableName)
        );

        let tables = vec![Table::new("t", vec![Column::new("c", " ")], DEFAULT_POSITION)];
        assert_eq!(
            generate(&tables, Dialect::Standard, now()),
            Err(GenerationError::EmptyColumnType {
                table: "t".to_string(),
                column: "c".to_string(),
            })
        );
    }

    fn assert_round_trip(tables: &[Table], dialect: Dialect) {
        let sql = generate(tables, dialect, now()).unwrap();
        let parsed = parse_sql(&sql, dialect).unwrap();
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(parsed.tables.len(), tables.len());
        for table in tables {
            let back = parsed
                .tables
                .iter()
                .find(|t| t.name == table.name)
                .unwrap_or_else(|| panic!("missing {}", table.name));
            assert_eq!(back.columns, table.columns, "{}", table.name);
        }
    }

    #[test]
    fn test_round_trip() {
        for dialect in Dialect::ALL {
            assert_round_trip(&users_and_pets(), dialect);
        }
    }

    #[test]
    fn test_round_trip_awkward_names_and_keys() {
        let tables = vec![
            Table::new(
                "order",
                vec![
                    Column::new("primary", "INT").primary_key().not_null(),
                    Column::new("line no", "INT").primary_key(),
                    Column::new("tags", "TEXT[]"),
                    Column::new("like", "BOOLEAN"),
                ],
                DEFAULT_POSITION,
            ),
            Table::new(
                "audit",
                vec![
                    Column::new("order_ref", "INT").references("order", "primary"),
                    Column::new("self_ref", "INT").references("audit", "order_ref"),
                    Column::new("at", "TIMESTAMP").not_null(),
                ],
                DEFAULT_POSITION,
            ),
        ];
        for dialect in Dialect::ALL {
            assert_round_trip(&tables, dialect);
        }
    }

    #[test]
    fn test_round_trip_after_import() {
        let sql = indoc! {"
            CREATE TABLE users (id SERIAL PRIMARY KEY, email character varying(80) NOT NULL);
            CREATE TABLE pets (id INT8, owner_id INTEGER REFERENCES users (id));
        "};
        let first = parse_sql(sql, Dialect::PostgreSQL).unwrap();
        assert_round_trip(&first.tables, Dialect::PostgreSQL);
        assert_eq!(
            first.tables[1].columns[1].foreign_key,
            Some(ForeignKeyRef::new("users", "id"))
        );
    }
}
