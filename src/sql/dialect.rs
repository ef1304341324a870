//! SQL dialect selection and detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lexer::{Lexer, Token};

/// SQL dialect variants. Only type-alias normalization and identifier quoting
/// depend on the dialect; statement structure is parsed the same way for all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Standard SQL
    #[default]
    Standard,
    PostgreSQL,
    MySQL,
    CockroachDB,
    SQLite,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Self::Standard,
        Self::PostgreSQL,
        Self::MySQL,
        Self::CockroachDB,
        Self::SQLite,
    ];

    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "generic" | "sql" => Some(Self::Standard),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "cockroach" | "cockroachdb" | "crdb" => Some(Self::CockroachDB),
            "sqlite" | "sqlite3" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Key used on the wire and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::CockroachDB => "cockroachdb",
            Self::SQLite => "sqlite",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard SQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::CockroachDB => "CockroachDB",
            Self::SQLite => "SQLite",
        }
    }

    /// Guess the dialect from dump content: a vendor dump header wins,
    /// otherwise the first dialect whose signature words appear as bare
    /// tokens. String literals and quoted names never count.
    pub fn detect(content: &str) -> Self {
        let comments: Vec<String> = content
            .lines()
            .map(str::trim_start)
            .filter(|line| line.starts_with("--") || line.starts_with('#') || line.starts_with("/*"))
            .map(str::to_lowercase)
            .collect();
        let header = DUMP_HEADERS
            .iter()
            .find(|(signature, _)| comments.iter().any(|c| c.contains(signature)));
        if let Some(&(_, dialect)) = header {
            return dialect;
        }

        let tokens = Lexer::new(content).tokenize();
        let signed = SIGNATURE_WORDS.iter().find(|(_, words)| {
            tokens
                .iter()
                .any(|token| words.iter().any(|word| token.is_word(word)))
        });
        match signed {
            Some(&(dialect, _)) => dialect,
            None if tokens.contains(&Token::Brackets) => Self::PostgreSQL,
            None => Self::Standard,
        }
    }
}

/// Comment text written by vendor dump tools, checked in order.
const DUMP_HEADERS: &[(&str, Dialect)] = &[
    ("cockroachdb", Dialect::CockroachDB),
    ("postgres", Dialect::PostgreSQL),
    ("pg_dump", Dialect::PostgreSQL),
    ("mysql", Dialect::MySQL),
    ("mariadb", Dialect::MySQL),
    ("sqlite", Dialect::SQLite),
];

/// Bare words only one dialect uses, in priority order.
const SIGNATURE_WORDS: &[(Dialect, &[&str])] = &[
    (Dialect::CockroachDB, &["STRING", "LOCALITY", "INTERLEAVE"]),
    (Dialect::SQLite, &["AUTOINCREMENT", "ROWID"]),
    (
        Dialect::PostgreSQL,
        &["SERIAL", "BIGSERIAL", "SMALLSERIAL", "TIMESTAMPTZ", "BYTEA", "JSONB"],
    ),
    (
        Dialect::MySQL,
        &["AUTO_INCREMENT", "TINYINT", "MEDIUMINT", "UNSIGNED", "ENGINE", "LONGTEXT"],
    ),
];

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips() {
        for dialect in Dialect::ALL {
            assert_eq!(Dialect::from_str(dialect.as_str()), Some(dialect));
        }
        assert_eq!(Dialect::from_str("Postgres"), Some(Dialect::PostgreSQL));
        assert_eq!(Dialect::from_str("oracle"), None);
    }

    #[test]
    fn test_detect_postgres() {
        let sql = "-- PostgreSQL database dump\nCREATE TABLE users (id SERIAL);";
        assert_eq!(Dialect::detect(sql), Dialect::PostgreSQL);
    }

    #[test]
    fn test_detect_mysql() {
        let sql = "-- MySQL dump\nCREATE TABLE users (id INT AUTO_INCREMENT);";
        assert_eq!(Dialect::detect(sql), Dialect::MySQL);
    }

    #[test]
    fn test_detect_cockroach() {
        let sql = "CREATE TABLE users (id INT8 PRIMARY KEY, name STRING) LOCALITY REGIONAL BY ROW;";
        assert_eq!(Dialect::detect(sql), Dialect::CockroachDB);
    }

    #[test]
    fn test_detect_sqlite() {
        let sql = "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT);";
        assert_eq!(Dialect::detect(sql), Dialect::SQLite);
    }

    #[test]
    fn test_header_beats_words_in_literals() {
        let sql = "-- PostgreSQL database dump\nCREATE TABLE a (id int2, note text DEFAULT 'a string');";
        assert_eq!(Dialect::detect(sql), Dialect::PostgreSQL);
    }

    #[test]
    fn test_literals_and_quoted_names_are_not_signatures() {
        let sql = r#"CREATE TABLE a (id SERIAL, note TEXT DEFAULT 'a string', "locality" TEXT);"#;
        assert_eq!(Dialect::detect(sql), Dialect::PostgreSQL);
    }

    #[test]
    fn test_detect_array_suffix() {
        assert_eq!(Dialect::detect("CREATE TABLE a (tags TEXT[]);"), Dialect::PostgreSQL);
    }

    #[test]
    fn test_detect_standard() {
        let sql = "CREATE TABLE users (id INTEGER PRIMARY KEY);";
        assert_eq!(Dialect::detect(sql), Dialect::Standard);
    }
}
