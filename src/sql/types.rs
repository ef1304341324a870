//! Declared SQL type → canonical type name.

use super::Dialect;

type Aliases = &'static [(&'static str, &'static str)];

/// Spellings every dialect folds the same way.
const COMMON: Aliases = &[
    ("CHARACTER VARYING", "VARCHAR"),
    ("DOUBLE PRECISION", "DOUBLE"),
    ("TIMESTAMP WITH", "TIMESTAMP"),
    ("INTEGER", "INT"),
    ("BOOL", "BOOLEAN"),
];

const STANDARD: Aliases = &[
    ("INT8", "BIGINT"),
    ("STRING", "TEXT"),
    ("SERIAL", "INT"),
];

const POSTGRES: Aliases = &[
    ("BIGSERIAL", "BIGINT"),
    ("SMALLSERIAL", "SMALLINT"),
    ("SERIAL", "INT"),
    ("INT8", "BIGINT"),
    ("INT4", "INT"),
    ("INT2", "SMALLINT"),
    ("TIMESTAMPTZ", "TIMESTAMP"),
    ("FLOAT8", "DOUBLE"),
    ("FLOAT4", "FLOAT"),
    ("BYTEA", "BLOB"),
];

const MYSQL: Aliases = &[
    ("TINYINT(1)", "BOOLEAN"),
    ("DATETIME", "TIMESTAMP"),
    ("LONGTEXT", "TEXT"),
    ("MEDIUMTEXT", "TEXT"),
    ("TINYTEXT", "TEXT"),
    ("LONGBLOB", "BLOB"),
    ("MEDIUMBLOB", "BLOB"),
];

const COCKROACH: Aliases = &[
    ("BIGSERIAL", "BIGINT"),
    ("SERIAL", "INT"),
    ("INT8", "BIGINT"),
    ("INT4", "INT"),
    ("STRING", "TEXT"),
    ("TIMESTAMPTZ", "TIMESTAMP"),
    ("BYTES", "BLOB"),
];

const SQLITE: Aliases = &[("DATETIME", "TIMESTAMP")];

fn aliases(dialect: Dialect) -> Aliases {
    match dialect {
        Dialect::Standard => STANDARD,
        Dialect::PostgreSQL => POSTGRES,
        Dialect::MySQL => MYSQL,
        Dialect::CockroachDB => COCKROACH,
        Dialect::SQLite => SQLITE,
    }
}

/// Map a declared type to its canonical uppercase name.
///
/// Aliases are tried in order against the full uppercased declaration
/// (arguments included) and the first contained pattern wins. Unaliased types
/// keep their base name with arguments dropped.
pub fn normalize_type(declared: &str, dialect: Dialect) -> String {
    let upper = collapse_whitespace(&declared.to_uppercase());

    let hit = aliases(dialect)
        .iter()
        .chain(COMMON.iter())
        .find(|(pattern, _)| upper.contains(pattern));
    if let Some((_, canonical)) = hit {
        return canonical.to_string();
    }

    strip_arguments(&upper)
}

/// True if normalizing `typ` under `dialect` leaves it unchanged.
pub fn is_canonical(typ: &str, dialect: Dialect) -> bool {
    normalize_type(typ, dialect) == typ
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `NUMERIC (10, 2)[]` → `NUMERIC[]`
fn strip_arguments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    collapse_whitespace(&out).replace(" [", "[")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_are_dropped() {
        assert_eq!(normalize_type("varchar(50)", Dialect::Standard), "VARCHAR");
        assert_eq!(normalize_type("DECIMAL(10, 2)", Dialect::MySQL), "DECIMAL");
        assert_eq!(normalize_type("numeric (10,2) []", Dialect::PostgreSQL), "NUMERIC[]");
    }

    #[test]
    fn test_postgres_aliases() {
        assert_eq!(normalize_type("SERIAL", Dialect::PostgreSQL), "INT");
        assert_eq!(normalize_type("bigserial", Dialect::PostgreSQL), "BIGINT");
        assert_eq!(normalize_type("INT8", Dialect::PostgreSQL), "BIGINT");
        assert_eq!(normalize_type("timestamptz", Dialect::PostgreSQL), "TIMESTAMP");
        assert_eq!(
            normalize_type("timestamp without time zone", Dialect::PostgreSQL),
            "TIMESTAMP"
        );
        assert_eq!(normalize_type("character varying(255)", Dialect::PostgreSQL), "VARCHAR");
    }

    #[test]
    fn test_mysql_aliases() {
        assert_eq!(normalize_type("TINYINT(1)", Dialect::MySQL), "BOOLEAN");
        assert_eq!(normalize_type("TINYINT(4)", Dialect::MySQL), "TINYINT");
        assert_eq!(normalize_type("DATETIME", Dialect::MySQL), "TIMESTAMP");
        assert_eq!(normalize_type("bool", Dialect::MySQL), "BOOLEAN");
    }

    #[test]
    fn test_cockroach_aliases() {
        assert_eq!(normalize_type("STRING", Dialect::CockroachDB), "TEXT");
        assert_eq!(normalize_type("INT8", Dialect::CockroachDB), "BIGINT");
    }

    #[test]
    fn test_dialect_selects_aliases() {
        // STRING is only an alias where the dialect has it
        assert_eq!(normalize_type("STRING", Dialect::SQLite), "STRING");
        assert_eq!(normalize_type("DATETIME", Dialect::PostgreSQL), "DATETIME");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "SERIAL", "INT8", "STRING", "BOOL", "TINYINT(1)", "VARCHAR(20)", "INTEGER",
            "DOUBLE PRECISION", "TIMESTAMPTZ", "text[]", "DATETIME", "bytea",
        ];
        for dialect in Dialect::ALL {
            for input in inputs {
                let once = normalize_type(input, dialect);
                assert_eq!(normalize_type(&once, dialect), once, "{dialect}: {input}");
            }
        }
    }
}
