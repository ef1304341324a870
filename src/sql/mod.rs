//! SQL DDL import and export.

mod dialect;
mod generator;
mod lexer;
mod parser;
mod types;

pub use dialect::Dialect;
pub use generator::{GenerationError, generate};
pub use parser::{ClauseError, ClauseErrorKind, ParseError, ParsedSchema, parse_sql, parse_sql_with_metrics};
pub use types::{is_canonical, normalize_type};
