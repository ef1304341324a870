//! Tokenizer for DDL text.
//!
//! Comments, whitespace and punctuation the parser has no use for (operators,
//! casts, `=`) are dropped here, so the parser only sees words, literals and
//! structural symbols.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    Check,
    If,
    Exists,

    Ident(String),
    /// `"name"`, `` `name` `` or `[name]`; never treated as a keyword
    QuotedIdent(String),
    Str(String),
    Num(String),

    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// `[]` array suffix
    Brackets,

    Eof,
}

const KEYWORDS: &[(&str, Token)] = &[
    ("CREATE", Token::Create),
    ("ALTER", Token::Alter),
    ("ADD", Token::Add),
    ("TABLE", Token::Table),
    ("ONLY", Token::Only),
    ("PRIMARY", Token::Primary),
    ("KEY", Token::Key),
    ("FOREIGN", Token::Foreign),
    ("REFERENCES", Token::References),
    ("NOT", Token::Not),
    ("NULL", Token::Null),
    ("UNIQUE", Token::Unique),
    ("DEFAULT", Token::Default),
    ("ON", Token::On),
    ("CONSTRAINT", Token::Constraint),
    ("INDEX", Token::Index),
    ("CHECK", Token::Check),
    ("IF", Token::If),
    ("EXISTS", Token::Exists),
];

/// Keyword token for a bare word, ignoring case.
pub fn keyword(word: &str) -> Option<Token> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| kw.eq_ignore_ascii_case(word))
        .map(|(_, token)| token.clone())
}

impl Token {
    /// Identifier text for bare or quoted identifiers. A blank quoted
    /// identifier is not a name.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s) => Some(s),
            Token::QuotedIdent(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    /// Bare word equal to `word`, ignoring case. Quoted identifiers never match.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Num(s) => f.write_str(s),
            Token::QuotedIdent(s) => write!(f, "\"{}\"", s),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Dot => f.write_str("."),
            Token::Brackets => f.write_str("[]"),
            Token::Eof => f.write_str("<eof>"),
            keyword => {
                let word = KEYWORDS
                    .iter()
                    .find(|(_, token)| token == keyword)
                    .map_or("?", |(word, _)| *word);
                f.write_str(word)
            }
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// MySQL treats `\` in string literals as an escape; standard SQL does not
    backslash_escapes: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            backslash_escapes: false,
        }
    }

    pub fn backslash_escapes(mut self, enabled: bool) -> Self {
        self.backslash_escapes = enabled;
        self
    }

    /// Collect all tokens, ending with `Token::Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        while let Some((start, c)) = self.chars.next() {
            let token = match c {
                c if c.is_whitespace() => continue,
                '-' if self.next_is('-') => {
                    self.skip_line();
                    continue;
                }
                '#' => {
                    self.skip_line();
                    continue;
                }
                '/' if self.next_is('*') => {
                    self.skip_block_comment();
                    continue;
                }
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '.' => Token::Dot,
                '[' if self.next_is(']') => {
                    self.chars.next();
                    Token::Brackets
                }
                '[' => Token::QuotedIdent(self.quoted(']')),
                '"' | '`' => Token::QuotedIdent(self.quoted(c)),
                '\'' => Token::Str(self.string(self.backslash_escapes)),
                '-' if self.peek().is_some_and(|d| d.is_ascii_digit()) => Token::Num(self.number(start)),
                c if c.is_ascii_digit() => Token::Num(self.number(start)),
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.word(start);
                    // PostgreSQL E'...' escape string
                    if word.eq_ignore_ascii_case("E") && self.next_is('\'') {
                        self.chars.next();
                        Token::Str(self.string(true))
                    } else {
                        keyword(word).unwrap_or_else(|| Token::Ident(word.to_string()))
                    }
                }
                // operators, casts and other punctuation
                _ => continue,
            };
            return token;
        }
        Token::Eof
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn next_is(&mut self, c: char) -> bool {
        self.peek() == Some(c)
    }

    /// Byte offset of the next unread char.
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn skip_line(&mut self) {
        for (_, c) in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.chars.next(); // *
        let mut prev = '\0';
        for (_, c) in self.chars.by_ref() {
            if prev == '*' && c == '/' {
                break;
            }
            prev = c;
        }
    }

    fn word(&mut self, start: usize) -> &'a str {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.chars.next();
        }
        let end = self.offset();
        &self.input[start..end]
    }

    fn number(&mut self, start: usize) -> String {
        let mut seen_dot = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {}
                Some('.') if !seen_dot => seen_dot = true,
                _ => break,
            }
            self.chars.next();
        }
        let end = self.offset();
        self.input[start..end].to_string()
    }

    /// Quoted identifier body; a doubled closing quote stands for itself.
    fn quoted(&mut self, close: char) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            if c == close {
                if !self.next_is(close) {
                    break;
                }
                self.chars.next();
            }
            out.push(c);
        }
        out
    }

    /// String literal body. `''` always stands for a quote; backslash
    /// sequences only when `escapes` is set.
    fn string(&mut self, escapes: bool) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\'' if self.next_is('\'') => {
                    self.chars.next();
                    out.push('\'');
                }
                '\'' => break,
                '\\' if escapes => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                _ => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    #[test]
    fn test_create_table_tokens() {
        let tokens = Lexer::new("CREATE TABLE users (id INT);").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                ident("users"),
                Token::LParen,
                ident("id"),
                ident("INT"),
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_ignore_case() {
        let tokens = Lexer::new("create Table pRiMaRy").tokenize();
        assert_eq!(&tokens[..3], &[Token::Create, Token::Table, Token::Primary]);
        assert_eq!(Token::Primary.to_string(), "PRIMARY");
    }

    #[test]
    fn test_quoted_identifiers() {
        let sql = r#"CREATE TABLE "User Table" (`column name` INT, [key] TEXT, "a""b" INT);"#;
        let tokens = Lexer::new(sql).tokenize();

        assert_eq!(tokens[2], Token::QuotedIdent("User Table".to_string()));
        assert_eq!(tokens[4], Token::QuotedIdent("column name".to_string()));
        assert_eq!(tokens[7], Token::QuotedIdent("key".to_string()));
        assert_eq!(tokens[10], Token::QuotedIdent("a\"b".to_string()));
    }

    #[test]
    fn test_quoted_keyword_is_not_a_keyword() {
        let tokens = Lexer::new(r#""primary" key"#).tokenize();
        assert_eq!(tokens[0], Token::QuotedIdent("primary".to_string()));
        assert_eq!(tokens[1], Token::Key);
    }

    #[test]
    fn test_blank_quoted_identifier_is_not_a_name() {
        let tokens = Lexer::new(r#""  " t"#).tokenize();
        assert_eq!(tokens[0].ident(), None);
        assert_eq!(tokens[1].ident(), Some("t"));
    }

    #[test]
    fn test_comments() {
        let sql = "-- comment\nCREATE /* block * still */ TABLE t (id INT); # trailing";
        let tokens = Lexer::new(sql).tokenize();

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
        assert_eq!(tokens.last(), Some(&Token::Eof));
        assert_eq!(tokens[tokens.len() - 2], Token::Semicolon);
    }

    #[test]
    fn test_array_suffix_strings_and_numbers() {
        let tokens = Lexer::new("tags TEXT[] DEFAULT 'it''s', n NUMERIC(10,2) DEFAULT -1.5").tokenize();
        assert_eq!(tokens[2], Token::Brackets);
        assert_eq!(tokens[4], Token::Str("it's".to_string()));
        assert_eq!(tokens[9], Token::Num("10".to_string()));
        assert_eq!(tokens[14], Token::Num("-1.5".to_string()));
    }

    #[test]
    fn test_backslash_is_literal_by_default() {
        let tokens = Lexer::new(r"'C:\' , q").tokenize();
        assert_eq!(
            tokens,
            vec![Token::Str(r"C:\".to_string()), Token::Comma, ident("q"), Token::Eof]
        );
    }

    #[test]
    fn test_backslash_escapes() {
        let sql = r"'it\'s\n' x";
        let tokens = Lexer::new(sql).backslash_escapes(true).tokenize();
        assert_eq!(tokens[0], Token::Str("it's\n".to_string()));
        assert_eq!(tokens[1], ident("x"));

        let tokens = Lexer::new(r"E'a\'b' x").tokenize();
        assert_eq!(tokens[0], Token::Str("a'b".to_string()));
        assert_eq!(tokens[1], ident("x"));
    }

    #[test]
    fn test_operators_are_dropped() {
        let tokens = Lexer::new("x::text = 'a' <> b").tokenize();
        assert_eq!(
            tokens,
            vec![ident("x"), ident("text"), Token::Str("a".to_string()), ident("b"), Token::Eof]
        );
    }

    #[test]
    fn test_schema_qualified_name() {
        let tokens = Lexer::new("public.users").tokenize();
        assert_eq!(tokens, vec![ident("public"), Token::Dot, ident("users"), Token::Eof]);
    }
}
