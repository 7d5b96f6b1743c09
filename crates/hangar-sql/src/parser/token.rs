//! Tokenization on top of `sqlparser`'s SQLite lexer.
//!
//! Whitespace and comments are dropped, so the extractor only ever sees
//! words, literals, placeholders and punctuation.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Location, Tokenizer};

pub use sqlparser::tokenizer::Token;

use super::{ParseError, ParseResult};

/// Token predicates the extractor relies on.
pub trait TokenExt {
    /// Returns true if this token is the given keyword (case-insensitive).
    /// Quoted words are never keywords.
    fn is_keyword(&self, keyword: &str) -> bool;

    /// Returns the identifier text if this token can name a relation or column.
    fn as_identifier(&self) -> Option<&str>;

    /// Returns true for a positional parameter (`?` or `?NNN`).
    fn is_placeholder(&self) -> bool;

    /// Returns true for `=` or `==`.
    fn is_eq(&self) -> bool;
}

impl TokenExt for Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
    }

    fn as_identifier(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(&w.value),
            _ => None,
        }
    }

    fn is_placeholder(&self) -> bool {
        matches!(self, Token::Placeholder(p) if p.starts_with('?'))
    }

    fn is_eq(&self) -> bool {
        matches!(self, Token::Eq | Token::DoubleEq)
    }
}

/// Tokenizes statement text, dropping whitespace and comments.
pub fn tokenize(sql: &str) -> ParseResult<Vec<Token>> {
    let dialect = SQLiteDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| ParseError::Syntax(e.to_string()))?;

    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

/// Byte offsets of every statement-separating semicolon in `sql`.
///
/// Semicolons inside quoted text and comments are not tokens and so never
/// show up here.
pub fn semicolon_offsets(sql: &str) -> ParseResult<Vec<usize>> {
    let dialect = SQLiteDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| ParseError::Syntax(e.to_string()))?;

    Ok(tokens
        .iter()
        .filter(|t| t.token == Token::SemiColon)
        .filter_map(|t| byte_offset(sql, &t.location))
        .filter(|&i| sql[i..].starts_with(';'))
        .collect())
}

/// Maps a 1-based line/column location back to a byte offset.
fn byte_offset(sql: &str, location: &Location) -> Option<usize> {
    let (mut line, mut column) = (1u64, 1u64);
    for (i, c) in sql.char_indices() {
        if line == location.line && column == location.column {
            return Some(i);
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    None
}

/// Renders a token slice back into normalized text.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        let glue = matches!(token, Token::Comma | Token::RParen | Token::Period)
            || matches!(
                tokens.get(i.wrapping_sub(1)),
                Some(Token::LParen | Token::Period)
            );
        if i > 0 && !glue {
            out.push(' ');
        }
        out.push_str(&token.to_string());
    }
    out
}
