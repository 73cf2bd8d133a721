use logos::Logos;
use strum_macros::EnumIter;
pub use self::TokenKind::*;

/// Tokens for the transactional CLI's small command language: `BEGIN`,
/// `INSERT key value`, `UPDATE key delta`, `DELETE key`, `LOOKUP key`,
/// `COMMIT`, `ABORT`, plus the usual control commands carried over from the
/// storage-engine CLI (`INFO`, `KEYS`, `KSIZE`, `SHOW`).
#[allow(non_camel_case_types)]
#[derive(Logos, EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Error,

    EOI,

    #[regex(r"[ \t\r\f]+", logos::skip)]
    Whitespace,

    #[regex(r"--[^\t\n\f]*", logos::skip)]
    Comment,

    #[regex(r"[\n]+")]
    Newline,

    #[regex(r#"`[^`]*`"#)]
    #[regex(r#""([^"\\]|\\.|"")*""#)]
    #[regex(r#"'([^'\\]|\\.|'')*'"#)]
    QuotedString,

    #[token(";")]
    SemiColon,

    // Keywords
    #[token("BEGIN", ignore(ascii_case))]
    BEGIN,
    #[token("COMMIT", ignore(ascii_case))]
    COMMIT,
    #[token("ABORT", ignore(ascii_case))]
    ABORT,
    #[token("INSERT", ignore(ascii_case))]
    #[token("PUT", ignore(ascii_case))]
    INSERT,
    #[token("UPDATE", ignore(ascii_case))]
    UPDATE,
    #[token("DELETE", ignore(ascii_case))]
    #[token("DEL", ignore(ascii_case))]
    DELETE,
    #[token("LOOKUP", ignore(ascii_case))]
    #[token("GET", ignore(ascii_case))]
    LOOKUP,
    #[token("INFO", ignore(ascii_case))]
    INFO,
    #[token("KEYS", ignore(ascii_case))]
    KEYS,
    #[token("KSIZE", ignore(ascii_case))]
    KSize,
    #[token("SHOW", ignore(ascii_case))]
    SHOW,
    #[token("HELP", ignore(ascii_case))]
    HELP,

    #[regex(r#"[_a-zA-Z][_$a-zA-Z0-9]*"#)]
    Ident,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, QuotedString | Ident)
    }
}
