//! shonac-lex - Lexical Analyzer.
//!
//! Transforms Shona-language source text into a stream of [`Token`]s.
//!
//! The token language is deliberately small: keywords and identifiers are
//! runs of `[A-Za-z][A-Za-z0-9]*`, numbers are greedy runs of `[0-9.]`,
//! string literals are double-quoted with no escape processing, `#` starts a
//! comment through end of line, and every other character passes through as
//! [`Token::Raw`] so the parser's operator machinery can see it unfiltered.
//!
//! The lexer is hand-written with one character of lookahead, which is all
//! the grammar needs (the only use of the lookahead is distinguishing a
//! number that starts with `.` from the member-access dot).

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token};

#[cfg(test)]
mod edge_cases;
