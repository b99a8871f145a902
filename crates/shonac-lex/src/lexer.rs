//! Core lexer implementation.

use shonac_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token};

/// Lexer for the Shona language.
///
/// Produces tokens on demand via [`Lexer::next_token`]; the parser drives it
/// one token at a time, which keeps the driver's read-compile-execute loop
/// strictly incremental.
pub struct Lexer<'a> {
    /// Character cursor over the source.
    cursor: Cursor<'a>,

    /// Diagnostic handler for lexical errors.
    handler: &'a Handler,

    /// Starting byte offset of the current token.
    token_start: usize,

    /// Line where the current token starts (1-based).
    token_start_line: u32,

    /// Column where the current token starts (1-based).
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Returns the next token from the source.
    ///
    /// Skips whitespace and `#` comments, then dispatches on the current
    /// character. Unrecognized characters pass through as [`Token::Raw`];
    /// only an unterminated string cuts the stream short (it yields
    /// [`Token::Eof`] immediately).
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        match self.cursor.current_char() {
            '"' => self.lex_string(),
            ';' => {
                self.cursor.advance();
                Token::Semicolon
            }
            '.' => {
                if self.cursor.peek_char(1).is_ascii_digit() {
                    self.lex_number()
                } else {
                    self.cursor.advance();
                    Token::Dot
                }
            }
            c if c.is_ascii_alphabetic() => self.lex_identifier(),
            c if c.is_ascii_digit() => self.lex_number(),
            c => {
                self.cursor.advance();
                Token::Raw(c)
            }
        }
    }

    /// Returns the line number the next token will start on.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Returns the span of the token most recently returned.
    pub fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Lexes an identifier or keyword: `[A-Za-z][A-Za-z0-9]*`.
    fn lex_identifier(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_alphanumeric() {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(text.to_string()))
    }

    /// Lexes a numeric literal: a greedy run of `[0-9.]`.
    ///
    /// A literal containing more than one `.` is flagged with a diagnostic;
    /// its value is the prefix up to the second dot, matching what `strtod`
    /// made of such runs historically.
    fn lex_number(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_digit() || self.cursor.current_char() == '.' {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);

        let mut valid = text;
        if let Some(first_dot) = text.find('.') {
            if let Some(extra) = text[first_dot + 1..].find('.') {
                valid = &text[..first_dot + 1 + extra];
                self.report_error(format!(
                    "number literal '{}' has more than one decimal point",
                    text
                ));
            }
        }

        match valid.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => {
                self.report_error(format!("invalid number literal '{}'", text));
                Token::Number(0.0)
            }
        }
    }

    /// Lexes a string literal.
    ///
    /// Content up to the next `"` is captured verbatim, newlines included;
    /// there is no escape processing. Hitting end of input inside the
    /// literal ends the token stream.
    fn lex_string(&mut self) -> Token {
        self.cursor.advance();

        let start = self.cursor.position();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }

        if self.cursor.is_at_end() {
            self.report_error("unterminated string literal".to_string());
            return Token::Eof;
        }

        let content = self.cursor.slice_from(start).to_string();
        self.cursor.advance();
        Token::Str(content)
    }

    /// Skips whitespace and `#`-to-end-of-line comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.advance();
            } else if c == '#' {
                while !self.cursor.is_at_end()
                    && self.cursor.current_char() != '\n'
                    && self.cursor.current_char() != '\r'
                {
                    self.cursor.advance();
                }
            } else {
                return;
            }
        }
    }

    /// Reports a lexical error at the current token position.
    fn report_error(&self, message: String) {
        self.handler.error(message, self.token_span());
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token == Token::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let handler = Handler::silent();
        Lexer::new(source, &handler).collect()
    }

    fn lex_one(source: &str) -> Token {
        let handler = Handler::silent();
        Lexer::new(source, &handler).next_token()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex_one(""), Token::Eof);
        assert_eq!(lex_one("   \n\t "), Token::Eof);
    }

    #[test]
    fn test_identifier_and_keywords() {
        assert_eq!(lex_one("fib"), Token::Ident("fib".to_string()));
        assert_eq!(lex_one("basa"), Token::Def);
        assert_eq!(lex_one("kusvika"), Token::While);
        assert_eq!(lex_one("x1"), Token::Ident("x1".to_string()));
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(lex_one("42"), Token::Number(42.0));
        assert_eq!(lex_one("3.14"), Token::Number(3.14));
        assert_eq!(lex_one(".5"), Token::Number(0.5));
        assert_eq!(lex_one("1."), Token::Number(1.0));
    }

    #[test]
    fn test_number_with_multiple_dots_is_flagged() {
        let handler = Handler::silent();
        let mut lexer = Lexer::new("1.2.3", &handler);
        assert_eq!(lexer.next_token(), Token::Number(1.2));
        assert!(handler.has_errors());
        // The whole run is consumed; nothing trails.
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(lex_one("\"hello\""), Token::Str("hello".to_string()));
        assert_eq!(lex_one("\"\""), Token::Str(String::new()));
    }

    #[test]
    fn test_string_no_escape_processing() {
        assert_eq!(lex_one("\"a\\nb\""), Token::Str("a\\nb".to_string()));
    }

    #[test]
    fn test_unterminated_string_yields_eof() {
        let handler = Handler::silent();
        let mut lexer = Lexer::new("\"no end", &handler);
        assert_eq!(lexer.next_token(), Token::Eof);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_comment_to_end_of_line() {
        assert_eq!(
            lex_all("# chirevo\nkana"),
            vec![Token::If]
        );
        assert_eq!(lex_all("# only a comment"), vec![]);
    }

    #[test]
    fn test_raw_punctuation() {
        assert_eq!(
            lex_all("a + b"),
            vec![
                Token::Ident("a".to_string()),
                Token::Raw('+'),
                Token::Ident("b".to_string()),
            ]
        );
        assert_eq!(lex_one("("), Token::Raw('('));
        assert_eq!(lex_one("="), Token::Raw('='));
    }

    #[test]
    fn test_semicolon_and_dot() {
        assert_eq!(lex_one(";"), Token::Semicolon);
        assert_eq!(
            lex_all("Point.dist"),
            vec![
                Token::Ident("Point".to_string()),
                Token::Dot,
                Token::Ident("dist".to_string()),
            ]
        );
    }

    #[test]
    fn test_dot_before_digit_is_number() {
        assert_eq!(
            lex_all("x .5"),
            vec![Token::Ident("x".to_string()), Token::Number(0.5)]
        );
    }

    #[test]
    fn test_line_tracking() {
        let handler = Handler::silent();
        let mut lexer = Lexer::new("a\nb\nc", &handler);
        lexer.next_token();
        assert_eq!(lexer.token_span().line, 1);
        lexer.next_token();
        assert_eq!(lexer.token_span().line, 2);
        lexer.next_token();
        assert_eq!(lexer.token_span().line, 3);
    }

    #[test]
    fn test_definition_token_stream() {
        assert_eq!(
            lex_all("basa fib(n) { dzosa n }"),
            vec![
                Token::Def,
                Token::Ident("fib".to_string()),
                Token::Raw('('),
                Token::Ident("n".to_string()),
                Token::Raw(')'),
                Token::Raw('{'),
                Token::Return,
                Token::Ident("n".to_string()),
                Token::Raw('}'),
            ]
        );
    }

    #[test]
    fn test_underscore_is_not_identifier() {
        // The identifier alphabet is [A-Za-z0-9] only.
        assert_eq!(
            lex_all("a_b"),
            vec![
                Token::Ident("a".to_string()),
                Token::Raw('_'),
                Token::Ident("b".to_string()),
            ]
        );
    }
}
