//! Edge-case and property tests for the lexer.

use proptest::prelude::*;

use crate::{Lexer, Token};
use shonac_util::Handler;

fn lex_all(source: &str) -> Vec<Token> {
    let handler = Handler::silent();
    Lexer::new(source, &handler).collect()
}

#[test]
fn test_comment_at_eof_without_newline() {
    assert_eq!(lex_all("1 # trailing"), vec![Token::Number(1.0)]);
}

#[test]
fn test_crlf_comment_termination() {
    assert_eq!(
        lex_all("# a\r\n2"),
        vec![Token::Number(2.0)]
    );
}

#[test]
fn test_string_spanning_lines() {
    assert_eq!(lex_all("\"a\nb\""), vec![Token::Str("a\nb".to_string())]);
}

#[test]
fn test_adjacent_tokens_without_spaces() {
    assert_eq!(
        lex_all("fib(n-1)+fib(n-2)"),
        vec![
            Token::Ident("fib".to_string()),
            Token::Raw('('),
            Token::Ident("n".to_string()),
            Token::Raw('-'),
            Token::Number(1.0),
            Token::Raw(')'),
            Token::Raw('+'),
            Token::Ident("fib".to_string()),
            Token::Raw('('),
            Token::Ident("n".to_string()),
            Token::Raw('-'),
            Token::Number(2.0),
            Token::Raw(')'),
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(lex_all("kanak"), vec![Token::Ident("kanak".to_string())]);
    assert_eq!(lex_all("zitas"), vec![Token::Ident("zitas".to_string())]);
}

#[test]
fn test_non_ascii_passes_through_as_raw() {
    assert_eq!(lex_all("µ"), vec![Token::Raw('µ')]);
}

proptest! {
    /// The lexer terminates and never panics on arbitrary printable input.
    #[test]
    fn prop_lexer_never_panics(input in "[ -~\n]{0,200}") {
        let handler = Handler::silent();
        let mut lexer = Lexer::new(&input, &handler);
        let mut count = 0usize;
        while lexer.next_token() != Token::Eof {
            count += 1;
            prop_assert!(count <= input.len() + 1);
        }
    }

    /// A bare decimal literal survives the lex round trip.
    #[test]
    fn prop_number_round_trip(value in 0u32..1_000_000u32, frac in 0u32..1000u32) {
        let text = format!("{}.{:03}", value, frac);
        let expected: f64 = text.parse().unwrap();
        let handler = Handler::silent();
        let token = Lexer::new(&text, &handler).next_token();
        prop_assert_eq!(token, Token::Number(expected));
        prop_assert!(!handler.has_errors());
    }

    /// Identifier runs lex as a single token.
    #[test]
    fn prop_identifier_is_single_token(name in "[a-zA-Z][a-zA-Z0-9]{0,20}") {
        let handler = Handler::silent();
        let tokens: Vec<_> = Lexer::new(&name, &handler).collect();
        prop_assert_eq!(tokens.len(), 1);
    }
}
