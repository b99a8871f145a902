//! shonac-par - Parser (Syntactic Analyzer).
//!
//! Recursive descent with operator-precedence climbing for binary
//! expressions, in the classic two-function shape: `parse_unary` produces a
//! left-hand side, `parse_binop_rhs` folds `(binop unary)*` onto it, guided
//! by the driver-owned precedence table. User-defined binary operators
//! extend that table as their definitions are *emitted*, so an operator is
//! usable from the next top-level item onward.
//!
//! The parser pulls tokens from the lexer one at a time (single-token
//! lookahead in `cur`), which keeps the driver's read-compile-execute loop
//! incremental: nothing beyond the current top-level item is consumed.
//!
//! Error recovery is deliberately minimal and reproducible: every parse
//! routine reports a diagnostic with the current line and returns `None`,
//! and `parse_toplevel` then discards exactly one token and continues.
//! Synchronizing to `;` or `}` would recover faster from cascades but is
//! left as an extension to keep outputs stable.

pub mod ast;
mod expr;
mod items;

#[cfg(test)]
mod edge_cases;

use rustc_hash::FxHashMap;

use shonac_lex::{Lexer, Token};
use shonac_util::{Handler, Span};

pub use ast::{Class, Expr, Function, Prototype};

/// Binary operator precedence table: char → precedence in [1, 100].
///
/// Owned by the driver and passed by reference: the parser reads it, the
/// code generator extends it when a `binary` definition is emitted.
pub type PrecedenceTable = FxHashMap<char, i32>;

/// The seeded precedence table.
///
/// `=` is seeded at 2 so assignment parses as an ordinary (loosest-binding)
/// binary operator; the code generator gives it its store semantics.
pub fn default_precedence() -> PrecedenceTable {
    let mut table = PrecedenceTable::default();
    table.insert('=', 2);
    table.insert('<', 10);
    table.insert('>', 10);
    table.insert('+', 20);
    table.insert('-', 20);
    table.insert('*', 40);
    table
}

/// One item produced by [`Parser::parse_toplevel`].
#[derive(Clone, Debug, PartialEq)]
pub enum ToplevelItem {
    /// A `basa` function definition.
    Definition(Function),
    /// An `extern` prototype.
    Extern(Prototype),
    /// A `kirasi` declaration.
    Class(Class),
    /// A top-level `zitaGuru` binding list.
    Globals(Vec<(String, Option<Expr>)>),
    /// A bare expression, wrapped as an anonymous `__anon_expr<N>` function.
    Expression(Function),
    /// An empty statement, or an error after which one token was skipped.
    Skipped,
    /// End of input.
    Eof,
}

/// Parser over a single source text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// One-token lookahead.
    cur: Token,
    /// Span of the lookahead token.
    cur_span: Span,
    handler: &'a Handler,
    /// Counter for `__anon_expr<N>` names, monotonically increasing.
    anon_count: u32,
}

impl<'a> Parser<'a> {
    /// Creates a parser and primes the one-token lookahead.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        let mut lexer = Lexer::new(source, handler);
        let cur = lexer.next_token();
        let cur_span = lexer.token_span();
        Self {
            lexer,
            cur,
            cur_span,
            handler,
            anon_count: 0,
        }
    }

    /// Returns a reference to the lookahead token.
    pub fn current(&self) -> &Token {
        &self.cur
    }

    /// Advances to the next token.
    pub fn bump(&mut self) {
        self.cur = self.lexer.next_token();
        self.cur_span = self.lexer.token_span();
    }

    /// Dispatches on the current token to the matching top-level parse.
    ///
    /// On a parse error the failing routine has already reported a
    /// diagnostic; this function then skips one token and reports
    /// [`ToplevelItem::Skipped`] so the caller just continues its loop.
    pub fn parse_toplevel(&mut self, prec: &PrecedenceTable) -> ToplevelItem {
        match self.cur {
            Token::Eof => ToplevelItem::Eof,
            Token::Semicolon => {
                self.bump();
                ToplevelItem::Skipped
            }
            Token::Def => match self.parse_definition(prec) {
                Some(func) => ToplevelItem::Definition(func),
                None => self.recover(),
            },
            Token::Class => match self.parse_class(prec) {
                Some(class) => ToplevelItem::Class(class),
                None => self.recover(),
            },
            Token::Extern => match self.parse_extern() {
                Some(proto) => ToplevelItem::Extern(proto),
                None => self.recover(),
            },
            Token::GlobalVar => match self.parse_global_var(prec) {
                Some(bindings) => ToplevelItem::Globals(bindings),
                None => self.recover(),
            },
            _ => match self.parse_toplevel_expr(prec) {
                Some(func) => ToplevelItem::Expression(func),
                None => self.recover(),
            },
        }
    }

    /// The one-token recovery policy.
    fn recover(&mut self) -> ToplevelItem {
        self.bump();
        ToplevelItem::Skipped
    }

    /// Reports an error at the current token and yields no node.
    pub(crate) fn err<T>(&self, message: impl Into<String>) -> Option<T> {
        self.handler.error(message, self.cur_span);
        None
    }

    /// Precedence of the current token, or -1 when it is not a declared
    /// ASCII binary operator.
    pub(crate) fn tok_precedence(&self, prec: &PrecedenceTable) -> i32 {
        match self.cur.raw() {
            Some(c) if c.is_ascii() => prec.get(&c).copied().filter(|p| *p > 0).unwrap_or(-1),
            _ => -1,
        }
    }

    /// Consumes an expected raw character or reports `message`.
    pub(crate) fn expect_raw(&mut self, c: char, message: &str) -> Option<()> {
        if self.cur == Token::Raw(c) {
            self.bump();
            Some(())
        } else {
            self.err(message.to_string())
        }
    }

    /// Allocates the next `__anon_expr<N>` name.
    pub(crate) fn next_anon_name(&mut self) -> String {
        let name = format!("__anon_expr{}", self.anon_count);
        self.anon_count += 1;
        name
    }
}
