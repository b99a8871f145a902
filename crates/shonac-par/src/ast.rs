//! Abstract syntax tree.
//!
//! The AST is a strict tree: every non-leaf reference is unique-owned
//! (`Box` / `Vec`) and there are no back-edges. Expression forms are a
//! closed sum type so the code generator's `match` is exhaustive; adding a
//! variant is a compile error until every emission site handles it.
//!
//! `Display` renders canonical source text. Binary expressions print fully
//! parenthesized, so the printed form re-parses to an equal tree regardless
//! of the precedence table in effect.

use std::fmt;

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// Variable reference, possibly qualified (`Class.member`).
    Variable(String),
    /// Application of a user-defined unary operator.
    Unary { op: char, operand: Box<Expr> },
    /// Binary operation, including assignment (`=`).
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Function or method call.
    Call { callee: String, args: Vec<Expr> },
    /// `kana (cond) { then } [kanaKuti { else }]`
    If {
        cond: Box<Expr>,
        then_body: Vec<Expr>,
        else_body: Vec<Expr>,
    },
    /// `kusvika (cond) { body }`
    While { cond: Box<Expr>, body: Vec<Expr> },
    /// `pakati (var = start, end [, step]) { body }`; the body is a Block.
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    /// `zita name [= init] (, ...)* mu body`
    Var {
        bindings: Vec<(String, Option<Expr>)>,
        body: Box<Expr>,
    },
    /// `zitaGuru name [= init] (, ...)*`
    GlobalVar { bindings: Vec<(String, Option<Expr>)> },
    /// A brace-delimited statement sequence.
    Block(Vec<Expr>),
    /// `dzosa value`
    Return(Box<Expr>),
}

/// A function signature: name, parameter names, and operator metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
    pub is_operator: bool,
    pub precedence: i32,
}

impl Prototype {
    /// Creates a plain (non-operator) prototype.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            is_operator: false,
            precedence: 0,
        }
    }

    /// Creates an operator prototype with the given precedence.
    pub fn operator(name: impl Into<String>, args: Vec<String>, precedence: i32) -> Self {
        Self {
            name: name.into(),
            args,
            is_operator: true,
            precedence,
        }
    }

    /// True for a user-defined unary operator.
    pub fn is_unary_op(&self) -> bool {
        self.is_operator && self.args.len() == 1
    }

    /// True for a user-defined binary operator.
    pub fn is_binary_op(&self) -> bool {
        self.is_operator && self.args.len() == 2
    }

    /// The operator character: the last character of the mangled name.
    pub fn operator_char(&self) -> Option<char> {
        if self.is_operator {
            self.name.chars().last()
        } else {
            None
        }
    }

    /// Returns a copy of this prototype registered under a different name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: self.args.clone(),
            is_operator: self.is_operator,
            precedence: self.precedence,
        }
    }
}

/// A function: prototype plus body statements.
///
/// Methods carry `qualified_name = "Class.method"`; free functions carry
/// `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Vec<Expr>,
    pub qualified_name: Option<String>,
}

impl Function {
    pub fn new(proto: Prototype, body: Vec<Expr>) -> Self {
        Self {
            proto,
            body,
            qualified_name: None,
        }
    }

    /// The name this function is emitted under, absent an override.
    pub fn effective_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.proto.name)
    }
}

/// A class: methods plus member variables.
///
/// Classes exist only in the front end; lowering rewrites every method to a
/// `Class.method` function and every member to a `Class.member` global
/// before emission, so the runtime graph never needs class objects.
#[derive(Clone, Debug, PartialEq)]
pub struct Class {
    pub name: String,
    pub methods: Vec<Function>,
    pub members: Vec<(String, Option<Expr>)>,
}

fn write_stmt_seq(f: &mut fmt::Formatter<'_>, stmts: &[Expr]) -> fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, "; ")?;
        }
        write!(f, "{}", stmt)?;
    }
    Ok(())
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[(String, Option<Expr>)]) -> fmt::Result {
    for (i, (name, init)) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", name)?;
        if let Some(init) = init {
            write!(f, " = {}", init)?;
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Str(text) => write!(f, "\"{}\"", text),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Unary { op, operand } => write!(f, "{}{}", op, operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::If {
                cond,
                then_body,
                else_body,
            } => {
                write!(f, "kana ({}) {{ ", cond)?;
                write_stmt_seq(f, then_body)?;
                write!(f, " }}")?;
                if !else_body.is_empty() {
                    write!(f, " kanaKuti {{ ")?;
                    write_stmt_seq(f, else_body)?;
                    write!(f, " }}")?;
                }
                Ok(())
            }
            Expr::While { cond, body } => {
                write!(f, "kusvika ({}) {{ ", cond)?;
                write_stmt_seq(f, body)?;
                write!(f, " }}")
            }
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                write!(f, "pakati ({} = {}, {}", var, start, end)?;
                if let Some(step) = step {
                    write!(f, ", {}", step)?;
                }
                write!(f, ") {{ {} }}", body)
            }
            Expr::Var { bindings, body } => {
                write!(f, "zita ")?;
                write_bindings(f, bindings)?;
                write!(f, " mu {}", body)
            }
            Expr::GlobalVar { bindings } => {
                write!(f, "zitaGuru ")?;
                write_bindings(f, bindings)
            }
            Expr::Block(stmts) => write_stmt_seq(f, stmts),
            Expr::Return(value) => write!(f, "dzosa {}", value),
        }
    }
}
