//! Top-level item parsing: prototypes, definitions, externs, classes.

use shonac_lex::Token;

use crate::ast::{Class, Function, Prototype};
use crate::{Parser, PrecedenceTable};

/// Default precedence for `binary` definitions that omit the number.
const DEFAULT_OPERATOR_PRECEDENCE: i32 = 30;

impl<'a> Parser<'a> {
    /// `prototype := ident '(' ident* ')'`
    ///             `| unary op '(' ident ')'`
    ///             `| binary op [number] '(' ident ident ')'`
    ///
    /// Prototype parameters are whitespace-separated identifiers; the comma
    /// is call-site syntax only.
    pub fn parse_prototype(&mut self) -> Option<Prototype> {
        let (name, operator_arity, precedence) = match self.current().clone() {
            Token::Ident(name) => {
                self.bump();
                (name, 0, DEFAULT_OPERATOR_PRECEDENCE)
            }
            Token::Unary => {
                self.bump();
                let op = self.expect_operator_char()?;
                (format!("unary{}", op), 1, DEFAULT_OPERATOR_PRECEDENCE)
            }
            Token::Binary => {
                self.bump();
                let op = self.expect_operator_char()?;
                let mut precedence = DEFAULT_OPERATOR_PRECEDENCE;
                if let Token::Number(n) = *self.current() {
                    if !(1.0..=100.0).contains(&n) {
                        return self.err("Invalid precedence: must be 1..100");
                    }
                    precedence = n as i32;
                    self.bump();
                }
                (format!("binary{}", op), 2, precedence)
            }
            _ => return self.err("Panotarisirwa zita re 'basa'"),
        };

        self.expect_raw('(', "Panotarisirwa '('")?;

        let mut args = Vec::new();
        while let Token::Ident(arg) = self.current() {
            args.push(arg.clone());
            self.bump();
        }

        self.expect_raw(')', "Panotarisirwa ')'")?;

        if operator_arity != 0 && args.len() != operator_arity {
            return self.err("Invalid number of operands for operator");
        }

        if operator_arity != 0 {
            Some(Prototype::operator(name, args, precedence))
        } else {
            Some(Prototype::new(name, args))
        }
    }

    /// A single raw ASCII character naming a user-defined operator.
    fn expect_operator_char(&mut self) -> Option<char> {
        match self.current().raw() {
            Some(c) if c.is_ascii() => {
                self.bump();
                Some(c)
            }
            _ => self.err("Panotarisirwa operator"),
        }
    }

    /// `basa prototype { stmts }`
    pub fn parse_definition(&mut self, prec: &PrecedenceTable) -> Option<Function> {
        self.bump();

        if !matches!(
            self.current(),
            Token::Ident(_) | Token::Unary | Token::Binary
        ) {
            return self.err("Panotarisirwa zita re basa mushure me 'basa'");
        }

        let proto = self.parse_prototype()?;
        let body = self.parse_brace_body(prec, "basa")?;

        Some(Function::new(proto, body))
    }

    /// `extern prototype`
    pub fn parse_extern(&mut self) -> Option<Prototype> {
        self.bump();
        self.parse_prototype()
    }

    /// `kirasi Name { (basa method | zitaGuru member)* }`
    pub fn parse_class(&mut self, prec: &PrecedenceTable) -> Option<Class> {
        self.bump();

        let Token::Ident(name) = self.current() else {
            return self.err("Panotarisirwa zita rekirasi mushure me 'kirasi'");
        };
        let name = name.clone();
        self.bump();

        self.expect_raw('{', "Panotarisirwa '{' mushure me zita rekirasi")?;

        let mut methods = Vec::new();
        let mut members = Vec::new();

        while *self.current() != Token::Raw('}') && *self.current() != Token::Eof {
            match self.current() {
                Token::Def => {
                    methods.push(self.parse_definition(prec)?);
                }
                Token::GlobalVar => {
                    self.bump();

                    let Token::Ident(member) = self.current() else {
                        return self.err("Panotarisirwa zita mushure me 'zitaGuru'");
                    };
                    let member = member.clone();
                    self.bump();

                    let init = if *self.current() == Token::Raw('=') {
                        self.bump();
                        Some(self.parse_expression(prec)?)
                    } else {
                        None
                    };

                    members.push((member, init));
                }
                _ => return self.err("Panotarisirwa 'basa' kana 'zitaGuru' mukati mekirasi"),
            }
        }

        self.expect_raw('}', "Panotarisirwa '}' pakupera kwekirasi")?;

        Some(Class {
            name,
            methods,
            members,
        })
    }

    /// Wraps a bare top-level expression into an anonymous nullary function
    /// named `__anon_expr<N>`.
    pub fn parse_toplevel_expr(&mut self, prec: &PrecedenceTable) -> Option<Function> {
        let expr = self.parse_expression(prec)?;
        let name = self.next_anon_name();
        Some(Function::new(Prototype::new(name, Vec::new()), vec![expr]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::{default_precedence, ToplevelItem};
    use shonac_util::Handler;

    fn parse_items(source: &str) -> Vec<ToplevelItem> {
        let handler = Handler::silent();
        let prec = default_precedence();
        let mut parser = Parser::new(source, &handler);
        let mut items = Vec::new();
        loop {
            match parser.parse_toplevel(&prec) {
                ToplevelItem::Eof => break,
                item => items.push(item),
            }
        }
        items
    }

    #[test]
    fn test_parse_definition() {
        let items = parse_items("basa fib(n) { kana (n < 2) { dzosa n } }");
        assert_eq!(items.len(), 1);
        let ToplevelItem::Definition(func) = &items[0] else {
            panic!("expected definition, got {:?}", items[0]);
        };
        assert_eq!(func.proto.name, "fib");
        assert_eq!(func.proto.args, vec!["n".to_string()]);
        assert!(!func.proto.is_operator);
        assert_eq!(func.body.len(), 1);
    }

    #[test]
    fn test_parse_definition_multiple_params() {
        let items = parse_items("basa add(a b) { a + b }");
        let ToplevelItem::Definition(func) = &items[0] else {
            panic!("expected definition");
        };
        assert_eq!(func.proto.args, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_binary_operator_definition() {
        let items = parse_items("basa binary : 1 (a b) { b }");
        let ToplevelItem::Definition(func) = &items[0] else {
            panic!("expected definition");
        };
        assert_eq!(func.proto.name, "binary:");
        assert!(func.proto.is_binary_op());
        assert_eq!(func.proto.precedence, 1);
        assert_eq!(func.proto.operator_char(), Some(':'));
    }

    #[test]
    fn test_parse_binary_operator_default_precedence() {
        let items = parse_items("basa binary | (a b) { a + b }");
        let ToplevelItem::Definition(func) = &items[0] else {
            panic!("expected definition");
        };
        assert_eq!(func.proto.precedence, 30);
    }

    #[test]
    fn test_parse_unary_operator_definition() {
        let items = parse_items("basa unary ! (v) { kana (v) { 0 } kanaKuti { 1 } }");
        let ToplevelItem::Definition(func) = &items[0] else {
            panic!("expected definition");
        };
        assert_eq!(func.proto.name, "unary!");
        assert!(func.proto.is_unary_op());
    }

    #[test]
    fn test_operator_arity_mismatch_is_error() {
        let items = parse_items("basa binary : 1 (a) { a }");
        assert!(matches!(items[0], ToplevelItem::Skipped));
    }

    #[test]
    fn test_invalid_precedence_is_error() {
        let items = parse_items("basa binary : 500 (a b) { a }");
        assert!(matches!(items[0], ToplevelItem::Skipped));
    }

    #[test]
    fn test_parse_extern() {
        let items = parse_items("extern cosi(angle)");
        let ToplevelItem::Extern(proto) = &items[0] else {
            panic!("expected extern, got {:?}", items[0]);
        };
        assert_eq!(proto.name, "cosi");
        assert_eq!(proto.args, vec!["angle".to_string()]);
    }

    #[test]
    fn test_parse_class() {
        let items =
            parse_items("kirasi Point { zitaGuru x = 0 basa dist(v) { dzosa v * v } }");
        let ToplevelItem::Class(class) = &items[0] else {
            panic!("expected class, got {:?}", items[0]);
        };
        assert_eq!(class.name, "Point");
        assert_eq!(class.members.len(), 1);
        assert_eq!(class.members[0].0, "x");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].proto.name, "dist");
    }

    #[test]
    fn test_parse_class_rejects_other_items() {
        let items = parse_items("kirasi P { extern f(x) }");
        assert!(matches!(items[0], ToplevelItem::Skipped));
    }

    #[test]
    fn test_parse_global_var_toplevel() {
        let items = parse_items("zitaGuru counter = 0");
        let ToplevelItem::Globals(bindings) = &items[0] else {
            panic!("expected globals, got {:?}", items[0]);
        };
        assert_eq!(
            bindings,
            &vec![("counter".to_string(), Some(Expr::Number(0.0)))]
        );
    }

    #[test]
    fn test_anonymous_expression_names_increase() {
        let items = parse_items("1 + 1\n2 + 2");
        let names: Vec<_> = items
            .iter()
            .map(|item| match item {
                ToplevelItem::Expression(func) => func.proto.name.clone(),
                other => panic!("expected expression, got {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["__anon_expr0", "__anon_expr1"]);
    }

    #[test]
    fn test_anonymous_expression_is_nullary() {
        let items = parse_items("fib(10)");
        let ToplevelItem::Expression(func) = &items[0] else {
            panic!("expected expression");
        };
        assert!(func.proto.args.is_empty());
        assert_eq!(func.body.len(), 1);
    }

    #[test]
    fn test_semicolon_skipped_at_toplevel() {
        let items = parse_items(";;1");
        assert!(matches!(items[0], ToplevelItem::Skipped));
        assert!(matches!(items[1], ToplevelItem::Skipped));
        assert!(matches!(items[2], ToplevelItem::Expression(_)));
    }

    #[test]
    fn test_error_recovery_skips_one_token() {
        // "basa 1" fails; recovery skips one token (the number), and the
        // following expression still parses.
        let items = parse_items("basa 1 2 + 2");
        assert!(matches!(items[0], ToplevelItem::Skipped));
        assert!(items
            .iter()
            .any(|item| matches!(item, ToplevelItem::Expression(_))));
    }
}
