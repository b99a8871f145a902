//! Expression parsing.
//!
//! `expression := unary (binop unary)*` with precedence climbing; see the
//! crate docs for the recovery policy.

use shonac_lex::Token;

use crate::ast::Expr;
use crate::{Parser, PrecedenceTable};

impl<'a> Parser<'a> {
    /// Parses a full expression and consumes any trailing `;`.
    pub fn parse_expression(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        let lhs = self.parse_unary(prec)?;
        let result = self.parse_binop_rhs(prec, 0, lhs)?;

        while *self.current() == Token::Semicolon {
            self.bump();
        }

        Some(result)
    }

    /// `unary := primary | op unary` for raw ASCII punctuation other than
    /// `(` and `,`.
    fn parse_unary(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        match self.current().raw() {
            Some(op) if op.is_ascii() && op != '(' && op != ',' => {
                self.bump();
                let operand = self.parse_unary(prec)?;
                Some(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_primary(prec),
        }
    }

    /// Folds `(binop unary)*` onto `lhs`, binding ties to the left.
    fn parse_binop_rhs(
        &mut self,
        prec: &PrecedenceTable,
        expr_prec: i32,
        mut lhs: Expr,
    ) -> Option<Expr> {
        loop {
            let tok_prec = self.tok_precedence(prec);
            if tok_prec < expr_prec {
                return Some(lhs);
            }

            // tok_precedence only reports >= 0 for raw tokens.
            let Some(op) = self.current().raw() else {
                return Some(lhs);
            };
            self.bump();

            let mut rhs = self.parse_unary(prec)?;

            // A tighter operator on the right takes the rhs as its lhs.
            let next_prec = self.tok_precedence(prec);
            if tok_prec < next_prec {
                rhs = self.parse_binop_rhs(prec, tok_prec + 1, rhs)?;
            }

            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_primary(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        match self.current() {
            Token::Ident(_) => self.parse_identifier_expr(prec),
            Token::Number(value) => {
                let value = *value;
                self.bump();
                Some(Expr::Number(value))
            }
            Token::Str(text) => {
                let text = text.clone();
                self.bump();
                Some(Expr::Str(text))
            }
            Token::Raw('(') => self.parse_paren_expr(prec),
            Token::If => self.parse_if(prec),
            Token::For => self.parse_for(prec),
            Token::Var => self.parse_var(prec),
            Token::GlobalVar => {
                let bindings = self.parse_global_var(prec)?;
                Some(Expr::GlobalVar { bindings })
            }
            Token::Return => self.parse_return(prec),
            Token::While => self.parse_while(prec),
            _ => self.err("Paita izwi risiri kuzivikanwa"),
        }
    }

    /// `( expression )`
    fn parse_paren_expr(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();
        let inner = self.parse_expression(prec)?;
        self.expect_raw(')', "Panotarisirwa ')'")?;
        Some(inner)
    }

    /// Identifier, `name.member`, call, or method call.
    fn parse_identifier_expr(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        let Token::Ident(name) = self.current() else {
            return self.err("Panotarisirwa zita");
        };
        let mut name = name.clone();
        self.bump();

        if *self.current() == Token::Dot {
            self.bump();
            let Token::Ident(member) = self.current() else {
                return self.err("Panotarisirwa zita mushure me '.'");
            };
            name = format!("{}.{}", name, member);
            self.bump();
        }

        if *self.current() != Token::Raw('(') {
            return Some(Expr::Variable(name));
        }

        let args = self.parse_call_args(prec)?;
        Some(Expr::Call { callee: name, args })
    }

    /// `( expr (, expr)* )`, current token is `(`.
    fn parse_call_args(&mut self, prec: &PrecedenceTable) -> Option<Vec<Expr>> {
        self.bump();
        let mut args = Vec::new();

        if *self.current() != Token::Raw(')') {
            loop {
                args.push(self.parse_expression(prec)?);

                if *self.current() == Token::Raw(')') {
                    break;
                }
                if *self.current() != Token::Raw(',') {
                    return self.err("Panotarisirwa ',' kana ')' mu rondedzero yema argument");
                }
                self.bump();
            }
        }

        self.bump();
        Some(args)
    }

    /// `kana ( cond ) { then } [kanaKuti { else }]`
    fn parse_if(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();

        self.expect_raw('(', "Panotarisirwa '(' mushure me 'kana'")?;
        let cond = self.parse_expression(prec)?;
        self.expect_raw(')', "Panotarisirwa ')' mushure me condition ya 'kana'")?;

        let then_body = self.parse_brace_body(prec, "kana")?;

        let else_body = if *self.current() == Token::Else {
            self.bump();
            self.parse_brace_body(prec, "kanaKuti")?
        } else {
            Vec::new()
        };

        Some(Expr::If {
            cond: Box::new(cond),
            then_body,
            else_body,
        })
    }

    /// `kusvika ( cond ) { body }`
    fn parse_while(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();

        self.expect_raw('(', "Panotarisirwa '(' mushure me 'kusvika'")?;
        let cond = self.parse_expression(prec)?;
        self.expect_raw(')', "Panotarisirwa ')' mushure me condition ya 'kusvika'")?;

        let body = self.parse_brace_body(prec, "kusvika")?;

        Some(Expr::While {
            cond: Box::new(cond),
            body,
        })
    }

    /// `pakati ( var = start , end [ , step ] ) { body }`
    fn parse_for(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();

        self.expect_raw('(', "Panotarisirwa '(' mushure me 'pakati'")?;

        let Token::Ident(var) = self.current() else {
            return self.err("Panotarisirwa zita mukati me 'pakati ()'");
        };
        let var = var.clone();
        self.bump();

        self.expect_raw('=', "Panotarisirwa '=' mushure me zita mu 'pakati ()'")?;
        let start = self.parse_expression(prec)?;

        self.expect_raw(',', "Panotarisirwa ',' mushure me kukosha kwekutanga mu 'pakati ()'")?;
        let end = self.parse_expression(prec)?;

        let step = if *self.current() == Token::Raw(',') {
            self.bump();
            Some(Box::new(self.parse_expression(prec)?))
        } else {
            None
        };

        self.expect_raw(')', "Panotarisirwa ')' mu 'pakati ()'")?;

        let body = self.parse_brace_body(prec, "pakati")?;

        Some(Expr::For {
            var,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body: Box::new(Expr::Block(body)),
        })
    }

    /// `zita name [= expr] (, name [= expr])* mu expression`
    fn parse_var(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();

        if !matches!(self.current(), Token::Ident(_)) {
            return self.err("Panotarisirwa zita remusiyano mushure me 'zita'");
        }

        let bindings = self.parse_bindings(prec)?;

        if *self.current() != Token::In {
            return self.err("Panotarisirwa 'mu' mushure me 'zita'");
        }
        self.bump();

        let body = self.parse_expression(prec)?;

        Some(Expr::Var {
            bindings,
            body: Box::new(body),
        })
    }

    /// `zitaGuru name [= expr] (, name [= expr])*` — no body.
    pub(crate) fn parse_global_var(
        &mut self,
        prec: &PrecedenceTable,
    ) -> Option<Vec<(String, Option<Expr>)>> {
        self.bump();

        if !matches!(self.current(), Token::Ident(_)) {
            return self.err("Panotarisirwa zita remusiyano mushure me 'zitaGuru'");
        }

        self.parse_bindings(prec)
    }

    /// `name [= expr] (, name [= expr])*` — the current token is an Ident.
    fn parse_bindings(&mut self, prec: &PrecedenceTable) -> Option<Vec<(String, Option<Expr>)>> {
        let mut bindings = Vec::new();

        loop {
            let Token::Ident(name) = self.current() else {
                return self.err("Panotarisirwa zita remusiyano mushure me comma");
            };
            let name = name.clone();
            self.bump();

            let init = if *self.current() == Token::Raw('=') {
                self.bump();
                Some(self.parse_expression(prec)?)
            } else {
                None
            };

            bindings.push((name, init));

            if *self.current() != Token::Raw(',') {
                break;
            }
            self.bump();
        }

        Some(bindings)
    }

    /// `dzosa expression`
    fn parse_return(&mut self, prec: &PrecedenceTable) -> Option<Expr> {
        self.bump();
        let value = self.parse_expression(prec)?;
        Some(Expr::Return(Box::new(value)))
    }

    /// `{ stmts }` with optional `;` separators.
    pub(crate) fn parse_brace_body(
        &mut self,
        prec: &PrecedenceTable,
        form: &str,
    ) -> Option<Vec<Expr>> {
        if *self.current() != Token::Raw('{') {
            return self.err(format!("Panotarisirwa '{{' kutanga muviri we '{}'", form));
        }
        self.bump();

        let mut stmts = Vec::new();
        while *self.current() != Token::Raw('}') && *self.current() != Token::Eof {
            stmts.push(self.parse_expression(prec)?);
        }

        if *self.current() != Token::Raw('}') {
            return self.err(format!("Panotarisirwa '}}' kupedza muviri we '{}'", form));
        }
        self.bump();

        Some(stmts)
    }
}
