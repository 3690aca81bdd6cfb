//! Expression parsing: a precedence chain from ternary down to primary.

use kata_lexer::token::TokenKind;
use kata_types::ast::*;
use kata_types::ErrorCode;

use crate::parser::{Parser, MAX_EXPR_DEPTH};

impl Parser<'_> {
    /// Entry point for expressions. Guarded against pathological
    /// nesting so untrusted input cannot exhaust the host stack.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.expr_depth -= 1;
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "expression nesting too deep");
            return None;
        }
        let result = self.parse_ternary();
        self.expr_depth -= 1;
        result
    }

    /// `cond ? a : b`
    fn parse_ternary(&mut self) -> Option<Expr> {
        let cond = self.parse_coalesce()?;
        if !self.eat(&TokenKind::Question) {
            return Some(cond);
        }
        let then_expr = self.parse_expr()?;
        self.expect(&TokenKind::Colon)?;
        let else_expr = self.parse_ternary()?;
        let span = cond.span.merge(else_expr.span);
        Some(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn parse_coalesce(&mut self) -> Option<Expr> {
        self.parse_binary_level(&[(TokenKind::QuestionQuestion, BinOp::Coalesce)], Self::parse_or)
    }

    fn parse_or(&mut self) -> Option<Expr> {
        self.parse_binary_level(&[(TokenKind::PipePipe, BinOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        self.parse_binary_level(&[(TokenKind::AmpAmp, BinOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::EqEqEq, BinOp::StrictEq),
                (TokenKind::EqEq, BinOp::Eq),
                (TokenKind::BangEqEq, BinOp::StrictNotEq),
                (TokenKind::BangEq, BinOp::NotEq),
            ],
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::LtEq, BinOp::LessEq),
                (TokenKind::GtEq, BinOp::GreaterEq),
                (TokenKind::Lt, BinOp::Less),
                (TokenKind::Gt, BinOp::Greater),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::Plus, BinOp::Add),
                (TokenKind::Minus, BinOp::Sub),
            ],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinOp::Mul),
                (TokenKind::Slash, BinOp::Div),
                (TokenKind::Percent, BinOp::Mod),
            ],
            Self::parse_exponent,
        )
    }

    /// `**` is right-associative.
    fn parse_exponent(&mut self) -> Option<Expr> {
        let base = self.parse_unary()?;
        if !self.eat(&TokenKind::StarStar) {
            return Some(base);
        }
        let exp = self.parse_exponent()?;
        let span = base.span.merge(exp.span);
        Some(Expr::new(
            ExprKind::Binary {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exp),
            },
            span,
        ))
    }

    /// Left-associative binary operator tier.
    fn parse_binary_level(
        &mut self,
        ops: &[(TokenKind, BinOp)],
        next: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    let right = next(self)?;
                    let span = left.span.merge(right.span);
                    left = Expr::new(
                        ExprKind::Binary {
                            left: Box::new(left),
                            op: *op,
                            right: Box::new(right),
                        },
                        span,
                    );
                    continue 'outer;
                }
            }
            return Some(left);
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Typeof => Some(UnaryOp::TypeOf),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        match self.peek_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let token = self.advance();
                let op = if matches!(token.kind, TokenKind::PlusPlus) {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                let target = self.parse_unary()?;
                let span = token.span.merge(target.span);
                Some(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    span,
                ))
            }
            TokenKind::Await => {
                let start = self.advance().span;
                let operand = self.parse_unary()?;
                let span = start.merge(operand.span);
                Some(Expr::new(ExprKind::Await(Box::new(operand)), span))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_call_chain()?;
        while matches!(
            self.peek_kind(),
            TokenKind::PlusPlus | TokenKind::MinusMinus
        ) {
            let token = self.advance();
            let op = if matches!(token.kind, TokenKind::PlusPlus) {
                UpdateOp::Inc
            } else {
                UpdateOp::Dec
            };
            let span = expr.span.merge(token.span);
            expr = Expr::new(
                ExprKind::Update {
                    op,
                    prefix: false,
                    target: Box::new(expr),
                },
                span,
            );
        }
        Some(expr)
    }

    /// Member access, indexing, and calls: `a.b[c](d).e`.
    fn parse_call_chain(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_property_name()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let close = self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(close.span);
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    let args = self.parse_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => return Some(expr),
            }
        }
    }

    /// `(a, ...b)` call arguments.
    fn parse_args(&mut self) -> Option<Vec<Arg>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            if self.eat(&TokenKind::Ellipsis) {
                args.push(Arg::Spread(self.parse_expr()?));
            } else {
                args.push(Arg::Item(self.parse_expr()?));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::NumberLit(n), span))
            }
            TokenKind::StringLit(s) => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::StringLit(s), span))
            }
            TokenKind::True => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::BoolLit(true), span))
            }
            TokenKind::False => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::BoolLit(false), span))
            }
            TokenKind::Null => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::NullLit, span))
            }
            TokenKind::Undefined => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::UndefinedLit, span))
            }
            TokenKind::TemplateStart(_) => self.parse_template(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expr(false),
            TokenKind::Async => match self.look_ahead(1) {
                TokenKind::Function => {
                    self.advance();
                    self.parse_function_expr(true)
                }
                TokenKind::Identifier(_) if matches!(self.look_ahead(2), TokenKind::FatArrow) => {
                    self.advance();
                    self.parse_arrow(true)
                }
                TokenKind::LParen => {
                    self.advance();
                    self.parse_arrow(true)
                }
                _ => {
                    self.error_at_current(
                        ErrorCode::EXPECTED_EXPRESSION,
                        "expected function after 'async'",
                    );
                    None
                }
            },
            TokenKind::New => self.parse_new(),
            TokenKind::Identifier(name) => {
                if matches!(self.look_ahead(1), TokenKind::FatArrow) {
                    return self.parse_arrow(false);
                }
                let span = self.advance().span;
                Some(Expr::new(
                    ExprKind::Identifier(Ident::new(name, span)),
                    span,
                ))
            }
            TokenKind::LParen => {
                // `(a, b) => ...` vs parenthesized expression.
                let is_arrow = self
                    .matching_paren_offset(0)
                    .is_some_and(|close| matches!(self.look_ahead(close + 1), TokenKind::FatArrow));
                if is_arrow {
                    return self.parse_arrow(false);
                }
                let open = self.advance().span;
                let inner = self.parse_expr()?;
                let close = self.expect(&TokenKind::RParen)?;
                let span = open.merge(close.span);
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::EXPECTED_EXPRESSION,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// `function [name](params) { ... }` in expression position.
    fn parse_function_expr(&mut self, is_async: bool) -> Option<Expr> {
        let start = self.advance().span; // `function`
        let name = match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(Expr::new(
            ExprKind::Function(Box::new(FunctionExpr {
                name,
                params,
                body: FunctionBody::Block(body),
                is_async,
                span,
            })),
            span,
        ))
    }

    /// `x => ...` or `(a, b = 1) => ...`, optionally async.
    fn parse_arrow(&mut self, is_async: bool) -> Option<Expr> {
        let start = self.current_span();
        let params = if self.check(&TokenKind::LParen) {
            self.parse_params()?
        } else {
            let name = self.expect_identifier()?;
            vec![Param {
                name,
                default: None,
                rest: false,
            }]
        };
        self.expect(&TokenKind::FatArrow)?;
        let (body, end) = if self.check(&TokenKind::LBrace) {
            let block = self.parse_block()?;
            let span = block.span;
            (FunctionBody::Block(block), span)
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span;
            (FunctionBody::Expr(Box::new(expr)), span)
        };
        let span = start.merge(end);
        Some(Expr::new(
            ExprKind::Function(Box::new(FunctionExpr {
                name: None,
                params,
                body,
                is_async,
                span,
            })),
            span,
        ))
    }

    /// `new Name(args)`.
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.advance().span; // `new`
        let callee = self.expect_identifier()?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) && !self.at_end() {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::New { callee, args }, span))
    }

    /// `[a, ...b, c]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let open = self.advance().span; // `[`
        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.at_end() {
            if self.eat(&TokenKind::Ellipsis) {
                elems.push(ArrayElem::Spread(self.parse_expr()?));
            } else {
                elems.push(ArrayElem::Item(self.parse_expr()?));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(
            ExprKind::ArrayLit(elems),
            open.merge(close.span),
        ))
    }

    /// `{ key: value, shorthand, "str": v, ...rest }`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let open = self.advance().span; // `{`
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.eat(&TokenKind::Ellipsis) {
                entries.push(ObjectEntry::Spread(self.parse_expr()?));
            } else {
                let key_kind = self.peek_kind().clone();
                let key = match &key_kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        name
                    }
                    TokenKind::StringLit(s) => {
                        let s = s.clone();
                        self.advance();
                        s
                    }
                    TokenKind::NumberLit(n) => {
                        let key = format_number_key(*n);
                        self.advance();
                        key
                    }
                    _ => match key_kind.keyword_word() {
                        Some(word) => {
                            self.advance();
                            word.to_string()
                        }
                        None => {
                            self.error_at_current(
                                ErrorCode::UNEXPECTED_TOKEN,
                                format!("expected property key, got '{}'", self.peek_kind()),
                            );
                            return None;
                        }
                    },
                };
                if self.eat(&TokenKind::Colon) {
                    let value = self.parse_expr()?;
                    entries.push(ObjectEntry::Field { key, value });
                } else if matches!(key_kind, TokenKind::Identifier(_)) {
                    entries.push(ObjectEntry::Shorthand(Ident::new(key, self.previous_span())));
                } else {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "expected ':' after property key",
                    );
                    return None;
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RBrace)?;
        Some(Expr::new(
            ExprKind::ObjectLit(entries),
            open.merge(close.span),
        ))
    }

    /// An interpolated template literal. The lexer has already split
    /// it into literal chunks and `${` / `}` markers.
    fn parse_template(&mut self) -> Option<Expr> {
        let start_token = self.advance();
        let open = start_token.span;
        let mut parts = Vec::new();
        if let TokenKind::TemplateStart(text) = start_token.kind {
            if !text.is_empty() {
                parts.push(TemplatePart::Literal(text));
            }
        }
        loop {
            self.expect(&TokenKind::InterpolationStart)?;
            parts.push(TemplatePart::Expr(self.parse_expr()?));
            self.expect(&TokenKind::InterpolationEnd)?;
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(text) => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                }
                TokenKind::TemplateEnd(text) => {
                    let close = self.advance().span;
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                    return Some(Expr::new(ExprKind::TemplateLit(parts), open.merge(close)));
                }
                _ => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected template text, got '{}'", self.peek_kind()),
                    );
                    return None;
                }
            }
        }
    }
}

/// Numeric object keys stringify the way the runtime prints numbers.
fn format_number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
