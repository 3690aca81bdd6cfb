//! Statement-level parsing: declarations, control flow, blocks.

use kata_lexer::token::TokenKind;
use kata_types::ast::*;
use kata_types::ErrorCode;

use crate::parser::Parser;

impl Parser<'_> {
    /// Parse the whole token stream into a program.
    pub(crate) fn parse_program(&mut self) -> Option<Program> {
        let start = self.current_span();
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                return None;
            }
            // Stray semicolons between statements are fine.
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => start,
        };
        Some(Program { stmts, span })
    }

    /// Parse a single statement.
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Function => self.parse_function_decl(false),
            TokenKind::Async if matches!(self.look_ahead(1), TokenKind::Function) => {
                self.advance();
                self.parse_function_decl(true)
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.eat(&TokenKind::Semicolon);
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.eat(&TokenKind::Semicolon);
                Some(Stmt::Continue(span))
            }
            // A `{` in statement position opens a block, not an object.
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            _ => {
                let stmt = self.parse_expr_or_assign()?;
                self.eat(&TokenKind::Semicolon);
                Some(stmt)
            }
        }
    }

    /// `function name(params) { ... }`
    fn parse_function_decl(&mut self, is_async: bool) -> Option<Stmt> {
        let start = self.advance().span; // `function`
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(Stmt::FunctionDecl(FunctionDecl {
            func: FunctionExpr {
                name: Some(name.name.clone()),
                params,
                body: FunctionBody::Block(body),
                is_async,
                span,
            },
            name,
            span,
        }))
    }

    /// `(a, b = 1, ...rest)`
    pub(crate) fn parse_params(&mut self) -> Option<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let rest = self.eat(&TokenKind::Ellipsis);
            let name = self.expect_identifier()?;
            let default = if !rest && self.eat(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name,
                default,
                rest,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    /// `const a = 1, b = 2;`
    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        let kind = match keyword.kind {
            TokenKind::Const => DeclKind::Const,
            TokenKind::Let => DeclKind::Let,
            _ => DeclKind::Var,
        };
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            let span = match &init {
                Some(expr) => name.span.merge(expr.span),
                None => name.span,
            };
            declarators.push(Declarator { name, init, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.eat(&TokenKind::Semicolon);
        let span = keyword.span.merge(self.previous_span());
        Some(Stmt::VarDecl(VarDecl {
            kind,
            declarators,
            span,
        }))
    }

    /// `if (cond) { ... } else if ... else { ... }`
    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.advance().span; // `if`
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_block = self.parse_body()?;
        let mut span = start.merge(then_block.span);

        let else_branch = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let nested = self.parse_if()?;
                span = span.merge(nested.span);
                Some(ElseBranch::ElseIf(Box::new(nested)))
            } else {
                let block = self.parse_body()?;
                span = span.merge(block.span);
                Some(ElseBranch::Block(block))
            }
        } else {
            None
        };

        Some(IfStmt {
            cond,
            then_block,
            else_branch,
            span,
        })
    }

    /// `while (cond) { ... }`
    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // `while`
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_body()?;
        let span = start.merge(body.span);
        Some(Stmt::While(WhileStmt { cond, body, span }))
    }

    /// `for (init; cond; update)`, `for (const x of xs)`, `for (const k in obj)`.
    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // `for`
        self.expect(&TokenKind::LParen)?;

        // `for (const x of ...)` / `for (const k in ...)`
        if matches!(
            self.peek_kind(),
            TokenKind::Const | TokenKind::Let | TokenKind::Var
        ) && matches!(self.look_ahead(1), TokenKind::Identifier(_))
            && matches!(self.look_ahead(2), TokenKind::Of | TokenKind::In)
        {
            let decl_kind = match self.advance().kind {
                TokenKind::Const => DeclKind::Const,
                TokenKind::Let => DeclKind::Let,
                _ => DeclKind::Var,
            };
            let binding = self.expect_identifier()?;
            let is_of = matches!(self.advance().kind, TokenKind::Of);
            let iterable = self.parse_expr()?;
            self.expect(&TokenKind::RParen)?;
            let body = self.parse_body()?;
            let span = start.merge(body.span);
            let stmt = ForOfStmt {
                decl_kind,
                binding,
                iterable,
                body,
                span,
            };
            return Some(if is_of {
                Stmt::ForOf(stmt)
            } else {
                Stmt::ForIn(stmt)
            });
        }

        // C-style three-clause loop.
        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else {
            let stmt = if matches!(
                self.peek_kind(),
                TokenKind::Const | TokenKind::Let | TokenKind::Var
            ) {
                self.parse_var_decl()?
            } else {
                let stmt = self.parse_expr_or_assign()?;
                self.expect(&TokenKind::Semicolon)?;
                stmt
            };
            Some(Box::new(stmt))
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expr_or_assign()?))
        };
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_body()?;
        let span = start.merge(body.span);
        Some(Stmt::For(ForStmt {
            init,
            cond,
            update,
            body,
            span,
        }))
    }

    /// `return;` / `return expr;`
    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // `return`
        let value = if matches!(
            self.peek_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.eat(&TokenKind::Semicolon);
        let span = match &value {
            Some(expr) => start.merge(expr.span),
            None => start,
        };
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `throw expr;`
    fn parse_throw(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // `throw`
        let value = self.parse_expr()?;
        self.eat(&TokenKind::Semicolon);
        let span = start.merge(value.span);
        Some(Stmt::Throw(ThrowStmt { value, span }))
    }

    /// `try { ... } catch (e) { ... } finally { ... }`
    fn parse_try(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // `try`
        let try_block = self.parse_block()?;

        let (catch_param, catch_block) = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LParen) {
                let ident = self.expect_identifier()?;
                self.expect(&TokenKind::RParen)?;
                Some(ident)
            } else {
                None
            };
            (param, Some(self.parse_block()?))
        } else {
            (None, None)
        };

        let finally_block = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catch_block.is_none() && finally_block.is_none() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "expected 'catch' or 'finally' after try block",
            );
            return None;
        }

        let end = finally_block
            .as_ref()
            .or(catch_block.as_ref())
            .map(|b| b.span)
            .unwrap_or(try_block.span);
        let span = start.merge(end);
        Some(Stmt::Try(TryStmt {
            try_block,
            catch_param,
            catch_block,
            finally_block,
            span,
        }))
    }

    /// A braced block: `{ stmt* }`.
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let open = self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                return None;
            }
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        let close = self.expect(&TokenKind::RBrace)?;
        Some(Block {
            stmts,
            span: open.span.merge(close.span),
        })
    }

    /// Control-flow body: a braced block, or a single unbraced
    /// statement wrapped in one.
    fn parse_body(&mut self) -> Option<Block> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_block();
        }
        let stmt = self.parse_stmt()?;
        let span = stmt.span();
        Some(Block {
            stmts: vec![stmt],
            span,
        })
    }

    /// An expression statement, promoted to an assignment when an
    /// assignment operator follows. Does not consume the trailing
    /// semicolon; callers decide whether one is required.
    pub(crate) fn parse_expr_or_assign(&mut self) -> Option<Stmt> {
        let target = self.parse_expr()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            _ => None,
        };

        match op {
            Some(op) => {
                if !matches!(
                    target.kind,
                    ExprKind::Identifier(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
                ) {
                    self.error_at(
                        ErrorCode::INVALID_ASSIGNMENT_TARGET,
                        "invalid assignment target",
                        target.span,
                    );
                    return None;
                }
                self.advance();
                let value = self.parse_expr()?;
                let span = target.span.merge(value.span);
                Some(Stmt::Assign(AssignStmt {
                    target,
                    op,
                    value,
                    span,
                }))
            }
            None => {
                let span = target.span;
                Some(Stmt::Expr(ExprStmt { expr: target, span }))
            }
        }
    }
}
