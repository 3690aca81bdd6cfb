//! Static scan for top-level function-like bindings.
//!
//! A lexical pattern match over the token stream, not a parse: it only
//! needs to find the names a snippet plausibly exports as exercise
//! entry points. Names come back in source order with duplicates
//! collapsed to their first occurrence.

use kata_lexer::token::{Token, TokenKind};
use kata_lexer::Lexer;
use kata_types::SourceFile;

use crate::scan::{is_function_valued, skip_type};
use crate::strip::transpile;

/// Scan `source` for top-level function-like bindings.
///
/// Recognizes named `function` statements (plain and `async`),
/// `const`/`let`/`var`-bound arrow functions and function expressions,
/// and shorthand method-style bindings (`name: (...) => ...`).
///
/// Runs over the type-erased form of the snippet when it transpiles
/// cleanly, so annotation syntax never produces phantom names; raw
/// tokens are scanned as a best effort otherwise.
pub fn extract_function_names(source: &str) -> Vec<String> {
    let stripped;
    let scanned = match transpile(source) {
        Ok(out) => {
            stripped = out;
            &stripped
        }
        Err(_) => source,
    };
    let sf = SourceFile::snippet(scanned);
    let lexed = Lexer::new(&sf).lex();
    scan_names(&lexed.tokens)
}

fn scan_names(tokens: &[Token]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let push = |names: &mut Vec<String>, name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::Eof => break,

            // `function name(...)` / `async function name(...)` in
            // statement position. Function expressions on the right of
            // an `=` are claimed by the declaration branch below.
            TokenKind::Function => {
                let head = if matches!(prev_kind(tokens, i), Some(TokenKind::Async)) {
                    i - 1
                } else {
                    i
                };
                if statement_position(tokens, head) {
                    if let Some(TokenKind::Identifier(name)) = kind_at(tokens, i + 1) {
                        push(&mut names, name);
                    }
                }
                i += 1;
            }

            // `const name [: type] = <function-valued>`
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                if let Some(TokenKind::Identifier(name)) = kind_at(tokens, i + 1) {
                    let mut j = i + 2;
                    if matches!(kind_at(tokens, j), Some(TokenKind::Colon)) {
                        match skip_type(tokens, j + 1) {
                            Some(after) => j = after,
                            None => {
                                i += 1;
                                continue;
                            }
                        }
                    }
                    if matches!(kind_at(tokens, j), Some(TokenKind::Eq))
                        && is_function_valued(tokens, j + 1)
                    {
                        push(&mut names, name);
                    }
                }
                i += 1;
            }

            // Object-literal shorthand: `{ name: (...) => ..., ... }`
            TokenKind::Identifier(name)
                if matches!(kind_at(tokens, i + 1), Some(TokenKind::Colon))
                    && matches!(
                        prev_kind(tokens, i),
                        Some(TokenKind::LBrace | TokenKind::Comma)
                    )
                    && is_function_valued(tokens, i + 2) =>
            {
                push(&mut names, name);
                i += 1;
            }

            _ => i += 1,
        }
    }
    names
}

fn kind_at(tokens: &[Token], i: usize) -> Option<&TokenKind> {
    tokens.get(i).map(|t| &t.kind)
}

fn prev_kind(tokens: &[Token], i: usize) -> Option<&TokenKind> {
    i.checked_sub(1).and_then(|p| tokens.get(p)).map(|t| &t.kind)
}

/// A `function` keyword introduces a declaration only when it opens a
/// statement, not when it appears as an expression operand.
fn statement_position(tokens: &[Token], i: usize) -> bool {
    match prev_kind(tokens, i) {
        None => true,
        Some(
            TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Export,
        ) => true,
        _ => false,
    }
}
