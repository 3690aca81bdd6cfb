//! Token-stream scanning helpers shared by the stripper and extractor.

use kata_lexer::token::{Token, TokenKind};

/// Index of the `)` matching the `(` at `open`, tracking all three
/// bracket kinds. `None` when unbalanced.
pub(crate) fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    debug_assert!(matches!(tokens[open].kind, TokenKind::LParen));
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return if tok.kind == TokenKind::RParen {
                        Some(i)
                    } else {
                        None
                    };
                }
            }
            TokenKind::Eof => return None,
            _ => {}
        }
    }
    None
}

/// Index of the `}` matching the `{` at `open`.
pub(crate) fn matching_brace(tokens: &[Token], open: usize) -> Option<usize> {
    debug_assert!(matches!(tokens[open].kind, TokenKind::LBrace));
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return if tok.kind == TokenKind::RBrace {
                        Some(i)
                    } else {
                        None
                    };
                }
            }
            TokenKind::Eof => return None,
            _ => {}
        }
    }
    None
}

/// Skip one type expression starting at `i`; returns the index of the
/// first token *after* the type, or `None` when nothing type-shaped is
/// there.
///
/// Grammar handled (loosely): primaries (names with optional generic
/// arguments and dotted paths, object types, tuples, parenthesized and
/// function types, literal types, `typeof x`), postfix `[]`, and
/// unions/intersections chaining with `|` / `&`.
pub(crate) fn skip_type(tokens: &[Token], i: usize) -> Option<usize> {
    let mut i = skip_type_primary(tokens, i)?;
    loop {
        match tokens.get(i).map(|t| &t.kind) {
            // Array suffix: `T[]` (also indexed access `T["k"]`)
            Some(TokenKind::LBracket) => {
                let mut depth = 0usize;
                loop {
                    match tokens.get(i).map(|t| &t.kind) {
                        Some(TokenKind::LBracket) => depth += 1,
                        Some(TokenKind::RBracket) => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        Some(TokenKind::Eof) | None => return None,
                        _ => {}
                    }
                    i += 1;
                }
            }
            Some(TokenKind::Pipe | TokenKind::Amp) => {
                i = skip_type_primary(tokens, i + 1)?;
            }
            _ => return Some(i),
        }
    }
}

fn skip_type_primary(tokens: &[Token], i: usize) -> Option<usize> {
    match tokens.get(i).map(|t| &t.kind) {
        Some(TokenKind::Identifier(_))
        | Some(TokenKind::Null)
        | Some(TokenKind::Undefined)
        | Some(TokenKind::True)
        | Some(TokenKind::False) => {
            let mut i = i + 1;
            // Dotted path: `ns.Name`
            while matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Dot)) {
                match tokens.get(i + 1).map(|t| &t.kind) {
                    Some(TokenKind::Identifier(_)) => i += 2,
                    _ => return Some(i),
                }
            }
            // Generic arguments: `Name<...>`
            if matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Lt)) {
                i = skip_angle_group(tokens, i)?;
            }
            Some(i)
        }
        Some(TokenKind::StringLit(_)) | Some(TokenKind::NumberLit(_)) => Some(i + 1),
        Some(TokenKind::Typeof) => match tokens.get(i + 1).map(|t| &t.kind) {
            Some(TokenKind::Identifier(_)) => Some(i + 2),
            _ => None,
        },
        // Object type: `{ ... }`
        Some(TokenKind::LBrace) => matching_brace(tokens, i).map(|close| close + 1),
        // Tuple type: `[A, B]`
        Some(TokenKind::LBracket) => {
            let mut depth = 0usize;
            let mut j = i;
            loop {
                match tokens.get(j).map(|t| &t.kind) {
                    Some(TokenKind::LBracket) => depth += 1,
                    Some(TokenKind::RBracket) => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(j + 1);
                        }
                    }
                    Some(TokenKind::Eof) | None => return None,
                    _ => {}
                }
                j += 1;
            }
        }
        // Parenthesized or function type: `(...)` or `(...) => T`
        Some(TokenKind::LParen) => {
            let close = matching_paren(tokens, i)?;
            let mut i = close + 1;
            if matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::FatArrow)) {
                i = skip_type(tokens, i + 1)?;
            }
            Some(i)
        }
        _ => None,
    }
}

/// Skip a balanced `<...>` group starting at the `<` at `i`.
///
/// Only succeeds when the group contains nothing but type-shaped
/// tokens — this keeps `a < b` comparisons from being eaten.
pub(crate) fn skip_angle_group(tokens: &[Token], i: usize) -> Option<usize> {
    debug_assert!(matches!(tokens[i].kind, TokenKind::Lt));
    let mut depth = 0i32;
    let mut j = i;
    // A generic argument list in real exercise code is short; a long
    // scan is almost certainly a misparsed comparison chain.
    let limit = j + 64;
    while j < limit {
        match tokens.get(j).map(|t| &t.kind) {
            Some(TokenKind::Lt) => depth += 1,
            Some(TokenKind::Gt) => {
                depth -= 1;
                if depth == 0 {
                    return Some(j + 1);
                }
            }
            Some(
                TokenKind::Identifier(_)
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Colon
                | TokenKind::Semicolon
                | TokenKind::Pipe
                | TokenKind::Amp
                | TokenKind::FatArrow
                | TokenKind::StringLit(_)
                | TokenKind::NumberLit(_)
                | TokenKind::Null
                | TokenKind::Undefined
                | TokenKind::Question
                | TokenKind::Ellipsis,
            ) => {}
            // `extends` in constraints lexes as a plain identifier and
            // is covered above; anything else is not a type argument.
            _ => return None,
        }
        j += 1;
    }
    None
}

/// Starting at `i`, decide whether the tokens form a function-valued
/// expression head: `async`? followed by a `function` keyword, a
/// parenthesized arrow parameter list, or a bare single-parameter
/// arrow. Used by the extractor, so annotations may still be present.
pub(crate) fn is_function_valued(tokens: &[Token], i: usize) -> bool {
    let i = if matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Async)) {
        i + 1
    } else {
        i
    };
    match tokens.get(i).map(|t| &t.kind) {
        Some(TokenKind::Function) => true,
        Some(TokenKind::Identifier(_)) => {
            matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::FatArrow))
        }
        Some(TokenKind::LParen) => {
            let Some(close) = matching_paren(tokens, i) else {
                return false;
            };
            match tokens.get(close + 1).map(|t| &t.kind) {
                Some(TokenKind::FatArrow) => true,
                // `(…): ReturnType => …`
                Some(TokenKind::Colon) => skip_type(tokens, close + 2)
                    .is_some_and(|after| {
                        matches!(tokens.get(after).map(|t| &t.kind), Some(TokenKind::FatArrow))
                    }),
                _ => false,
            }
        }
        _ => false,
    }
}
