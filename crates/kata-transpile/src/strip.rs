//! The transpiler: erase type syntax, lower enums, keep everything else
//! byte-identical.
//!
//! Works as an edit list over the spanned token stream: each erased
//! construct contributes a byte-range removal (or, for enums, a
//! replacement), and the output is the source with the edits applied.
//! When a snippet contains no type syntax the edit list is empty and
//! the input is returned unchanged.

use kata_lexer::token::{Token, TokenKind};
use kata_lexer::Lexer;
use kata_types::{CompileError, CompileErrors, ErrorCode, SourceFile, Span};

use crate::scan::{matching_brace, matching_paren, skip_angle_group, skip_type};

/// Transpile a gradually-typed snippet into directly executable source.
///
/// Fails with the collected [`CompileErrors`] on lex errors, malformed
/// type-level constructs, decorators, and namespace/module syntax.
pub fn transpile(source: &str) -> Result<String, CompileErrors> {
    let sf = SourceFile::snippet(source);
    let lexed = Lexer::new(&sf).lex();
    if lexed.errors.has_errors() {
        return Err(lexed.errors);
    }

    let mut stripper = Stripper::new(&sf, &lexed.tokens);
    stripper.run();
    if stripper.errors.has_errors() {
        return Err(stripper.errors);
    }
    Ok(apply_edits(source, stripper.edits))
}

/// One splice: replace `start..end` bytes with `text` (empty = remove).
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

struct Stripper<'a> {
    source_file: &'a SourceFile,
    tokens: &'a [Token],
    edits: Vec<Edit>,
    errors: CompileErrors,
}

impl<'a> Stripper<'a> {
    fn new(source_file: &'a SourceFile, tokens: &'a [Token]) -> Self {
        Self {
            source_file,
            tokens,
            edits: Vec::new(),
            errors: CompileErrors::empty(),
        }
    }

    fn kind(&self, i: usize) -> Option<&TokenKind> {
        self.tokens.get(i).map(|t| &t.kind)
    }

    fn remove_tokens(&mut self, first: usize, last: usize) {
        self.edits.push(Edit {
            start: self.tokens[first].span.start,
            end: self.tokens[last].span.end,
            text: String::new(),
        });
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) -> CompileError {
        let source_line = self.source_file.line(span.line).unwrap_or("").to_string();
        CompileError::new(&self.source_file.name, code, message, span, source_line)
    }

    fn emit(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let err = self.error(code, message, span);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Main walk
    // ─────────────────────────────────────────────────────────────

    fn run(&mut self) {
        let mut i = 0;
        while i < self.tokens.len() {
            match self.kind(i) {
                None | Some(TokenKind::Eof) => break,

                Some(TokenKind::At) => {
                    let span = self.tokens[i].span;
                    let err = self
                        .error(
                            ErrorCode::DECORATOR_USED,
                            "decorators are not supported",
                            span,
                        )
                        .with_hint("Remove the decorator; exercises use plain functions");
                    self.errors.push_error(err);
                    i += 1;
                }

                Some(TokenKind::Namespace) => {
                    let span = self.tokens[i].span;
                    self.emit(
                        ErrorCode::NAMESPACE_USED,
                        "namespace declarations are not supported",
                        span,
                    );
                    i += 1;
                }

                // Legacy `module Foo { ... }` syntax (not member access
                // like `module.exports`, which has no following name).
                Some(TokenKind::Identifier(name)) if name == "module" => {
                    if matches!(self.kind(i + 1), Some(TokenKind::Identifier(_)))
                        && matches!(self.kind(i + 2), Some(TokenKind::LBrace))
                    {
                        let span = self.tokens[i].span;
                        self.emit(
                            ErrorCode::NAMESPACE_USED,
                            "module declarations are not supported",
                            span,
                        );
                    }
                    i += 1;
                }

                Some(TokenKind::Identifier(name)) if name == "import" => {
                    if matches!(
                        self.kind(i + 1),
                        Some(
                            TokenKind::LBrace
                                | TokenKind::Star
                                | TokenKind::Identifier(_)
                                | TokenKind::StringLit(_)
                        )
                    ) {
                        let span = self.tokens[i].span;
                        self.emit(
                            ErrorCode::IMPORT_USED,
                            "import statements are not supported in exercise snippets",
                            span,
                        );
                    }
                    i += 1;
                }

                // Generic call arguments: `name<T>(...)`
                Some(TokenKind::Identifier(_)) if matches!(self.kind(i + 1), Some(TokenKind::Lt)) => {
                    match skip_angle_group(self.tokens, i + 1) {
                        Some(after) if matches!(self.kind(after), Some(TokenKind::LParen)) => {
                            self.remove_tokens(i + 1, after - 1);
                            i = after;
                        }
                        _ => i += 1,
                    }
                }

                Some(TokenKind::Export) => {
                    self.remove_tokens(i, i);
                    if matches!(self.kind(i + 1), Some(TokenKind::Identifier(n)) if n == "default")
                    {
                        self.remove_tokens(i + 1, i + 1);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }

                Some(TokenKind::Interface) => i = self.strip_interface(i),
                Some(TokenKind::Type) => i = self.strip_type_alias(i),

                Some(TokenKind::Const) if matches!(self.kind(i + 1), Some(TokenKind::Enum)) => {
                    i = self.lower_enum(i, i + 1)
                }
                Some(TokenKind::Enum) => i = self.lower_enum(i, i),

                // `const x: T = ...` — variable annotation
                Some(TokenKind::Const | TokenKind::Let | TokenKind::Var) => {
                    if matches!(self.kind(i + 1), Some(TokenKind::Identifier(_)))
                        && matches!(self.kind(i + 2), Some(TokenKind::Colon))
                    {
                        match skip_type(self.tokens, i + 3) {
                            Some(after) => {
                                self.remove_tokens(i + 2, after - 1);
                                i = after;
                            }
                            None => {
                                let span = self.tokens[i + 2].span;
                                self.emit(
                                    ErrorCode::MALFORMED_TYPE,
                                    "malformed type annotation",
                                    span,
                                );
                                i += 3;
                            }
                        }
                    } else {
                        i += 1;
                    }
                }

                Some(TokenKind::Function) => i = self.strip_function_header(i),

                Some(TokenKind::LParen) => {
                    if let Some(next) = self.try_strip_arrow_params(i) {
                        i = next;
                    } else {
                        i += 1;
                    }
                }

                // `expr as T` — type assertion
                Some(TokenKind::As) => match skip_type(self.tokens, i + 1) {
                    Some(after) => {
                        self.remove_tokens(i, after - 1);
                        i = after;
                    }
                    None => {
                        let span = self.tokens[i].span;
                        self.emit(ErrorCode::MALFORMED_TYPE, "malformed type assertion", span);
                        i += 1;
                    }
                },

                _ => i += 1,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────

    /// `interface Name [<T>] [extends A, B] { ... }` — removed wholesale.
    fn strip_interface(&mut self, start: usize) -> usize {
        let mut j = start + 1;
        if !matches!(self.kind(j), Some(TokenKind::Identifier(_))) {
            let span = self.tokens[start].span;
            self.emit(
                ErrorCode::MALFORMED_TYPE,
                "malformed interface declaration",
                span,
            );
            return start + 1;
        }
        j += 1;
        if matches!(self.kind(j), Some(TokenKind::Lt)) {
            match skip_angle_group(self.tokens, j) {
                Some(after) => j = after,
                None => {
                    let span = self.tokens[j].span;
                    self.emit(
                        ErrorCode::MALFORMED_TYPE,
                        "malformed interface declaration",
                        span,
                    );
                    return j + 1;
                }
            }
        }
        if matches!(self.kind(j), Some(TokenKind::Identifier(n)) if n == "extends") {
            j += 1;
            loop {
                match skip_type(self.tokens, j) {
                    Some(after) => j = after,
                    None => break,
                }
                if matches!(self.kind(j), Some(TokenKind::Comma)) {
                    j += 1;
                } else {
                    break;
                }
            }
        }
        if !matches!(self.kind(j), Some(TokenKind::LBrace)) {
            let span = self.tokens[start].span;
            self.emit(
                ErrorCode::MALFORMED_TYPE,
                "malformed interface declaration",
                span,
            );
            return j;
        }
        match matching_brace(self.tokens, j) {
            Some(close) => {
                self.remove_tokens(start, close);
                close + 1
            }
            None => {
                let span = self.tokens[j].span;
                self.emit(
                    ErrorCode::UNCLOSED_DELIMITER,
                    "unclosed interface body",
                    span,
                );
                j + 1
            }
        }
    }

    /// `type Name[<T>] = T;` — removed wholesale.
    fn strip_type_alias(&mut self, start: usize) -> usize {
        let mut j = start + 1;
        if !matches!(self.kind(j), Some(TokenKind::Identifier(_))) {
            let span = self.tokens[start].span;
            self.emit(ErrorCode::MALFORMED_TYPE, "malformed type alias", span);
            return start + 1;
        }
        j += 1;
        if matches!(self.kind(j), Some(TokenKind::Lt)) {
            match skip_angle_group(self.tokens, j) {
                Some(after) => j = after,
                None => {
                    let span = self.tokens[j].span;
                    self.emit(ErrorCode::MALFORMED_TYPE, "malformed type alias", span);
                    return j + 1;
                }
            }
        }
        if !matches!(self.kind(j), Some(TokenKind::Eq)) {
            let span = self.tokens[start].span;
            self.emit(ErrorCode::MALFORMED_TYPE, "malformed type alias", span);
            return j;
        }
        match skip_type(self.tokens, j + 1) {
            Some(mut after) => {
                if matches!(self.kind(after), Some(TokenKind::Semicolon)) {
                    after += 1;
                }
                self.remove_tokens(start, after - 1);
                after
            }
            None => {
                let span = self.tokens[j].span;
                self.emit(ErrorCode::MALFORMED_TYPE, "malformed type alias", span);
                j + 1
            }
        }
    }

    /// Lower `enum Name { ... }` (or `const enum`) into a `const`
    /// object literal. Numeric members map both name→index and
    /// index→name; string members map name→literal only.
    fn lower_enum(&mut self, start: usize, enum_idx: usize) -> usize {
        let name = match self.kind(enum_idx + 1) {
            Some(TokenKind::Identifier(name)) => name.clone(),
            _ => {
                let span = self.tokens[enum_idx].span;
                self.emit(ErrorCode::MALFORMED_ENUM, "malformed enum declaration", span);
                return enum_idx + 1;
            }
        };
        let open = enum_idx + 2;
        if !matches!(self.kind(open), Some(TokenKind::LBrace)) {
            let span = self.tokens[enum_idx].span;
            self.emit(ErrorCode::MALFORMED_ENUM, "malformed enum declaration", span);
            return open;
        }
        let Some(close) = matching_brace(self.tokens, open) else {
            let span = self.tokens[open].span;
            self.emit(ErrorCode::UNCLOSED_DELIMITER, "unclosed enum body", span);
            return open + 1;
        };

        // Parse members between the braces.
        enum Init {
            Num(f64),
            Str(String),
        }
        let mut members: Vec<(String, Option<Init>)> = Vec::new();
        let mut j = open + 1;
        while j < close {
            let member = match self.kind(j) {
                Some(TokenKind::Identifier(m)) => m.clone(),
                _ => {
                    let span = self.tokens[j].span;
                    self.emit(ErrorCode::MALFORMED_ENUM, "malformed enum member", span);
                    return close + 1;
                }
            };
            j += 1;
            let mut init = None;
            if matches!(self.kind(j), Some(TokenKind::Eq)) {
                j += 1;
                init = match self.kind(j) {
                    Some(TokenKind::NumberLit(n)) => {
                        j += 1;
                        Some(Init::Num(*n))
                    }
                    Some(TokenKind::Minus) => {
                        if let Some(TokenKind::NumberLit(n)) = self.kind(j + 1) {
                            let n = -*n;
                            j += 2;
                            Some(Init::Num(n))
                        } else {
                            let span = self.tokens[j].span;
                            self.emit(ErrorCode::MALFORMED_ENUM, "malformed enum member", span);
                            return close + 1;
                        }
                    }
                    Some(TokenKind::StringLit(s)) => {
                        let s = s.clone();
                        j += 1;
                        Some(Init::Str(s))
                    }
                    _ => {
                        let span = self.tokens[j.min(close)].span;
                        self.emit(
                            ErrorCode::MALFORMED_ENUM,
                            "enum members must be initialized with number or string literals",
                            span,
                        );
                        return close + 1;
                    }
                };
            }
            members.push((member, init));
            if matches!(self.kind(j), Some(TokenKind::Comma)) {
                j += 1;
            } else if j < close {
                let span = self.tokens[j].span;
                self.emit(ErrorCode::MALFORMED_ENUM, "malformed enum member list", span);
                return close + 1;
            }
        }

        let is_string_enum = members
            .iter()
            .any(|(_, init)| matches!(init, Some(Init::Str(_))));

        let mut entries: Vec<String> = Vec::new();
        if is_string_enum {
            for (member, init) in &members {
                match init {
                    Some(Init::Str(s)) => {
                        entries.push(format!("{member}: \"{}\"", escape_str(s)));
                    }
                    _ => {
                        let span = self.tokens[open].span;
                        self.emit(
                            ErrorCode::MALFORMED_ENUM,
                            "string enums require an initializer for every member",
                            span,
                        );
                        return close + 1;
                    }
                }
            }
        } else {
            let mut counter = 0.0f64;
            for (member, init) in &members {
                if let Some(Init::Num(n)) = init {
                    counter = *n;
                }
                let value = format_enum_number(counter);
                entries.push(format!("{member}: {value}"));
                entries.push(format!("\"{value}\": \"{member}\""));
                counter += 1.0;
            }
        }

        self.edits.push(Edit {
            start: self.tokens[start].span.start,
            end: self.tokens[close].span.end,
            text: format!("const {name} = {{ {} }};", entries.join(", ")),
        });
        close + 1
    }

    // ─────────────────────────────────────────────────────────────
    // Functions & parameters
    // ─────────────────────────────────────────────────────────────

    /// Strip generics, parameter annotations, and return type from a
    /// `function` header. Returns the index after the header.
    fn strip_function_header(&mut self, start: usize) -> usize {
        let mut j = start + 1;
        if matches!(self.kind(j), Some(TokenKind::Identifier(_))) {
            j += 1;
        }
        if matches!(self.kind(j), Some(TokenKind::Lt)) {
            match skip_angle_group(self.tokens, j) {
                Some(after) => {
                    self.remove_tokens(j, after - 1);
                    j = after;
                }
                None => {
                    let span = self.tokens[j].span;
                    self.emit(
                        ErrorCode::MALFORMED_TYPE,
                        "malformed generic parameter list",
                        span,
                    );
                    return j + 1;
                }
            }
        }
        if !matches!(self.kind(j), Some(TokenKind::LParen)) {
            return j;
        }
        j = self.strip_params(j);
        self.strip_return_type(j)
    }

    /// If the `(` at `open` begins an arrow parameter list, strip its
    /// annotations and return type; returns the index after the header.
    fn try_strip_arrow_params(&mut self, open: usize) -> Option<usize> {
        let close = matching_paren(self.tokens, open)?;
        let is_arrow = match self.kind(close + 1) {
            Some(TokenKind::FatArrow) => true,
            Some(TokenKind::Colon) => skip_type(self.tokens, close + 2).is_some_and(|after| {
                matches!(self.kind(after), Some(TokenKind::FatArrow))
            }),
            _ => false,
        };
        if !is_arrow {
            return None;
        }
        let after_params = self.strip_params(open);
        Some(self.strip_return_type(after_params))
    }

    /// Strip `?` optional markers and `: type` annotations from the
    /// parameter list whose `(` is at `open`. Returns the index after
    /// the matching `)`. Default-value expressions are skipped
    /// bracket-aware and left untouched.
    fn strip_params(&mut self, open: usize) -> usize {
        let Some(close) = matching_paren(self.tokens, open) else {
            return open + 1;
        };
        let mut i = open + 1;
        while i < close {
            if matches!(self.kind(i), Some(TokenKind::Ellipsis)) {
                i += 1;
            }
            if matches!(self.kind(i), Some(TokenKind::Identifier(_))) {
                i += 1;
                if i < close && matches!(self.kind(i), Some(TokenKind::Question)) {
                    self.remove_tokens(i, i);
                    i += 1;
                }
                if i < close && matches!(self.kind(i), Some(TokenKind::Colon)) {
                    match skip_type(self.tokens, i + 1) {
                        Some(after) => {
                            self.remove_tokens(i, after - 1);
                            i = after;
                        }
                        None => {
                            let span = self.tokens[i].span;
                            self.emit(
                                ErrorCode::MALFORMED_TYPE,
                                "malformed parameter type annotation",
                                span,
                            );
                            i = self.seek_param_end(i + 1, close);
                            continue;
                        }
                    }
                }
                if i < close && matches!(self.kind(i), Some(TokenKind::Eq)) {
                    i = self.seek_param_end(i + 1, close);
                    continue;
                }
                if i < close && matches!(self.kind(i), Some(TokenKind::Comma)) {
                    i += 1;
                    continue;
                }
                if i < close {
                    i = self.seek_param_end(i, close);
                }
            } else {
                // Destructuring patterns etc. — pass through untouched.
                i = self.seek_param_end(i, close);
            }
        }
        close + 1
    }

    /// Advance bracket-aware to just past the next top-level `,`, or to
    /// `close`, whichever comes first.
    fn seek_param_end(&self, mut i: usize, close: usize) -> usize {
        let mut depth = 0usize;
        while i < close {
            match self.kind(i) {
                Some(TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket) => depth += 1,
                Some(TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket) => {
                    depth = depth.saturating_sub(1)
                }
                Some(TokenKind::Comma) if depth == 0 => return i + 1,
                _ => {}
            }
            i += 1;
        }
        close
    }

    /// Strip a `: type` return annotation at `i`, if present.
    fn strip_return_type(&mut self, i: usize) -> usize {
        if !matches!(self.kind(i), Some(TokenKind::Colon)) {
            return i;
        }
        match skip_type(self.tokens, i + 1) {
            Some(after) => {
                self.remove_tokens(i, after - 1);
                after
            }
            None => {
                let span = self.tokens[i].span;
                self.emit(
                    ErrorCode::MALFORMED_TYPE,
                    "malformed return type annotation",
                    span,
                );
                i + 1
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Edit application
// ─────────────────────────────────────────────────────────────────────

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return source.to_string();
    }
    edits.sort_by_key(|e| e.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        // Edits come from disjoint constructs; an overlap means the
        // walk double-visited a region and the later edit is dropped.
        if edit.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn format_enum_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
