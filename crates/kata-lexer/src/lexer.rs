//! Core kata lexer — converts snippet text to a token stream.
//!
//! Features:
//! - Full dynamic core plus the type-level lexemes (`enum`, `interface`,
//!   annotations, generics) that the transpiler erases later
//! - Template literals with `${expr}` via a mode stack
//! - `//` and `/* */` comments stripped
//! - Error recovery: collects up to [`kata_types::MAX_ERRORS`] errors
//!   instead of stopping at the first

use kata_types::{CompileError, CompileErrors, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// Lexer mode — tracks whether we're scanning top-level code or inside
/// a template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal — scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` interpolation expression. The `u32` tracks the
    /// brace depth so we know when the interpolation's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The kata lexer.
///
/// Converts snippet text into a vector of [`Token`]s, collecting
/// errors along the way rather than bailing on the first problem.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Collected errors.
    errors: CompileErrors,
    /// Mode stack for template interpolation.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for interpolation).
    pending: Vec<Token>,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
        }
    }

    /// Lex the entire snippet into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.has_errors() && self.errors.total_errors >= kata_types::MAX_ERRORS {
                break;
            }

            // Drain any pending tokens first (e.g. InterpolationStart after TemplateStart)
            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let token = match self.current_mode() {
                Mode::Template => self.scan_template_continuation(),
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
            };

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.pos, self.line, self.col)
    }

    fn span_from(&self, start: usize, line: u32, col: u32) -> Span {
        Span::new(start, self.pos, line, col)
    }

    fn source_line_at(&self, line: u32) -> String {
        self.source_file.line(line).unwrap_or("").to_string()
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_line_at(span.line);
        let err = CompileError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip spaces, tabs, and newlines. Statements separate on `;` or
    /// by construction, so newlines carry no token.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b' ' || ch == b'\t' || ch == b'\r' || ch == b'\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip a single-line comment (`// ...`).
    /// Returns `true` if a comment was consumed.
    fn skip_line_comment(&mut self) -> bool {
        if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
            while let Some(ch) = self.peek() {
                if ch == b'\n' {
                    break;
                }
                self.advance();
            }
            true
        } else {
            false
        }
    }

    /// Skip a block comment (`/* ... */`).
    /// Returns `true` if one was consumed; unterminated comments error.
    fn skip_block_comment(&mut self) -> bool {
        if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
            let (start, line, col) = (self.pos, self.line, self.col);
            self.advance();
            self.advance();
            loop {
                match self.peek() {
                    None => {
                        let span = self.span_from(start, line, col);
                        self.emit_error(
                            ErrorCode::UNTERMINATED_COMMENT,
                            "unterminated block comment",
                            span,
                        );
                        break;
                    }
                    Some(b'*') if self.peek_at(1) == Some(b'/') => {
                        self.advance();
                        self.advance();
                        break;
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
            true
        } else {
            false
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-template) mode.
    fn scan_normal(&mut self) -> Token {
        self.skip_whitespace();

        while self.skip_line_comment() || self.skip_block_comment() {
            self.skip_whitespace();
        }

        if self.at_end() {
            if self
                .mode_stack
                .iter()
                .any(|m| matches!(m, Mode::Template | Mode::Interpolation { .. }))
            {
                self.emit_error(
                    ErrorCode::UNTERMINATED_TEMPLATE,
                    "unterminated template literal",
                    self.current_span(),
                );
            }
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let (start, line, col) = (self.pos, self.line, self.col);
        let ch = self.advance().unwrap_or(0);

        match ch {
            // ── String literals ──
            b'"' | b'\'' => self.scan_string(ch, start, line, col),
            b'`' => self.scan_template_start(start, line, col),

            // ── Number literal ──
            b'0'..=b'9' => self.scan_number(start, line, col),

            // ── Identifiers & keywords ──
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => self.scan_identifier(start, line, col),

            // ── Operators & punctuation ──
            b'(' => self.simple(TokenKind::LParen, start, line, col),
            b')' => self.simple(TokenKind::RParen, start, line, col),
            b'[' => self.simple(TokenKind::LBracket, start, line, col),
            b']' => self.simple(TokenKind::RBracket, start, line, col),
            b',' => self.simple(TokenKind::Comma, start, line, col),
            b';' => self.simple(TokenKind::Semicolon, start, line, col),
            b':' => self.simple(TokenKind::Colon, start, line, col),
            b'@' => self.simple(TokenKind::At, start, line, col),

            b'{' => {
                // Inside an interpolation, track brace depth
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                self.simple(TokenKind::LBrace, start, line, col)
            }

            b'}' => {
                // Check if this closes an interpolation
                if let Mode::Interpolation { brace_depth } = self.current_mode() {
                    if brace_depth == 0 {
                        // This `}` ends the interpolation — back to template mode
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        return self.simple(TokenKind::InterpolationEnd, start, line, col);
                    }
                    if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                        *brace_depth -= 1;
                    }
                }
                self.simple(TokenKind::RBrace, start, line, col)
            }

            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    self.simple(TokenKind::Ellipsis, start, line, col)
                } else {
                    self.simple(TokenKind::Dot, start, line, col)
                }
            }

            b'+' => match self.peek() {
                Some(b'+') => {
                    self.advance();
                    self.simple(TokenKind::PlusPlus, start, line, col)
                }
                Some(b'=') => {
                    self.advance();
                    self.simple(TokenKind::PlusEq, start, line, col)
                }
                _ => self.simple(TokenKind::Plus, start, line, col),
            },

            b'-' => match self.peek() {
                Some(b'-') => {
                    self.advance();
                    self.simple(TokenKind::MinusMinus, start, line, col)
                }
                Some(b'=') => {
                    self.advance();
                    self.simple(TokenKind::MinusEq, start, line, col)
                }
                _ => self.simple(TokenKind::Minus, start, line, col),
            },

            b'*' => match self.peek() {
                Some(b'*') => {
                    self.advance();
                    self.simple(TokenKind::StarStar, start, line, col)
                }
                Some(b'=') => {
                    self.advance();
                    self.simple(TokenKind::StarEq, start, line, col)
                }
                _ => self.simple(TokenKind::Star, start, line, col),
            },

            b'/' => {
                // Comments were consumed above, so bare / is division
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::SlashEq, start, line, col)
                } else {
                    self.simple(TokenKind::Slash, start, line, col)
                }
            }

            b'%' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::PercentEq, start, line, col)
                } else {
                    self.simple(TokenKind::Percent, start, line, col)
                }
            }

            b'=' => {
                if self.peek() == Some(b'=') && self.peek_at(1) == Some(b'=') {
                    self.advance();
                    self.advance();
                    self.simple(TokenKind::EqEqEq, start, line, col)
                } else if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::EqEq, start, line, col)
                } else if self.peek() == Some(b'>') {
                    self.advance();
                    self.simple(TokenKind::FatArrow, start, line, col)
                } else {
                    self.simple(TokenKind::Eq, start, line, col)
                }
            }

            b'!' => {
                if self.peek() == Some(b'=') && self.peek_at(1) == Some(b'=') {
                    self.advance();
                    self.advance();
                    self.simple(TokenKind::BangEqEq, start, line, col)
                } else if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::BangEq, start, line, col)
                } else {
                    self.simple(TokenKind::Bang, start, line, col)
                }
            }

            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::LtEq, start, line, col)
                } else {
                    self.simple(TokenKind::Lt, start, line, col)
                }
            }

            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.simple(TokenKind::GtEq, start, line, col)
                } else {
                    self.simple(TokenKind::Gt, start, line, col)
                }
            }

            b'&' => {
                if self.peek() == Some(b'&') {
                    self.advance();
                    self.simple(TokenKind::AmpAmp, start, line, col)
                } else {
                    self.simple(TokenKind::Amp, start, line, col)
                }
            }

            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance();
                    self.simple(TokenKind::PipePipe, start, line, col)
                } else {
                    self.simple(TokenKind::Pipe, start, line, col)
                }
            }

            b'?' => {
                if self.peek() == Some(b'?') {
                    self.advance();
                    self.simple(TokenKind::QuestionQuestion, start, line, col)
                } else {
                    self.simple(TokenKind::Question, start, line, col)
                }
            }

            _ => {
                let span = self.span_from(start, line, col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHAR,
                    format!("unexpected character '{}'", ch as char),
                    span,
                );
                self.scan_normal()
            }
        }
    }

    fn simple(&self, kind: TokenKind, start: usize, line: u32, col: u32) -> Token {
        Token::new(kind, self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & numbers
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize, line: u32, col: u32) -> Token {
        while matches!(
            self.peek(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$')
        ) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let span = self.span_from(start, line, col);
        match TokenKind::keyword(text) {
            Some(kind) => Token::new(kind, span),
            None => Token::new(TokenKind::Identifier(text.to_string()), span),
        }
    }

    fn scan_number(&mut self, start: usize, line: u32, col: u32) -> Token {
        // Radix prefixes: 0x / 0b / 0o
        if self.source.get(start) == Some(&b'0') {
            if let Some(radix_char @ (b'x' | b'X' | b'b' | b'B' | b'o' | b'O')) = self.peek() {
                let radix = match radix_char {
                    b'x' | b'X' => 16,
                    b'b' | b'B' => 2,
                    _ => 8,
                };
                self.advance();
                let digits_start = self.pos;
                while matches!(self.peek(), Some(b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F')) {
                    self.advance();
                }
                let digits = std::str::from_utf8(&self.source[digits_start..self.pos]).unwrap_or("");
                let span = self.span_from(start, line, col);
                return match u64::from_str_radix(digits, radix) {
                    Ok(n) => Token::new(TokenKind::NumberLit(n as f64), span),
                    Err(_) => {
                        self.emit_error(
                            ErrorCode::INVALID_NUMBER,
                            format!("invalid numeric literal '0{}{digits}'", radix_char as char),
                            span,
                        );
                        Token::new(TokenKind::NumberLit(0.0), span)
                    }
                };
            }
        }

        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        // Fraction — but not `1..` or a method call like `1.toFixed`
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }
        // Exponent
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                lookahead = 2;
            }
            if matches!(self.peek_at(lookahead), Some(b'0'..=b'9')) {
                self.advance(); // e
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.advance();
                }
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let span = self.span_from(start, line, col);
        match text.parse::<f64>() {
            Ok(n) => Token::new(TokenKind::NumberLit(n), span),
            Err(_) => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("invalid numeric literal '{text}'"),
                    span,
                );
                Token::new(TokenKind::NumberLit(0.0), span)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Strings & templates
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string after its opening `"` or `'`.
    fn scan_string(&mut self, quote: u8, start: usize, line: u32, col: u32) -> Token {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    return Token::new(TokenKind::StringLit(value), span);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return Token::new(
                        TokenKind::StringLit(value),
                        self.span_from(start, line, col),
                    );
                }
                Some(b'\\') => {
                    self.advance();
                    if let Some(esc) = self.advance() {
                        value.push(unescape(esc));
                    }
                }
                Some(ch) => {
                    self.advance();
                    if ch < 0x80 {
                        value.push(ch as char);
                    } else {
                        self.consume_multibyte(ch, &mut value);
                    }
                }
            }
        }
    }

    /// Scan a template literal after its opening backtick.
    ///
    /// Emits a plain [`TokenKind::StringLit`] when no `${` occurs, or
    /// [`TokenKind::TemplateStart`] + pending `InterpolationStart` when it does.
    fn scan_template_start(&mut self, start: usize, line: u32, col: u32) -> Token {
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_TEMPLATE,
                        "unterminated template literal",
                        span,
                    );
                    return Token::new(TokenKind::StringLit(text), span);
                }
                Some(b'`') => {
                    self.advance();
                    return Token::new(
                        TokenKind::StringLit(text),
                        self.span_from(start, line, col),
                    );
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let interp_start = self.pos;
                    let (iline, icol) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    self.push_mode(Mode::Interpolation { brace_depth: 0 });
                    self.pending.push(Token::new(
                        TokenKind::InterpolationStart,
                        self.span_from(interp_start, iline, icol),
                    ));
                    return Token::new(
                        TokenKind::TemplateStart(text),
                        Span::new(start, interp_start, line, col),
                    );
                }
                Some(b'\\') => {
                    self.advance();
                    if let Some(esc) = self.advance() {
                        text.push(unescape(esc));
                    }
                }
                Some(ch) => {
                    self.advance();
                    if ch < 0x80 {
                        text.push(ch as char);
                    } else {
                        self.consume_multibyte(ch, &mut text);
                    }
                }
            }
        }
    }

    /// Scan template text after an interpolation's closing `}`.
    fn scan_template_continuation(&mut self) -> Token {
        let (start, line, col) = (self.pos, self.line, self.col);
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    self.pop_mode();
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_TEMPLATE,
                        "unterminated template literal",
                        span,
                    );
                    return Token::new(TokenKind::TemplateEnd(text), span);
                }
                Some(b'`') => {
                    self.advance();
                    self.pop_mode();
                    return Token::new(
                        TokenKind::TemplateEnd(text),
                        self.span_from(start, line, col),
                    );
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let interp_start = self.pos;
                    let (iline, icol) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    self.pop_mode();
                    self.push_mode(Mode::Interpolation { brace_depth: 0 });
                    self.pending.push(Token::new(
                        TokenKind::InterpolationStart,
                        self.span_from(interp_start, iline, icol),
                    ));
                    return Token::new(
                        TokenKind::TemplatePart(text),
                        Span::new(start, interp_start, line, col),
                    );
                }
                Some(b'\\') => {
                    self.advance();
                    if let Some(esc) = self.advance() {
                        text.push(unescape(esc));
                    }
                }
                Some(ch) => {
                    self.advance();
                    if ch < 0x80 {
                        text.push(ch as char);
                    } else {
                        self.consume_multibyte(ch, &mut text);
                    }
                }
            }
        }
    }

    /// Consume the rest of a UTF-8 sequence whose first byte was just
    /// consumed, appending the decoded character to `out`.
    fn consume_multibyte(&mut self, first: u8, out: &mut String) {
        let len = utf8_len(first);
        let char_start = self.pos - 1;
        for _ in 1..len {
            self.advance();
        }
        match std::str::from_utf8(&self.source[char_start..self.pos]) {
            Ok(s) => out.push_str(s),
            Err(_) => out.push('\u{FFFD}'),
        }
    }
}

/// Decode a single escape character.
fn unescape(esc: u8) -> char {
    match esc {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'0' => '\0',
        other => other as char,
    }
}

/// Byte length of a UTF-8 sequence given its first byte.
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
