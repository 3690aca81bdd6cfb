//! Token types for the kata lexer.
//!
//! Defines [`TokenKind`] covering every lexeme the harness accepts and
//! [`Token`], which pairs a kind with a source [`Span`]. Spans carry
//! byte offsets so the transpiler can splice the original text.

use kata_types::Span;
use std::fmt;

/// Reserved words of the scripting language.
///
/// `of` is reserved despite being contextual in the host language; it
/// never shows up as a user binding in exercise snippets.
pub const ALL_KEYWORDS: &[&str] = &[
    // Declarations & control flow (19)
    "function", "async", "await", "const", "let", "var", "if", "else", "while", "for", "of", "in",
    "return", "throw", "try", "catch", "finally", "break", "continue",
    // Expressions (7)
    "new", "typeof", "true", "false", "null", "undefined", "as",
    // Type-level syntax, erased by the transpiler (5)
    "enum", "interface", "type", "namespace", "export",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the kata lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location, including byte range.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`, `1e9`, `0xff`
    NumberLit(f64),
    /// Complete string literal (quoted or backtick without `${`),
    /// carrying the decoded value.
    StringLit(String),

    // ── Template-String Interpolation ────────────────────────

    /// Start of an interpolated template — text before the first `${`.
    /// Example: for `` `hi ${name}` ``, carries `"hi "`.
    TemplateStart(String),
    /// Text between a `}` and the next `${` inside a template.
    TemplatePart(String),
    /// End of an interpolated template — text after the last `}`.
    TemplateEnd(String),
    /// The `${` that opens an interpolation expression.
    InterpolationStart,
    /// The `}` that closes an interpolation expression.
    InterpolationEnd,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `flattenDeep`, `total_sum`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Function,
    Async,
    Await,
    Const,
    Let,
    Var,
    If,
    Else,
    While,
    For,
    Of,
    In,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    Break,
    Continue,
    New,
    Typeof,
    True,
    False,
    Null,
    Undefined,
    /// `as` — type assertion, erased by the transpiler.
    As,
    /// `enum` — lowered to an object literal by the transpiler.
    Enum,
    /// `interface` — erased by the transpiler.
    Interface,
    /// `type` — alias declarations, erased by the transpiler.
    Type,
    /// `namespace` — rejected with a clear error.
    Namespace,
    /// `export` — stripped; snippets are not modules.
    Export,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    /// `...`
    Ellipsis,
    Semicolon,
    Colon,
    Question,
    /// `=>`
    FatArrow,
    /// `@` — decorator marker, rejected by the transpiler.
    At,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    /// `**`
    StarStar,
    Slash,
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    /// `=`
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    BangEq,
    /// `!==`
    BangEqEq,

    Lt,
    Gt,
    LtEq,
    GtEq,

    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `&` — only meaningful inside type annotations (intersections).
    Amp,
    /// `|` — only meaningful inside type annotations (unions).
    Pipe,
    /// `!`
    Bang,

    /// End of input. Every token stream ends with exactly one.
    Eof,
}

impl TokenKind {
    /// Map a word to its keyword token, if reserved.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "function" => TokenKind::Function,
            "async" => TokenKind::Async,
            "await" => TokenKind::Await,
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "of" => TokenKind::Of,
            "in" => TokenKind::In,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "new" => TokenKind::New,
            "typeof" => TokenKind::Typeof,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "undefined" => TokenKind::Undefined,
            "as" => TokenKind::As,
            "enum" => TokenKind::Enum,
            "interface" => TokenKind::Interface,
            "type" => TokenKind::Type,
            "namespace" => TokenKind::Namespace,
            "export" => TokenKind::Export,
            _ => return None,
        };
        Some(kind)
    }

    /// The source word for a keyword token.
    ///
    /// Keywords are valid as property names after `.` (for example
    /// `promise.catch(...)` or `Array.of(...)`), so the parser needs
    /// the word back.
    pub fn keyword_word(&self) -> Option<&'static str> {
        let word = match self {
            TokenKind::Function => "function",
            TokenKind::Async => "async",
            TokenKind::Await => "await",
            TokenKind::Const => "const",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Of => "of",
            TokenKind::In => "in",
            TokenKind::Return => "return",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Undefined => "undefined",
            TokenKind::As => "as",
            TokenKind::Enum => "enum",
            TokenKind::Interface => "interface",
            TokenKind::Type => "type",
            TokenKind::Namespace => "namespace",
            TokenKind::Export => "export",
            _ => return None,
        };
        Some(word)
    }

    /// Returns `true` for tokens that can begin a statement keyword-wise.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::Async
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Break
                | TokenKind::Continue
        )
    }
}

impl fmt::Display for TokenKind {
    /// Compact display used in parser error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TokenKind::NumberLit(n) => write!(f, "number '{n}'"),
                TokenKind::StringLit(_) => write!(f, "string literal"),
                TokenKind::TemplateStart(_)
                | TokenKind::TemplatePart(_)
                | TokenKind::TemplateEnd(_) => write!(f, "template literal"),
                TokenKind::InterpolationStart => write!(f, "'${{'"),
                TokenKind::InterpolationEnd => write!(f, "'}}'"),
                TokenKind::Identifier(name) => write!(f, "identifier '{name}'"),
                TokenKind::Eof => write!(f, "end of input"),
                other => {
                    let text = match other {
                        TokenKind::Function => "function",
                        TokenKind::Async => "async",
                        TokenKind::Await => "await",
                        TokenKind::Const => "const",
                        TokenKind::Let => "let",
                        TokenKind::Var => "var",
                        TokenKind::If => "if",
                        TokenKind::Else => "else",
                        TokenKind::While => "while",
                        TokenKind::For => "for",
                        TokenKind::Of => "of",
                        TokenKind::In => "in",
                        TokenKind::Return => "return",
                        TokenKind::Throw => "throw",
                        TokenKind::Try => "try",
                        TokenKind::Catch => "catch",
                        TokenKind::Finally => "finally",
                        TokenKind::Break => "break",
                        TokenKind::Continue => "continue",
                        TokenKind::New => "new",
                        TokenKind::Typeof => "typeof",
                        TokenKind::True => "true",
                        TokenKind::False => "false",
                        TokenKind::Null => "null",
                        TokenKind::Undefined => "undefined",
                        TokenKind::As => "as",
                        TokenKind::Enum => "enum",
                        TokenKind::Interface => "interface",
                        TokenKind::Type => "type",
                        TokenKind::Namespace => "namespace",
                        TokenKind::Export => "export",
                        TokenKind::LParen => "(",
                        TokenKind::RParen => ")",
                        TokenKind::LBrace => "{",
                        TokenKind::RBrace => "}",
                        TokenKind::LBracket => "[",
                        TokenKind::RBracket => "]",
                        TokenKind::Comma => ",",
                        TokenKind::Dot => ".",
                        TokenKind::Ellipsis => "...",
                        TokenKind::Semicolon => ";",
                        TokenKind::Colon => ":",
                        TokenKind::Question => "?",
                        TokenKind::FatArrow => "=>",
                        TokenKind::At => "@",
                        TokenKind::Plus => "+",
                        TokenKind::Minus => "-",
                        TokenKind::Star => "*",
                        TokenKind::StarStar => "**",
                        TokenKind::Slash => "/",
                        TokenKind::Percent => "%",
                        TokenKind::PlusPlus => "++",
                        TokenKind::MinusMinus => "--",
                        TokenKind::Eq => "=",
                        TokenKind::PlusEq => "+=",
                        TokenKind::MinusEq => "-=",
                        TokenKind::StarEq => "*=",
                        TokenKind::SlashEq => "/=",
                        TokenKind::PercentEq => "%=",
                        TokenKind::EqEq => "==",
                        TokenKind::EqEqEq => "===",
                        TokenKind::BangEq => "!=",
                        TokenKind::BangEqEq => "!==",
                        TokenKind::Lt => "<",
                        TokenKind::Gt => ">",
                        TokenKind::LtEq => "<=",
                        TokenKind::GtEq => ">=",
                        TokenKind::AmpAmp => "&&",
                        TokenKind::PipePipe => "||",
                        TokenKind::QuestionQuestion => "??",
                        TokenKind::Amp => "&",
                        TokenKind::Pipe => "|",
                        TokenKind::Bang => "!",
                        _ => unreachable!("handled above"),
                    };
                    write!(f, "'{text}'")
                }
            }
        }
}
