//! Lexer tests: keywords, operators, literals, template interpolation
//! via the mode stack, comments, and error recovery.

use kata_lexer::token::TokenKind;
use kata_lexer::Lexer;
use kata_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::snippet(source);
    Lexer::new(&sf)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return the error count.
fn error_count(source: &str) -> usize {
    let sf = SourceFile::snippet(source);
    Lexer::new(&sf).lex().errors.total_errors
}

/// Lex and return the first error message.
fn first_error(source: &str) -> String {
    let sf = SourceFile::snippet(source);
    Lexer::new(&sf)
        .lex()
        .errors
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

fn string(value: &str) -> TokenKind {
    TokenKind::StringLit(value.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn every_reserved_word_lexes_as_a_keyword() {
    for word in kata_lexer::token::ALL_KEYWORDS {
        let tokens = kinds(word);
        assert_eq!(tokens.len(), 1, "'{word}' should produce one token");
        assert!(
            !matches!(tokens[0], TokenKind::Identifier(_)),
            "'{word}' lexed as an identifier"
        );
    }
}

#[test]
fn identifiers_allow_dollar_and_underscore() {
    assert_eq!(kinds("_private"), vec![ident("_private")]);
    assert_eq!(kinds("$elem"), vec![ident("$elem")]);
    assert_eq!(kinds("camelCase2"), vec![ident("camelCase2")]);
}

#[test]
fn keyword_prefixes_stay_identifiers() {
    assert_eq!(kinds("letter"), vec![ident("letter")]);
    assert_eq!(kinds("iff"), vec![ident("iff")]);
    assert_eq!(kinds("returned"), vec![ident("returned")]);
    assert_eq!(kinds("typeofThing"), vec![ident("typeofThing")]);
}

#[test]
fn function_declaration_token_sequence() {
    assert_eq!(
        kinds("function add(a, b) { return a + b; }"),
        vec![
            TokenKind::Function,
            ident("add"),
            TokenKind::LParen,
            ident("a"),
            TokenKind::Comma,
            ident("b"),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Return,
            ident("a"),
            TokenKind::Plus,
            ident("b"),
            TokenKind::Semicolon,
            TokenKind::RBrace,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators & punctuation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn multi_char_operators_lex_greedily() {
    assert_eq!(kinds("==="), vec![TokenKind::EqEqEq]);
    assert_eq!(kinds("=="), vec![TokenKind::EqEq]);
    assert_eq!(kinds("!=="), vec![TokenKind::BangEqEq]);
    assert_eq!(kinds("=>"), vec![TokenKind::FatArrow]);
    assert_eq!(kinds("**"), vec![TokenKind::StarStar]);
    assert_eq!(kinds("++"), vec![TokenKind::PlusPlus]);
    assert_eq!(kinds("??"), vec![TokenKind::QuestionQuestion]);
    assert_eq!(kinds("..."), vec![TokenKind::Ellipsis]);
    assert_eq!(kinds("+="), vec![TokenKind::PlusEq]);
}

#[test]
fn single_amp_and_pipe_are_distinct_from_doubles() {
    assert_eq!(kinds("a && b"), vec![ident("a"), TokenKind::AmpAmp, ident("b")]);
    assert_eq!(kinds("A | B"), vec![ident("A"), TokenKind::Pipe, ident("B")]);
    assert_eq!(kinds("A & B"), vec![ident("A"), TokenKind::Amp, ident("B")]);
}

#[test]
fn dot_does_not_swallow_ellipsis() {
    assert_eq!(
        kinds("a..."),
        vec![ident("a"), TokenKind::Ellipsis]
    );
    assert_eq!(kinds("a.b"), vec![ident("a"), TokenKind::Dot, ident("b")]);
}

// ─────────────────────────────────────────────────────────────────────
// Number literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn number_literal_forms() {
    assert_eq!(kinds("42"), vec![TokenKind::NumberLit(42.0)]);
    assert_eq!(kinds("3.14"), vec![TokenKind::NumberLit(3.14)]);
    assert_eq!(kinds("1e3"), vec![TokenKind::NumberLit(1000.0)]);
    assert_eq!(kinds("2.5e-2"), vec![TokenKind::NumberLit(0.025)]);
    assert_eq!(kinds("0xff"), vec![TokenKind::NumberLit(255.0)]);
    assert_eq!(kinds("0b101"), vec![TokenKind::NumberLit(5.0)]);
    assert_eq!(kinds("0o17"), vec![TokenKind::NumberLit(15.0)]);
}

#[test]
fn trailing_dot_is_member_access_not_fraction() {
    assert_eq!(
        kinds("1.toFixed"),
        vec![TokenKind::NumberLit(1.0), TokenKind::Dot, ident("toFixed")]
    );
}

#[test]
fn negative_numbers_lex_as_minus_then_literal() {
    assert_eq!(
        kinds("-7"),
        vec![TokenKind::Minus, TokenKind::NumberLit(7.0)]
    );
}

// ─────────────────────────────────────────────────────────────────────
// String literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn quoted_strings_both_quote_styles() {
    assert_eq!(kinds("\"hello\""), vec![string("hello")]);
    assert_eq!(kinds("'world'"), vec![string("world")]);
}

#[test]
fn string_escapes_decode() {
    assert_eq!(kinds(r#""a\nb""#), vec![string("a\nb")]);
    assert_eq!(kinds(r#""tab\there""#), vec![string("tab\there")]);
    assert_eq!(kinds(r#""quote: \"x\"""#), vec![string("quote: \"x\"")]);
    assert_eq!(kinds(r"'it\'s'"), vec![string("it's")]);
}

#[test]
fn unicode_survives_in_strings() {
    assert_eq!(kinds("\"héllo → 世界\""), vec![string("héllo → 世界")]);
}

#[test]
fn plain_backtick_string_is_a_string_lit() {
    assert_eq!(kinds("`no interpolation`"), vec![string("no interpolation")]);
}

// ─────────────────────────────────────────────────────────────────────
// Template interpolation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn simple_interpolation_token_sequence() {
    assert_eq!(
        kinds("`hi ${name}!`"),
        vec![
            TokenKind::TemplateStart("hi ".to_string()),
            TokenKind::InterpolationStart,
            ident("name"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("!".to_string()),
        ]
    );
}

#[test]
fn multiple_interpolations_emit_template_parts() {
    assert_eq!(
        kinds("`${a} and ${b}`"),
        vec![
            TokenKind::TemplateStart(String::new()),
            TokenKind::InterpolationStart,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart(" and ".to_string()),
            TokenKind::InterpolationStart,
            ident("b"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
        ]
    );
}

#[test]
fn braces_inside_interpolation_do_not_end_it() {
    // `${ {a: 1}.a }` — the object's `}` must not close the interpolation.
    let tokens = kinds("`v: ${ {a: 1}.a }`");
    assert_eq!(
        tokens.first(),
        Some(&TokenKind::TemplateStart("v: ".to_string()))
    );
    assert_eq!(
        tokens.last(),
        Some(&TokenKind::TemplateEnd(String::new()))
    );
    let ends = tokens
        .iter()
        .filter(|k| matches!(k, TokenKind::InterpolationEnd))
        .count();
    assert_eq!(ends, 1);
}

#[test]
fn nested_template_inside_interpolation() {
    let tokens = kinds("`a${`b${c}d`}e`");
    assert_eq!(
        tokens.first(),
        Some(&TokenKind::TemplateStart("a".to_string()))
    );
    assert!(tokens.contains(&TokenKind::TemplateStart("b".to_string())));
    assert!(tokens.contains(&TokenKind::TemplateEnd("d".to_string())));
    assert_eq!(tokens.last(), Some(&TokenKind::TemplateEnd("e".to_string())));
    assert_eq!(error_count("`a${`b${c}d`}e`"), 0);
}

// ─────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────

#[test]
fn comments_produce_no_tokens() {
    assert_eq!(kinds("// just a comment"), vec![]);
    assert_eq!(kinds("/* block */"), vec![]);
    assert_eq!(
        kinds("1 // trailing\n+ 2"),
        vec![
            TokenKind::NumberLit(1.0),
            TokenKind::Plus,
            TokenKind::NumberLit(2.0)
        ]
    );
    assert_eq!(
        kinds("a /* mid */ b"),
        vec![ident("a"), ident("b")]
    );
}

#[test]
fn division_is_not_a_comment() {
    assert_eq!(
        kinds("a / b"),
        vec![ident("a"), TokenKind::Slash, ident("b")]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Errors & recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn unterminated_string_errors_but_keeps_lexing() {
    let source = "const s = \"oops\nconst t = 1;";
    assert_eq!(error_count(source), 1);
    assert!(first_error(source).contains("unterminated string"));
    // The line after the bad string still produces tokens.
    assert!(kinds(source).contains(&TokenKind::NumberLit(1.0)));
}

#[test]
fn unterminated_template_errors() {
    assert_eq!(error_count("`open ${x} no close"), 1);
    assert!(first_error("`never closed").contains("unterminated template"));
}

#[test]
fn unterminated_block_comment_errors() {
    assert!(first_error("/* open forever").contains("unterminated block comment"));
}

#[test]
fn unexpected_character_is_reported_and_skipped() {
    let source = "a # b";
    assert_eq!(error_count(source), 1);
    assert!(first_error(source).contains("unexpected character '#'"));
    assert_eq!(kinds(source), vec![ident("a"), ident("b")]);
}

#[test]
fn error_collection_stops_at_the_limit() {
    let source = "#".repeat(50);
    let sf = SourceFile::snippet(&source);
    let result = Lexer::new(&sf).lex();
    assert!(result.errors.total_errors >= kata_types::MAX_ERRORS);
    assert!(result.errors.errors.len() <= kata_types::MAX_ERRORS);
}

#[test]
fn token_stream_always_ends_with_eof() {
    for source in ["", "   ", "// only comment", "1 + 2", "`bad ${"] {
        let sf = SourceFile::snippet(source);
        let tokens = Lexer::new(&sf).lex().tokens;
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    }
}

#[test]
fn spans_carry_byte_offsets() {
    let sf = SourceFile::snippet("let x = 42;");
    let tokens = Lexer::new(&sf).lex().tokens;
    let num = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::NumberLit(_)))
        .expect("number token");
    assert_eq!(&sf.source[num.span.start..num.span.end], "42");
}

#[test]
fn lexing_is_deterministic() {
    let source = "function f(a) { return `v ${a + 1}`; } // note";
    let first = kinds(source);
    for _ in 0..10 {
        assert_eq!(kinds(source), first);
    }
}
