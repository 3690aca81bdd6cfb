//! Kata parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser};

use kata_lexer::Lexer;
use kata_types::ast::Program;
use kata_types::{CompileErrors, SourceFile};

/// Lex and parse a snippet in one step.
///
/// Returns the program on success, or every error collected by the
/// lexer and parser.
pub fn parse_source(source: &str) -> Result<Program, CompileErrors> {
    let source_file = SourceFile::snippet(source);
    let lexed = Lexer::new(&source_file).lex();
    let mut errors = lexed.errors;

    let result = Parser::new(lexed.tokens, &source_file).parse();
    errors.extend(result.errors);

    match result.program {
        Some(program) if !errors.has_errors() => Ok(program),
        _ => Err(errors),
    }
}
