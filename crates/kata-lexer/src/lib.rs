//! Lexer for the kata scripting language.
//!
//! The input is a gradually-typed, JS-flavoured snippet: the lexer
//! tokenizes both the plain dynamic core and the type-level syntax
//! (annotations, `interface`, `enum`, generics) that the transpiler
//! later erases or lowers.

pub mod token;

mod lexer;

pub use lexer::{LexResult, Lexer};
