//! Source-to-source front end for the kata harness.
//!
//! Two jobs, both lexical:
//!
//! - [`transpile`] turns a gradually-typed snippet into directly
//!   executable source: interfaces and type aliases vanish, inline
//!   annotations and generics are erased, `enum` declarations are
//!   lowered to runtime object literals. Plain dynamic code passes
//!   through byte-for-byte.
//! - [`extract_function_names`] scans a snippet for its top-level
//!   function-like bindings, in source order, de-duplicated.
//!
//! Neither performs a full parse; both work on the spanned token
//! stream, which is exactly as much structure as they need.

mod extract;
mod scan;
mod strip;

pub use extract::extract_function_names;
pub use strip::transpile;
