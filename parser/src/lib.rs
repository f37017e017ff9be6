//! # GFXSL - Parser
//!
//! The parser converts from a stream of lex tokens into a typed abstract syntax tree.
//!
//! Symbol resolution and type checking happen while parsing so every node in the resulting
//! [gfxsl_ast::Module] refers to resolved declarations and carries its type.

mod parser;

pub use parser::parse;
pub use parser::ParseError;
pub use parser::ParseErrorReason;
