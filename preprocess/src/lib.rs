//! # GFXSL - Preprocessor
//!
//! The preprocessor contains a C-like preprocessor to run on a set of raw shader source files.
//!
//! Macros are cleared for every top level shader. Loaded files are remembered in an [IncludeCache] which is
//! expected to live for the whole build so shared headers are only read from disk once.

mod condition_parser;
mod preprocess;

pub use preprocess::prepare_tokens;
pub use preprocess::preprocess_fragment;
pub use preprocess::preprocess_shader;
pub use preprocess::IncludeCache;
pub use preprocess::PreprocessError;

mod lexer;

pub use lexer::LexerError;
pub use lexer::LexerErrorReason;

mod unlexer;

pub use unlexer::unlex;

#[cfg(test)]
mod tests;
