//! # GFXSL
//!
//! This is a meta crate that re-exports all the sub libraries and drives a build of many shader files
//! through a [CompilationSession]

pub use gfxsl_ast as ast;
pub use gfxsl_generator as generator;
pub use gfxsl_glsl as glsl;
pub use gfxsl_hlsl as hlsl;
pub use gfxsl_msl as msl;
pub use gfxsl_parser as parser;
pub use gfxsl_preprocess as preprocess;
pub use gfxsl_text as text;

pub use gfxsl_ast::ShaderStage;

pub use metal_invoker;

mod compile;
pub use compile::*;
