//! # GFXSL - Generator
//!
//! This library contains the shared tree walker used by every target language backend, the
//! registries of declarations shared between shaders, and the host C++ header generation.
//!
//! A backend implements the [Backend] trait. [generate_shader] drives a backend over every stage of
//! a parsed module and registers the module's shared structs, uniform buffers and vertex formats in
//! the [Registries] of the build.

mod backend;
mod error;
mod generator;
mod host;
mod intrinsics;
mod operators;
mod registry;
mod shader;
mod stub;

pub use backend::*;
pub use error::*;
pub use generator::*;
pub use host::*;
pub use intrinsics::*;
pub use operators::*;
pub use registry::*;
pub use shader::*;
pub use stub::*;

#[cfg(test)]
mod tests;
