//! # GFXSL - Abstract Syntax Tree
//!
//! The AST library contains all the definitions for the typed syntax tree of a single shader file.
//! The root of an AST is a [Module] instance.
//!
//! Nodes live in a [NodeBuffer] arena and refer to each other and to declarations by integer ids.
//! Declarations (types, variables, functions, structs and textures) live in flat tables on the [Module].

mod declarations;
mod intrinsics;
mod layout;
mod module;
mod node;
mod operators;
mod reachability;
mod types;

pub use declarations::*;
pub use intrinsics::*;
pub use layout::*;
pub use module::*;
pub use node::*;
pub use operators::*;
pub use reachability::*;
pub use types::*;
