//! # GFXSL - MSL Backend
//!
//! This library contains the backend which generates Metal Shading Language source.
//!
//! System values, textures and the shared sampler are gathered into a `Global` struct which every
//! function receives as its first parameter. Each entry point is split into a `<name>_impl` function
//! holding the body and a `<name>` wrapper which receives the Metal stage attributes, fills in the
//! `Global` struct and calls the body.
//!
//! We assume the generated code will be built with:
//! * -std=metal3.1

mod backend;
mod glue;
mod intrinsics;

pub use backend::MslBackend;
pub use glue::{INSTANCE_BUFFER_INDEX, VERTEX_BUFFER_INDEX};
