//! # GFXSL - GLSL Backend
//!
//! This library contains the [Backend](gfxsl_generator::Backend) implementation which converts a
//! parsed module into GLSL 4.10 core source, along with the OpenGL vertex attribute glue for
//! vertex and instance formats.
//!
//! Buffer and stage struct members are emitted as prefixed globals as GLSL has no parameters on
//! `main`. Pipeline managed members map onto `gl_Position`, `gl_FragCoord` and `gl_FragDepth`.
//! Texture sampling flips the V coordinate to match the OpenGL texture origin.

mod backend;
mod glue;
mod intrinsics;

pub use backend::GlslBackend;
