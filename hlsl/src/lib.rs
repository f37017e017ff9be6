//! # GFXSL - HLSL Backend
//!
//! This library contains the default [Backend](gfxsl_generator::Backend) which converts a parsed
//! module into HLSL source for shader model 5, along with `D3D11_INPUT_ELEMENT_DESC` tables for
//! vertex and instance formats.
//!
//! The source language is close to HLSL so most expressions and intrinsics are emitted unchanged.
//! Uniform buffers become `cbuffer` blocks with prefixed members, mutable buffers become a single
//! element `RWStructuredBuffer`, and system values are copied from `SV_` entry parameters into
//! static globals by a wrapper around the entry point.

mod backend;
mod glue;
mod intrinsics;

pub use backend::HlslBackend;
pub use glue::{INSTANCE_INPUT_SLOT, VERTEX_INPUT_SLOT};
