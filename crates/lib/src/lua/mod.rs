//! Lua runtime setup and script-facing helpers.
//!
//! # Submodules
//!
//! - [`helpers`] - Helper tables bound into every sandbox scope
//! - [`loaders`] - Platform module loading with `__dir` injection
//! - [`runtime`] - Lua VM creation

pub mod helpers;
pub mod loaders;
pub mod runtime;
