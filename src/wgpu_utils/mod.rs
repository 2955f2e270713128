// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Shorthand for the bind-group layout entries the simulation and
//! presentation stages declare.

pub mod binding_types;

pub use binding_types::*;
