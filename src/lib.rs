// src/lib.rs
//! GPU Game of Life
//!
//! An image seeds a cellular-automaton grid, a wgpu compute shader advances
//! it every few frames and a textured quad shows it in a winit window.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod grid;
pub mod logging;
pub mod rules;
pub mod simulation;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::LifeApp;
pub use config::LifeConfig;
pub use error::{LifeError, Result};
pub use grid::PixelGrid;
pub use simulation::LifeSimulation;
