//! # Graphics Module
//!
//! GPU resources and the presentation stage.
//!
//! - **Context** ([`context`]) - device, queue and window surface
//! - **Textures** ([`texture`]) - owning texture handles with one-time storage
//! - **Shaders** ([`shader`]) - WGSL stages linked into compute or render pipelines
//! - **Geometry** ([`geometry`]) - static vertex/index buffers for the screen quad
//! - **Presenter** ([`presenter`]) - draws the current generation each frame

pub mod context;
pub mod geometry;
pub mod presenter;
pub mod shader;
pub mod texture;

pub use context::{GpuContext, SurfaceContext};
pub use presenter::Presenter;
pub use shader::{ShaderProgram, ShaderStage};
pub use texture::{Texture, TextureTarget};
