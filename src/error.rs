//! Error types
//!
//! Each resource layer has its own error enum; [`LifeError`] aggregates them
//! for the application. None of these are recovered from: they propagate to
//! `main`, which logs them and exits with a failure status.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while building a [`PixelGrid`](crate::grid::PixelGrid)
#[derive(Debug, Error)]
pub enum GridError {
    #[error("failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no image data found in {path}")]
    Empty { path: PathBuf },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA8 image")]
    BadLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Unsupported or inconsistent texture configuration
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture '{label}': {operation} is not implemented for {target:?} targets")]
    UnsupportedTarget {
        label: String,
        operation: &'static str,
        target: crate::gfx::texture::TextureTarget,
    },

    #[error("texture '{label}': storage has already been allocated")]
    AlreadyAllocated { label: String },

    #[error("texture '{label}': storage has not been allocated")]
    NotAllocated { label: String },

    #[error("texture '{label}': invalid storage size {width}x{height}x{depth} with {levels} level(s)")]
    InvalidSize {
        label: String,
        levels: u32,
        width: u32,
        height: u32,
        depth: u32,
    },

    #[error("texture '{label}': {width}x{height}x{depth} exceeds the device limit of {limit}")]
    TooLarge {
        label: String,
        width: u32,
        height: u32,
        depth: u32,
        limit: u32,
    },

    #[error("texture '{label}': mip level {level} out of range (texture has {levels})")]
    LevelOutOfRange { label: String, level: u32, levels: u32 },

    #[error("texture '{label}': layer {layer} out of range (texture has {layers})")]
    LayerOutOfRange { label: String, layer: u32, layers: u32 },

    #[error("texture '{label}': region {x},{y} {width}x{height} exceeds level size {level_width}x{level_height}")]
    RegionOutOfBounds {
        label: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        level_width: u32,
        level_height: u32,
    },

    #[error("texture '{label}': pixel data holds {actual} bytes, region needs {expected}")]
    PixelLength {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("texture '{label}': format {requested:?} does not match storage format {storage:?}")]
    FormatMismatch {
        label: String,
        requested: wgpu::TextureFormat,
        storage: wgpu::TextureFormat,
    },

    #[error("texture '{label}': format {format:?} has no fixed texel size")]
    UnsizedFormat {
        label: String,
        format: wgpu::TextureFormat,
    },

    #[error("texture '{label}': readback failed: {reason}")]
    Readback { label: String, reason: String },
}

/// Shader loading, compilation and link failures
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader not found: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad shader: {path}\n{log}")]
    Compile { path: PathBuf, log: String },

    #[error("bad shader: {path} has no {stage:?} entry point")]
    MissingEntryPoint {
        path: PathBuf,
        stage: crate::gfx::shader::ShaderStage,
    },

    #[error("bad shader: {path} has no fixed workgroup size, got {size:?}")]
    UnsizedWorkgroup { path: PathBuf, size: [u32; 3] },

    #[error("bad program '{label}': {log}")]
    Link { label: String, log: String },

    #[error("program '{label}' is not linked as a {expected} program")]
    NotLinked { label: String, expected: &'static str },
}

/// Rejected [`LifeConfig`](crate::config::LifeConfig) values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate must be at least 1")]
    ZeroTickRate,

    #[error("window size must be non-zero, got {width}x{height}")]
    ZeroWindow { width: u32, height: u32 },
}

/// Top-level error for the application
#[derive(Debug, Error)]
pub enum LifeError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to request adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface does not support the adapter")]
    SurfaceUnsupported,

    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}

pub type Result<T, E = LifeError> = std::result::Result<T, E>;
