//! Application configuration
//!
//! Everything the program needs to start is fixed here and built once in
//! `main`. There are no command-line arguments; [`LifeConfig::default`]
//! carries the stock window, tick rate and asset paths.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_WINDOW_WIDTH: u32 = 500;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 500;
pub const DEFAULT_TITLE: &str = "Conway's Game of Life";

/// Frames between two generations
pub const DEFAULT_TICK_RATE: u32 = 500;

pub const DEFAULT_SEED_IMAGE: &str = "input.png";
pub const DEFAULT_COMPUTE_SHADER: &str = "shader/life.comp.wgsl";
pub const DEFAULT_VERTEX_SHADER: &str = "shader/quad.vert.wgsl";
pub const DEFAULT_FRAGMENT_SHADER: &str = "shader/quad.frag.wgsl";

/// Immutable startup configuration
#[derive(Clone, Debug, PartialEq)]
pub struct LifeConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    pub tick_rate: u32,
    pub seed_image: PathBuf,
    pub compute_shader: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub vsync: bool,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            title: DEFAULT_TITLE.to_owned(),
            tick_rate: DEFAULT_TICK_RATE,
            seed_image: DEFAULT_SEED_IMAGE.into(),
            compute_shader: DEFAULT_COMPUTE_SHADER.into(),
            vertex_shader: DEFAULT_VERTEX_SHADER.into(),
            fragment_shader: DEFAULT_FRAGMENT_SHADER.into(),
            vsync: false,
        }
    }
}

impl LifeConfig {
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_seed_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_image = path.into();
        self
    }

    /// Sets the compute, vertex and fragment shader paths
    pub fn with_shaders(
        mut self,
        compute: impl Into<PathBuf>,
        vertex: impl Into<PathBuf>,
        fragment: impl Into<PathBuf>,
    ) -> Self {
        self.compute_shader = compute.into();
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Checks the values that would otherwise fail deep inside the loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::ZeroWindow {
                width: self.window_width,
                height: self.window_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LifeConfig::default();
        assert_eq!((config.window_width, config.window_height), (500, 500));
        assert_eq!(config.tick_rate, 500);
        assert!(!config.vsync);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = LifeConfig::default()
            .with_tick_rate(3)
            .with_seed_image("glider.png")
            .with_title("life");

        assert_eq!(config.tick_rate, 3);
        assert_eq!(config.seed_image, PathBuf::from("glider.png"));
        assert_eq!(config.title, "life");
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(matches!(
            LifeConfig::default().with_tick_rate(0).validate(),
            Err(ConfigError::ZeroTickRate)
        ));
        assert!(matches!(
            LifeConfig::default().with_window_size(0, 10).validate(),
            Err(ConfigError::ZeroWindow { .. })
        ));
    }
}
