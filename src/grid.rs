//! # Pixel Grid
//!
//! CPU-side cell state. A grid is a linear RGBA `f32` buffer, normally
//! decoded once from the seed image and then uploaded to the GPU.
//!
//! A cell is alive when its red channel is above [`ALIVE_THRESHOLD`]. The
//! compute shader uses the same convention, writing [`ALIVE`] and [`DEAD`].

use std::path::Path;

use crate::error::GridError;

/// Channels per cell (RGBA)
pub const CHANNELS: usize = 4;

/// Red channel value above which a cell counts as alive
pub const ALIVE_THRESHOLD: f32 = 0.5;

/// Color written for a live cell
pub const ALIVE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Color written for a dead cell
pub const DEAD: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// RGBA float pixel buffer addressed by `(x, y)`
///
/// The buffer always holds exactly `width * height * CHANNELS` values.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelGrid {
    /// Creates a grid with every channel set to zero
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Creates a grid with every cell dead
    pub fn dead(width: u32, height: u32) -> Self {
        let mut grid = Self::new(width, height);
        for cell in grid.data.chunks_exact_mut(CHANNELS) {
            cell.copy_from_slice(&DEAD);
        }
        grid
    }

    /// Decodes the image at `path` into normalized RGBA channels
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| GridError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        if image.width() == 0 || image.height() == 0 {
            return Err(GridError::Empty {
                path: path.to_path_buf(),
            });
        }

        let grid = Self::from_rgba8(image.width(), image.height(), image.as_raw())?;
        log::info!(
            "Loaded {}x{} seed grid from {} ({} live cells)",
            grid.width,
            grid.height,
            path.display(),
            grid.live_cells()
        );
        Ok(grid)
    }

    /// Builds a grid from 8-bit RGBA pixels, mapping 0..=255 onto 0.0..=1.0
    pub fn from_rgba8(width: u32, height: u32, pixels: &[u8]) -> Result<Self, GridError> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(GridError::BadLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data: pixels.iter().map(|&c| f32::from(c) / 255.0).collect(),
        })
    }

    /// Rebuilds a grid from tightly packed `Rgba32Float` texel bytes
    pub fn from_texture_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, GridError> {
        let expected = width as usize * height as usize * CHANNELS * std::mem::size_of::<f32>();
        if bytes.len() != expected {
            return Err(GridError::BadLength {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        // Readback buffers carry no alignment guarantee for f32
        Ok(Self {
            width,
            height,
            data: bytemuck::pod_collect_to_vec(bytes),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        CHANNELS
    }

    /// Flat channel data, row-major
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The channel data as bytes, ready for a texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Offset of the first channel of `(x, y)` in [`data`](Self::data)
    pub fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside grid");
        (x as usize * CHANNELS) + (y as usize * CHANNELS * self.width as usize)
    }

    /// Channel values of the cell at `(x, y)`
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrites the channel values of the cell at `(x, y)`
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn set(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let i = self.index(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    pub fn is_alive(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)] > ALIVE_THRESHOLD
    }

    pub fn set_alive(&mut self, x: u32, y: u32, alive: bool) {
        self.set(x, y, if alive { ALIVE } else { DEAD });
    }

    /// Number of live cells
    pub fn live_cells(&self) -> usize {
        self.data
            .chunks_exact(CHANNELS)
            .filter(|cell| cell[0] > ALIVE_THRESHOLD)
            .count()
    }

    /// Coordinates of every live cell, row by row
    pub fn live_coords(&self) -> Vec<(u32, u32)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_alive(x, y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::collections::HashSet;

    #[test]
    fn test_addressing_is_bijective() {
        for (width, height) in [(1, 1), (1, 7), (7, 1), (3, 5), (16, 9), (500, 2)] {
            let grid = PixelGrid::new(width, height);
            let total = width as usize * height as usize * CHANNELS;
            assert_eq!(grid.data().len(), total);

            let mut seen = HashSet::new();
            for y in 0..height {
                for x in 0..width {
                    let i = grid.index(x, y);
                    for c in 0..CHANNELS {
                        assert!(i + c < total);
                        assert!(seen.insert(i + c), "({x}, {y}) channel {c} aliased");
                    }
                }
            }
            assert_eq!(seen.len(), total);
        }
    }

    #[test]
    fn test_get_after_set_returns_written_values() {
        let mut rng = rand::rng();
        let mut grid = PixelGrid::new(13, 11);

        for _ in 0..200 {
            let x = rng.random_range(0..13);
            let y = rng.random_range(0..11);
            let rgba = [rng.random(), rng.random(), rng.random(), rng.random()];
            grid.set(x, y, rgba);
            assert_eq!(grid.get(x, y), rgba);
        }
    }

    #[test]
    fn test_set_leaves_neighbours_untouched() {
        let mut grid = PixelGrid::new(3, 3);
        grid.set(1, 1, [0.1, 0.2, 0.3, 0.4]);

        assert_eq!(grid.get(0, 1), [0.0; 4]);
        assert_eq!(grid.get(2, 1), [0.0; 4]);
        assert_eq!(grid.get(1, 0), [0.0; 4]);
        assert_eq!(grid.get(1, 2), [0.0; 4]);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_get_panics() {
        let grid = PixelGrid::new(4, 4);
        grid.get(0, 4);
    }

    #[test]
    fn test_from_rgba8_normalizes() {
        let pixels = [0, 51, 255, 255, 255, 0, 0, 128];
        let grid = PixelGrid::from_rgba8(2, 1, &pixels).unwrap();

        assert_eq!(grid.get(0, 0), [0.0, 0.2, 1.0, 1.0]);
        assert!(grid.is_alive(1, 0));
        assert!(!grid.is_alive(0, 0));
    }

    #[test]
    fn test_from_rgba8_rejects_short_buffer() {
        let err = PixelGrid::from_rgba8(2, 2, &[0; 15]).unwrap_err();
        assert!(matches!(err, GridError::BadLength { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn test_texture_bytes_round_trip() {
        let mut grid = PixelGrid::dead(4, 3);
        grid.set_alive(2, 1, true);

        let rebuilt = PixelGrid::from_texture_bytes(4, 3, grid.as_bytes()).unwrap();
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn test_texture_bytes_may_be_unaligned() {
        let mut grid = PixelGrid::dead(2, 2);
        grid.set(1, 1, [0.25, 0.5, 0.75, 1.0]);

        let mut shifted = vec![0u8];
        shifted.extend_from_slice(grid.as_bytes());
        let rebuilt = PixelGrid::from_texture_bytes(2, 2, &shifted[1..]).unwrap();
        assert_eq!(rebuilt, grid);

        assert!(matches!(
            PixelGrid::from_texture_bytes(2, 2, &shifted),
            Err(GridError::BadLength { .. })
        ));
    }

    #[test]
    fn test_load_honours_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed_not_named_input.png");

        let mut image = image::RgbaImage::new(5, 4);
        image.put_pixel(3, 2, image::Rgba([255, 255, 255, 255]));
        image.save(&path).unwrap();

        let grid = PixelGrid::load(&path).unwrap();
        assert_eq!((grid.width(), grid.height()), (5, 4));
        assert_eq!(grid.live_coords(), vec![(3, 2)]);
        assert_eq!(grid.get(3, 2), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(grid.get(0, 0), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        let err = PixelGrid::load(&path).unwrap_err();
        assert!(matches!(err, GridError::Load { .. }));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_bundled_seed_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::config::DEFAULT_SEED_IMAGE);
        let grid = PixelGrid::load(path).unwrap();
        assert_eq!(grid.data().len(), grid.width() as usize * grid.height() as usize * CHANNELS);
        assert!(grid.live_cells() > 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(PixelGrid::load(&path).is_err());
    }
}
