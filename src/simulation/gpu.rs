//! GPU Game of Life stage
//!
//! Two `Rgba32Float` textures hold the current and next generation. A step
//! binds the compute program with the "current → next" bind group,
//! dispatches one invocation per cell and swaps the roles. The compute pass
//! ending is what orders the image writes before any later read, including
//! the presentation pass recorded after it in the same encoder.

use std::path::Path;

use super::ping_pong::PingPong;
use crate::error::Result;
use crate::gfx::shader::{LinkOptions, ShaderProgram, ShaderSource, ShaderStage};
use crate::gfx::texture::{Texture, TextureTarget};
use crate::grid::PixelGrid;

/// Storage format of both generation textures
pub const CELL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Binding of the generation being read
pub const INPUT_UNIT: u32 = 0;

/// Binding of the generation being written
pub const OUTPUT_UNIT: u32 = 1;

/// Workgroups needed to cover `problem_size` with `workgroup_size` threads
pub fn dispatch_size(problem_size: (u32, u32), workgroup_size: (u32, u32)) -> (u32, u32) {
    (
        problem_size.0.div_ceil(workgroup_size.0),
        problem_size.1.div_ceil(workgroup_size.1),
    )
}

/// Double-buffered Game of Life on the GPU
pub struct LifeSimulation {
    program: ShaderProgram,
    textures: PingPong<Texture>,
    /// Slot `i` reads texture `i` and writes the other one
    bind_groups: [wgpu::BindGroup; 2],
    width: u32,
    height: u32,
    workgroup_size: (u32, u32),
    generation: u64,
}

impl LifeSimulation {
    /// Loads the compute shader at `compute_shader` and seeds both
    /// generations from `grid`
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: &PixelGrid,
        compute_shader: impl AsRef<Path>,
    ) -> Result<Self> {
        let source = ShaderSource::load(ShaderStage::Compute, compute_shader)?;
        Self::from_source(device, queue, grid, source)
    }

    /// Like [`new`](Self::new) with an already compiled shader. The dispatch
    /// is sized from the shader's own `@workgroup_size`.
    pub fn from_source(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: &PixelGrid,
        source: ShaderSource,
    ) -> Result<Self> {
        let (width, height) = (grid.width(), grid.height());
        let workgroup_size = (source.workgroup_size[0], source.workgroup_size[1]);

        let mut textures = [
            Texture::new("Generation A", TextureTarget::D2),
            Texture::new("Generation B", TextureTarget::D2),
        ];
        for texture in textures.iter_mut() {
            texture.storage(device, 1, CELL_FORMAT, width, height, 0)?;
        }
        // The seed is only needed in the first "current" texture; the other
        // is fully overwritten by the first dispatch
        textures[0].sub_image(queue, 0, 0, 0, width, height, grid.as_bytes())?;
        let [a, b] = textures;
        let textures = PingPong::new(a, b);

        // (input, output) bindings for each direction
        let bindings = [
            (textures.get(0).bind(INPUT_UNIT)?, textures.get(1).bind_as_image(
                OUTPUT_UNIT,
                0,
                0,
                wgpu::StorageTextureAccess::WriteOnly,
                CELL_FORMAT,
            )?),
            (textures.get(1).bind(INPUT_UNIT)?, textures.get(0).bind_as_image(
                OUTPUT_UNIT,
                0,
                0,
                wgpu::StorageTextureAccess::WriteOnly,
                CELL_FORMAT,
            )?),
        ];

        let (input, output) = &bindings[0];
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Life Compute Layout"),
            entries: &[
                input.layout_entry(wgpu::ShaderStages::COMPUTE),
                output.layout_entry(),
            ],
        });

        let bind_groups = bindings.map(|(input, output)| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Life Compute Bind Group"),
                layout: &layout,
                entries: &[input.entry(), output.entry()],
            })
        });

        let mut program = ShaderProgram::new("Life Compute");
        program.attach(device, source);
        program.link(
            device,
            &LinkOptions {
                bind_group_layouts: &[&layout],
                vertex_buffers: &[],
                color_format: None,
            },
        )?;

        log::info!(
            "Life simulation ready: {width}x{height} cells, {:?} workgroups of {:?}",
            dispatch_size((width, height), workgroup_size),
            workgroup_size
        );

        Ok(Self {
            program,
            textures,
            bind_groups,
            width,
            height,
            workgroup_size,
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Generations computed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn textures(&self) -> &PingPong<Texture> {
        &self.textures
    }

    /// Index of the texture holding the latest generation
    pub fn current_index(&self) -> usize {
        self.textures.current_index()
    }

    /// Texture holding the latest generation
    pub fn current(&self) -> &Texture {
        self.textures.current()
    }

    /// Threads per workgroup in x and y, as declared by the shader
    pub fn workgroup_size(&self) -> (u32, u32) {
        self.workgroup_size
    }

    pub fn dispatch_size(&self) -> (u32, u32) {
        dispatch_size((self.width, self.height), self.workgroup_size)
    }

    /// Records one generation into `encoder` and swaps the textures
    pub fn encode_step(&mut self, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        let (x, y) = self.dispatch_size();
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Life Compute Pass"),
                timestamp_writes: None,
            });
            self.program.bind_compute(&mut pass)?;
            pass.set_bind_group(0, &self.bind_groups[self.textures.current_index()], &[]);
            pass.dispatch_workgroups(x, y, 1);
        }

        self.textures.swap();
        self.generation += 1;
        log::debug!("Generation {}", self.generation);
        Ok(())
    }

    /// Records and submits `generations` steps
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        generations: u32,
    ) -> Result<()> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Life Step Encoder"),
        });
        for _ in 0..generations {
            self.encode_step(&mut encoder)?;
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Reads the latest generation back into a grid (blocking)
    pub fn current_grid(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<PixelGrid> {
        let bytes = self.current().read_pixels(device, queue)?;
        Ok(PixelGrid::from_texture_bytes(self.width, self.height, &bytes)?)
    }

    /// Destroys the compute program; the textures drop with `self`
    pub fn destroy(self) {
        self.program.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_covers_grid() {
        assert_eq!(dispatch_size((500, 500), (8, 4)), (63, 125));
        assert_eq!(dispatch_size((8, 4), (8, 4)), (1, 1));
        assert_eq!(dispatch_size((9, 5), (8, 4)), (2, 2));
        assert_eq!(dispatch_size((1, 1), (8, 4)), (1, 1));
    }

    #[test]
    fn test_dispatch_never_undershoots() {
        for w in 1..40 {
            for h in 1..20 {
                let (x, y) = dispatch_size((w, h), (8, 4));
                assert!(x * 8 >= w && (x - 1) * 8 < w);
                assert!(y * 4 >= h && (y - 1) * 4 < h);
            }
        }
    }
}
