//! Presentation stage: draws the current generation over the whole window

use std::path::Path;

use crate::error::Result;
use crate::gfx::geometry::VertexArray;
use crate::gfx::shader::{LinkOptions, ShaderProgram, ShaderStage};
use crate::gfx::texture::Texture;
use crate::simulation::PingPong;
use crate::wgpu_utils::binding_types;

/// Binding of the sampled generation texture
pub const TEXTURE_UNIT: u32 = 0;

/// Binding of its sampler
pub const SAMPLER_UNIT: u32 = 1;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Textured full-screen quad
pub struct Presenter {
    program: ShaderProgram,
    quad: VertexArray,
    /// Slot `i` samples generation texture `i`
    bind_groups: [wgpu::BindGroup; 2],
}

impl Presenter {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        vertex_shader: impl AsRef<Path>,
        fragment_shader: impl AsRef<Path>,
        textures: &PingPong<Texture>,
    ) -> Result<Self> {
        let mut program = ShaderProgram::new("Life Render");
        program.load_shader(device, ShaderStage::Vertex, vertex_shader)?;
        program.load_shader(device, ShaderStage::Fragment, fragment_shader)?;

        let bindings = [textures.get(0).bind(TEXTURE_UNIT)?, textures.get(1).bind(TEXTURE_UNIT)?];
        let sampler = textures.current().sampler(device);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Life Render Layout"),
            entries: &[
                bindings[0].layout_entry(wgpu::ShaderStages::FRAGMENT),
                binding_types::layout_entry(
                    SAMPLER_UNIT,
                    wgpu::ShaderStages::FRAGMENT,
                    binding_types::sampler_non_filtering(),
                ),
            ],
        });

        let bind_groups = bindings.map(|binding| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Life Render Bind Group"),
                layout: &layout,
                entries: &[
                    binding.entry(),
                    wgpu::BindGroupEntry {
                        binding: SAMPLER_UNIT,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        });

        let quad = VertexArray::quad(device);
        program.link(
            device,
            &LinkOptions {
                bind_group_layouts: &[&layout],
                vertex_buffers: &quad.layouts(),
                color_format: Some(color_format),
            },
        )?;

        Ok(Self {
            program,
            quad,
            bind_groups,
        })
    }

    /// Clears `target` and draws generation texture `texture_index` into it
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        texture_index: usize,
    ) -> Result<()> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Life Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        self.program.bind_render(&mut pass)?;
        self.quad.bind(&mut pass);
        pass.set_bind_group(0, &self.bind_groups[texture_index], &[]);
        self.quad.draw(&mut pass);
        Ok(())
    }

    /// Destroys the render program; buffers drop with `self`
    pub fn destroy(self) {
        self.program.destroy();
    }
}
