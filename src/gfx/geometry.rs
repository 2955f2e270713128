//! # Static Geometry
//!
//! Vertex and index buffers for the full-screen quad, plus [`VertexArray`],
//! which groups them the way the render pipeline consumes them: one vertex
//! buffer per attribute and one index buffer.

use wgpu::util::DeviceExt;

/// Quad corners in clip space, three floats each
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0,
];

/// Texture coordinates for each corner
pub const QUAD_UVS: [f32; 8] = [
    0.0, 0.0, //
    1.0, 0.0, //
    1.0, 1.0, //
    0.0, 1.0,
];

/// Two counter-clockwise triangles
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Static float buffer feeding one shader location
pub struct VertexBuffer {
    buffer: wgpu::Buffer,
    attributes: [wgpu::VertexAttribute; 1],
    stride: wgpu::BufferAddress,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Uploads `data` as `components`-wide float vectors bound to `location`
    ///
    /// # Panics
    /// If `components` is not 1 to 4 or does not divide `data.len()`.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        data: &[f32],
        location: u32,
        components: u32,
    ) -> Self {
        assert!(
            components > 0 && data.len() % components as usize == 0,
            "{label}: {} floats do not form {components}-component vertices",
            data.len()
        );
        let format = match components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            4 => wgpu::VertexFormat::Float32x4,
            _ => panic!("{label}: unsupported component count {components}"),
        };

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            buffer,
            attributes: [wgpu::VertexAttribute {
                offset: 0,
                shader_location: location,
                format,
            }],
            stride: format.size(),
            vertex_count: (data.len() / components as usize) as u32,
        }
    }

    pub fn desc(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Static `u32` index buffer
pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    pub fn new(device: &wgpu::Device, label: &str, indices: &[u32]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            buffer,
            count: indices.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Vertex buffers in slot order plus the index buffer drawn with them
pub struct VertexArray {
    buffers: Vec<VertexBuffer>,
    indices: IndexBuffer,
}

impl VertexArray {
    pub fn new(buffers: Vec<VertexBuffer>, indices: IndexBuffer) -> Self {
        Self { buffers, indices }
    }

    /// Full-screen quad: positions at location 0, UVs at location 1
    pub fn quad(device: &wgpu::Device) -> Self {
        Self::new(
            vec![
                VertexBuffer::new(device, "Quad Positions", &QUAD_POSITIONS, 0, 3),
                VertexBuffer::new(device, "Quad UVs", &QUAD_UVS, 1, 2),
            ],
            IndexBuffer::new(device, "Quad Indices", &QUAD_INDICES),
        )
    }

    /// Layouts for pipeline creation, one per slot
    pub fn layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.buffers.iter().map(VertexBuffer::desc).collect()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.count()
    }

    /// Binds every vertex buffer to its slot and the index buffer
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        for (slot, buffer) in self.buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.buffer.slice(..));
        }
        pass.set_index_buffer(self.indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draws all indices once
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw_indexed(0..self.indices.count(), 0, 0..1);
    }
}
