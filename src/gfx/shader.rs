//! Shader programs
//!
//! A [`ShaderProgram`] collects WGSL stage modules loaded from disk and links
//! them into either a compute or a render pipeline. Sources are parsed and
//! validated with naga before they reach the device, so a broken file is
//! reported with its path and the compiler log instead of tripping wgpu's
//! uncaptured-error handler.

use std::path::{Path, PathBuf};

use crate::error::ShaderError;

/// Pipeline stage a module is compiled for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
            ShaderStage::Compute => naga::ShaderStage::Compute,
        }
    }
}

/// Validated WGSL source for one stage
#[derive(Clone, Debug)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub source: String,
    /// Name of the first entry point for `stage`
    pub entry_point: String,
    /// `@workgroup_size` of a compute entry point, zero for other stages
    pub workgroup_size: [u32; 3],
}

impl ShaderSource {
    /// Reads `path` and compiles it for `stage`
    pub fn load(stage: ShaderStage, path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::compile(stage, path, source)
    }

    /// Parses and validates `source`, attributing failures to `path`
    pub fn compile(
        stage: ShaderStage,
        path: impl AsRef<Path>,
        source: String,
    ) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let compile_error = |log: String| {
            log::error!("shader failure @ {}\n{log}", path.display());
            ShaderError::Compile {
                path: path.to_path_buf(),
                log,
            }
        };

        let module = naga::front::wgsl::parse_str(&source)
            .map_err(|e| compile_error(e.emit_to_string(&source)))?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(&source)))?;

        let entry_point = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage.naga())
            .ok_or_else(|| ShaderError::MissingEntryPoint {
                path: path.to_path_buf(),
                stage,
            })?;

        // Override-sized workgroups report zero until pipeline creation
        let workgroup_size = entry_point.workgroup_size;
        if stage == ShaderStage::Compute && workgroup_size.contains(&0) {
            return Err(ShaderError::UnsizedWorkgroup {
                path: path.to_path_buf(),
                size: workgroup_size,
            });
        }

        Ok(Self {
            stage,
            path: path.to_path_buf(),
            entry_point: entry_point.name.clone(),
            workgroup_size,
            source,
        })
    }
}

struct AttachedStage {
    source: ShaderSource,
    module: wgpu::ShaderModule,
}

enum Pipeline {
    Compute(wgpu::ComputePipeline),
    Render(wgpu::RenderPipeline),
}

/// What a program is linked against
pub struct LinkOptions<'a> {
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    /// Vertex buffer layouts, render programs only
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    /// Color target format, required for render programs
    pub color_format: Option<wgpu::TextureFormat>,
}

/// Compiled stages plus, once linked, the pipeline built from them
///
/// Call [`destroy`](Self::destroy) when done; dropping a program that was
/// never destroyed is logged.
pub struct ShaderProgram {
    label: String,
    stages: Vec<AttachedStage>,
    pipeline: Option<Pipeline>,
    destroyed: bool,
}

impl ShaderProgram {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stages: Vec::new(),
            pipeline: None,
            destroyed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Stages attached so far, in load order
    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        self.stages.iter().map(|s| s.source.stage)
    }

    /// Reads, compiles and attaches the shader at `path` for `stage`
    pub fn load_shader(
        &mut self,
        device: &wgpu::Device,
        stage: ShaderStage,
        path: impl AsRef<Path>,
    ) -> Result<(), ShaderError> {
        let source = ShaderSource::load(stage, path)?;
        self.attach(device, source);
        Ok(())
    }

    /// Attaches an already validated source
    pub fn attach(&mut self, device: &wgpu::Device, source: ShaderSource) {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&source.path.display().to_string()),
            source: wgpu::ShaderSource::Wgsl(source.source.as_str().into()),
        });
        log::debug!(
            "Attached {:?} shader {} to '{}'",
            source.stage,
            source.path.display(),
            self.label
        );
        self.stages.push(AttachedStage { source, module });
    }

    fn stage(&self, stage: ShaderStage) -> Option<&AttachedStage> {
        self.stages.iter().find(|s| s.source.stage == stage)
    }

    fn link_error(&self, log: impl Into<String>) -> ShaderError {
        let log = log.into();
        log::error!("shader program link failure '{}'\n{log}", self.label);
        ShaderError::Link {
            label: self.label.clone(),
            log,
        }
    }

    /// Links the attached stages: a lone compute stage becomes a compute
    /// pipeline, a vertex and fragment pair becomes a render pipeline
    pub fn link(
        &mut self,
        device: &wgpu::Device,
        options: &LinkOptions<'_>,
    ) -> Result<(), ShaderError> {
        if self.pipeline.is_some() {
            return Err(self.link_error("program is already linked"));
        }

        let count = |stage| self.stages.iter().filter(|s| s.source.stage == stage).count();
        let (compute, vertex, fragment) = (
            count(ShaderStage::Compute),
            count(ShaderStage::Vertex),
            count(ShaderStage::Fragment),
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", self.label)),
            bind_group_layouts: options.bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = match (compute, vertex, fragment) {
            (1, 0, 0) => self.build_compute(device, &layout),
            (0, 1, 1) => self.build_render(device, &layout, options)?,
            _ => {
                let _ = pollster::block_on(device.pop_error_scope());
                return Err(self.link_error(format!(
                    "expected one compute stage or one vertex and one fragment stage, \
                     found {compute} compute, {vertex} vertex, {fragment} fragment"
                )));
            }
        };
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(self.link_error(error.to_string()));
        }

        log::info!("Linked shader program '{}'", self.label);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn build_compute(&self, device: &wgpu::Device, layout: &wgpu::PipelineLayout) -> Pipeline {
        let Some(stage) = self.stage(ShaderStage::Compute) else {
            unreachable!("stage counts checked by link");
        };
        Pipeline::Compute(device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some(&self.label),
                layout: Some(layout),
                module: &stage.module,
                entry_point: Some(&stage.source.entry_point),
                compilation_options: Default::default(),
                cache: None,
            },
        ))
    }

    fn build_render(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        options: &LinkOptions<'_>,
    ) -> Result<Pipeline, ShaderError> {
        let (Some(vertex), Some(fragment)) = (
            self.stage(ShaderStage::Vertex),
            self.stage(ShaderStage::Fragment),
        ) else {
            unreachable!("stage counts checked by link");
        };
        let Some(format) = options.color_format else {
            let _ = pollster::block_on(device.pop_error_scope());
            return Err(self.link_error("render program needs a color format"));
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(&vertex.source.entry_point),
                buffers: options.vertex_buffers,
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(&fragment.source.entry_point),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });
        Ok(Pipeline::Render(pipeline))
    }

    pub fn compute_pipeline(&self) -> Result<&wgpu::ComputePipeline, ShaderError> {
        match &self.pipeline {
            Some(Pipeline::Compute(pipeline)) => Ok(pipeline),
            _ => Err(ShaderError::NotLinked {
                label: self.label.clone(),
                expected: "compute",
            }),
        }
    }

    pub fn render_pipeline(&self) -> Result<&wgpu::RenderPipeline, ShaderError> {
        match &self.pipeline {
            Some(Pipeline::Render(pipeline)) => Ok(pipeline),
            _ => Err(ShaderError::NotLinked {
                label: self.label.clone(),
                expected: "render",
            }),
        }
    }

    /// Makes this program current for subsequent dispatches in `pass`.
    /// It stays bound until the pass ends.
    pub fn bind_compute(&self, pass: &mut wgpu::ComputePass<'_>) -> Result<(), ShaderError> {
        pass.set_pipeline(self.compute_pipeline()?);
        Ok(())
    }

    /// Makes this program current for subsequent draws in `pass`.
    /// It stays bound until the pass ends.
    pub fn bind_render(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), ShaderError> {
        pass.set_pipeline(self.render_pipeline()?);
        Ok(())
    }

    /// Releases the pipeline and stage modules
    pub fn destroy(mut self) {
        log::debug!("Destroying shader program '{}'", self.label);
        self.destroyed = true;
        self.pipeline = None;
        self.stages.clear();
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if !self.destroyed {
            log::warn!("shader program '{}' dropped without destroy()", self.label);
        }
    }
}
