//! Texture handle for wgpu
//!
//! A [`Texture`] owns one GPU texture whose storage is allocated exactly
//! once. After allocation its contents change only through
//! [`Texture::sub_image`] uploads or shader writes through an
//! [`ImageBinding`].

use crate::error::TextureError;
use crate::wgpu_utils::binding_types;

/// Kind of texture a handle was created for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureTarget {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
}

impl TextureTarget {
    /// Size and dimension of the storage for this target, or `None` when
    /// storage allocation is not implemented for it
    pub fn storage_extent(
        self,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Option<(wgpu::Extent3d, wgpu::TextureDimension)> {
        let (size, dimension) = match self {
            TextureTarget::D1 => ((width, 1, 1), wgpu::TextureDimension::D1),
            TextureTarget::D2 => ((width, height, 1), wgpu::TextureDimension::D2),
            TextureTarget::D2Array | TextureTarget::D3 => {
                let dimension = if self == TextureTarget::D3 {
                    wgpu::TextureDimension::D3
                } else {
                    wgpu::TextureDimension::D2
                };
                ((width, height, depth), dimension)
            }
            TextureTarget::Cube => return None,
        };

        Some((
            wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: size.2,
            },
            dimension,
        ))
    }

    /// Whether rectangular uploads are implemented for this target
    pub fn supports_sub_image(self) -> bool {
        matches!(self, TextureTarget::D2)
    }

    /// Dimension of a single-level, single-layer view
    fn single_view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            TextureTarget::D1 => wgpu::TextureViewDimension::D1,
            TextureTarget::D3 => wgpu::TextureViewDimension::D3,
            TextureTarget::D2 | TextureTarget::D2Array | TextureTarget::Cube => {
                wgpu::TextureViewDimension::D2
            }
        }
    }

    /// The device limit `extent` breaks, if any
    fn exceeded_limit(self, extent: &wgpu::Extent3d, limits: &wgpu::Limits) -> Option<u32> {
        let (max_side, max_depth) = match self {
            TextureTarget::D1 => (limits.max_texture_dimension_1d, 1),
            TextureTarget::D2 | TextureTarget::Cube => (limits.max_texture_dimension_2d, 1),
            TextureTarget::D2Array => (
                limits.max_texture_dimension_2d,
                limits.max_texture_array_layers,
            ),
            TextureTarget::D3 => (
                limits.max_texture_dimension_3d,
                limits.max_texture_dimension_3d,
            ),
        };

        if extent.width > max_side || extent.height > max_side {
            Some(max_side)
        } else if extent.depth_or_array_layers > max_depth {
            Some(max_depth)
        } else {
            None
        }
    }

    fn has_layers(self) -> bool {
        matches!(self, TextureTarget::D2Array | TextureTarget::Cube)
    }
}

/// Filtering and addressing applied whenever the texture is sampled
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureParams {
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
    pub wrap_s: wgpu::AddressMode,
    pub wrap_t: wgpu::AddressMode,
    pub wrap_r: wgpu::AddressMode,
}

impl Default for TextureParams {
    /// Nearest filtering, clamped to the edge: cells stay crisp squares
    fn default() -> Self {
        Self {
            min_filter: wgpu::FilterMode::Nearest,
            mag_filter: wgpu::FilterMode::Nearest,
            wrap_s: wgpu::AddressMode::ClampToEdge,
            wrap_t: wgpu::AddressMode::ClampToEdge,
            wrap_r: wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Fixed shape of an allocated texture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StorageInfo {
    pub levels: u32,
    pub format: wgpu::TextureFormat,
    pub extent: wgpu::Extent3d,
    pub dimension: wgpu::TextureDimension,
}

impl StorageInfo {
    /// Validates a storage request for `target` against the device
    /// `limits` and returns its shape
    pub fn plan(
        label: &str,
        target: TextureTarget,
        levels: u32,
        format: wgpu::TextureFormat,
        (width, height, depth): (u32, u32, u32),
        limits: &wgpu::Limits,
    ) -> Result<Self, TextureError> {
        let (extent, dimension) = target.storage_extent(width, height, depth).ok_or_else(|| {
            TextureError::UnsupportedTarget {
                label: label.to_owned(),
                operation: "storage",
                target,
            }
        })?;

        let invalid = extent.width == 0
            || extent.height == 0
            || extent.depth_or_array_layers == 0
            || levels == 0
            || levels > extent.max_mips(dimension);
        if invalid {
            return Err(TextureError::InvalidSize {
                label: label.to_owned(),
                levels,
                width,
                height,
                depth,
            });
        }

        if let Some(limit) = target.exceeded_limit(&extent, limits) {
            return Err(TextureError::TooLarge {
                label: label.to_owned(),
                width: extent.width,
                height: extent.height,
                depth: extent.depth_or_array_layers,
                limit,
            });
        }

        Ok(Self {
            levels,
            format,
            extent,
            dimension,
        })
    }

    /// Width and height of mip `level`
    pub fn level_size(&self, level: u32) -> (u32, u32) {
        let size = self.extent.mip_level_size(level, self.dimension);
        (size.width, size.height)
    }

    pub fn layers(&self) -> u32 {
        match self.dimension {
            wgpu::TextureDimension::D2 => self.extent.depth_or_array_layers,
            _ => 1,
        }
    }

    /// Bytes per texel of the storage format
    pub fn texel_size(&self, label: &str) -> Result<u32, TextureError> {
        self.format
            .block_copy_size(None)
            .ok_or_else(|| TextureError::UnsizedFormat {
                label: label.to_owned(),
                format: self.format,
            })
    }

    /// Checks that a rectangular upload fits in `level` and that `len`
    /// bytes describe it exactly. Returns the row pitch in bytes.
    #[allow(clippy::too_many_arguments)]
    pub fn check_region(
        &self,
        label: &str,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        len: usize,
    ) -> Result<u32, TextureError> {
        if level >= self.levels {
            return Err(TextureError::LevelOutOfRange {
                label: label.to_owned(),
                level,
                levels: self.levels,
            });
        }

        let (level_width, level_height) = self.level_size(level);
        let fits = x.checked_add(width).is_some_and(|r| r <= level_width)
            && y.checked_add(height).is_some_and(|b| b <= level_height);
        if !fits {
            return Err(TextureError::RegionOutOfBounds {
                label: label.to_owned(),
                x,
                y,
                width,
                height,
                level_width,
                level_height,
            });
        }

        let bytes_per_row = width * self.texel_size(label)?;
        let expected = bytes_per_row as usize * height as usize;
        if len != expected {
            return Err(TextureError::PixelLength {
                label: label.to_owned(),
                expected,
                actual: len,
            });
        }
        Ok(bytes_per_row)
    }
}

/// A texture exposed to a compute stage as a storage image
pub struct ImageBinding {
    pub unit: u32,
    pub view: wgpu::TextureView,
    pub ty: wgpu::BindingType,
}

impl ImageBinding {
    pub fn layout_entry(&self) -> wgpu::BindGroupLayoutEntry {
        binding_types::layout_entry(self.unit, wgpu::ShaderStages::COMPUTE, self.ty)
    }

    pub fn entry(&self) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding: self.unit,
            resource: wgpu::BindingResource::TextureView(&self.view),
        }
    }
}

/// A texture exposed for sampling or `textureLoad`
pub struct SampledBinding {
    pub unit: u32,
    pub view: wgpu::TextureView,
    pub sample_type: wgpu::TextureSampleType,
}

impl SampledBinding {
    pub fn layout_entry(&self, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        binding_types::layout_entry(
            self.unit,
            visibility,
            binding_types::texture_2d(self.sample_type),
        )
    }

    pub fn entry(&self) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding: self.unit,
            resource: wgpu::BindingResource::TextureView(&self.view),
        }
    }
}

struct Allocated {
    texture: wgpu::Texture,
    info: StorageInfo,
}

/// Owning handle for one GPU texture
///
/// The handle is created empty; [`storage`](Self::storage) allocates the
/// GPU object once and fixes its levels, format and size for good.
pub struct Texture {
    label: String,
    target: TextureTarget,
    params: TextureParams,
    usage: wgpu::TextureUsages,
    storage: Option<Allocated>,
}

impl Texture {
    pub fn new(label: impl Into<String>, target: TextureTarget) -> Self {
        Self {
            label: label.into(),
            target,
            params: TextureParams::default(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            storage: None,
        }
    }

    pub fn with_params(mut self, params: TextureParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    /// Shape of the allocated storage
    pub fn info(&self) -> Result<&StorageInfo, TextureError> {
        self.allocated().map(|a| &a.info)
    }

    /// The underlying GPU texture
    pub fn handle(&self) -> Result<&wgpu::Texture, TextureError> {
        self.allocated().map(|a| &a.texture)
    }

    fn allocated(&self) -> Result<&Allocated, TextureError> {
        self.storage.as_ref().ok_or_else(|| TextureError::NotAllocated {
            label: self.label.clone(),
        })
    }

    /// Allocates immutable storage sized for the target
    ///
    /// # Errors
    /// Cube maps are not implemented. Sizes must be non-zero and within the
    /// device limits. A handle can only be allocated once.
    pub fn storage(
        &mut self,
        device: &wgpu::Device,
        levels: u32,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<(), TextureError> {
        if self.storage.is_some() {
            return Err(TextureError::AlreadyAllocated {
                label: self.label.clone(),
            });
        }

        let info = StorageInfo::plan(
            &self.label,
            self.target,
            levels,
            format,
            (width, height, depth),
            &device.limits(),
        )?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.label),
            size: info.extent,
            mip_level_count: info.levels,
            sample_count: 1,
            dimension: info.dimension,
            format: info.format,
            usage: self.usage,
            view_formats: &[],
        });

        log::debug!(
            "Allocated texture '{}' {:?} {}x{}x{} ({} level(s), {:?})",
            self.label,
            self.target,
            info.extent.width,
            info.extent.height,
            info.extent.depth_or_array_layers,
            info.levels,
            info.format
        );

        self.storage = Some(Allocated { texture, info });
        Ok(())
    }

    /// Uploads a `width` x `height` region of texels at `(x, y)` of `level`
    #[allow(clippy::too_many_arguments)]
    pub fn sub_image(
        &self,
        queue: &wgpu::Queue,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        if !self.target.supports_sub_image() {
            return Err(TextureError::UnsupportedTarget {
                label: self.label.clone(),
                operation: "sub_image",
                target: self.target,
            });
        }

        let allocated = self.allocated()?;
        let bytes_per_row = allocated.info.check_region(
            &self.label,
            level,
            x,
            y,
            width,
            height,
            pixels.len(),
        )?;

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &allocated.texture,
                mip_level: level,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Exposes one level and layer to a compute stage as a storage image
    pub fn bind_as_image(
        &self,
        unit: u32,
        level: u32,
        layer: u32,
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
    ) -> Result<ImageBinding, TextureError> {
        let allocated = self.allocated()?;
        let info = &allocated.info;

        if level >= info.levels {
            return Err(TextureError::LevelOutOfRange {
                label: self.label.clone(),
                level,
                levels: info.levels,
            });
        }
        if layer >= info.layers() {
            return Err(TextureError::LayerOutOfRange {
                label: self.label.clone(),
                layer,
                layers: info.layers(),
            });
        }
        if format != info.format {
            return Err(TextureError::FormatMismatch {
                label: self.label.clone(),
                requested: format,
                storage: info.format,
            });
        }

        let view_dimension = self.target.single_view_dimension();
        let view = allocated.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{} image {unit}", self.label)),
            format: Some(format),
            dimension: Some(view_dimension),
            base_mip_level: level,
            mip_level_count: Some(1),
            base_array_layer: if self.target.has_layers() { layer } else { 0 },
            array_layer_count: Some(1),
            ..Default::default()
        });

        let ty = match view_dimension {
            wgpu::TextureViewDimension::D1 => binding_types::image_1d(format, access),
            wgpu::TextureViewDimension::D3 => binding_types::image_3d(format, access),
            _ => binding_types::image_2d(format, access),
        };

        Ok(ImageBinding { unit, view, ty })
    }

    /// Exposes the whole texture for sampling at `unit`
    pub fn bind(&self, unit: u32) -> Result<SampledBinding, TextureError> {
        let allocated = self.allocated()?;
        let sample_type = allocated
            .info
            .format
            .sample_type(None, None)
            .unwrap_or(wgpu::TextureSampleType::Float { filterable: false });

        let view = allocated.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{} sampled {unit}", self.label)),
            ..Default::default()
        });

        Ok(SampledBinding {
            unit,
            view,
            sample_type,
        })
    }

    /// Creates a sampler from the handle's params
    pub fn sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", self.label)),
            address_mode_u: self.params.wrap_s,
            address_mode_v: self.params.wrap_t,
            address_mode_w: self.params.wrap_r,
            mag_filter: self.params.mag_filter,
            min_filter: self.params.min_filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }

    /// Copies level 0 of a 2D texture back to the CPU, blocking until the
    /// GPU is done. Rows are returned tightly packed.
    pub fn read_pixels(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<u8>, TextureError> {
        if !self.target.supports_sub_image() {
            return Err(TextureError::UnsupportedTarget {
                label: self.label.clone(),
                operation: "read_pixels",
                target: self.target,
            });
        }

        let allocated = self.allocated()?;
        let (width, height) = allocated.info.level_size(0);
        let unpadded = width * allocated.info.texel_size(&self.label)?;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} readback", self.label)),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &allocated.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let readback_error = |reason: String| TextureError::Readback {
            label: self.label.clone(),
            reason,
        };

        let slice = staging.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| readback_error(e.to_string()))?;

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(readback_error(e.to_string())),
            Err(e) => return Err(readback_error(e.to_string())),
        }

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(unpadded as usize * height as usize);
        for row in mapped.chunks_exact(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(mapped);
        staging.unmap();

        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::context::required_limits;

    const RGBA32: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

    fn plan(
        target: TextureTarget,
        levels: u32,
        size: (u32, u32, u32),
    ) -> Result<StorageInfo, TextureError> {
        StorageInfo::plan("t", target, levels, RGBA32, size, &required_limits())
    }

    #[test]
    fn test_storage_extent_per_target() {
        let (extent, dim) = TextureTarget::D1.storage_extent(8, 4, 2).unwrap();
        assert_eq!((extent.width, extent.height, extent.depth_or_array_layers), (8, 1, 1));
        assert_eq!(dim, wgpu::TextureDimension::D1);

        let (extent, dim) = TextureTarget::D2.storage_extent(8, 4, 2).unwrap();
        assert_eq!((extent.width, extent.height, extent.depth_or_array_layers), (8, 4, 1));
        assert_eq!(dim, wgpu::TextureDimension::D2);

        let (extent, dim) = TextureTarget::D2Array.storage_extent(8, 4, 2).unwrap();
        assert_eq!(extent.depth_or_array_layers, 2);
        assert_eq!(dim, wgpu::TextureDimension::D2);

        let (extent, dim) = TextureTarget::D3.storage_extent(8, 4, 2).unwrap();
        assert_eq!(extent.depth_or_array_layers, 2);
        assert_eq!(dim, wgpu::TextureDimension::D3);
    }

    #[test]
    fn test_cube_storage_is_unsupported() {
        assert!(TextureTarget::Cube.storage_extent(8, 8, 6).is_none());
        let err = plan(TextureTarget::Cube, 1, (8, 8, 6)).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedTarget { operation: "storage", .. }));
    }

    #[test]
    fn test_plan_rejects_bad_sizes() {
        assert!(plan(TextureTarget::D2, 1, (0, 4, 0)).is_err());
        assert!(plan(TextureTarget::D2, 0, (4, 4, 0)).is_err());
        // 4x4 has three mips at most
        assert!(plan(TextureTarget::D2, 3, (4, 4, 0)).is_ok());
        assert!(plan(TextureTarget::D2, 4, (4, 4, 0)).is_err());
    }

    #[test]
    fn test_plan_rejects_sizes_over_device_limits() {
        let limits = required_limits();
        let max = limits.max_texture_dimension_2d;

        assert!(plan(TextureTarget::D2, 1, (max, 10, 0)).is_ok());
        assert!(matches!(
            plan(TextureTarget::D2, 1, (5000, 10, 0)),
            Err(TextureError::TooLarge { width: 5000, limit: 4096, .. })
        ));
        assert!(matches!(
            plan(TextureTarget::D2, 1, (10, max + 1, 0)),
            Err(TextureError::TooLarge { .. })
        ));
        assert!(matches!(
            plan(TextureTarget::D2Array, 1, (8, 8, limits.max_texture_array_layers + 1)),
            Err(TextureError::TooLarge { .. })
        ));
        assert!(matches!(
            plan(TextureTarget::D1, 1, (limits.max_texture_dimension_1d + 1, 1, 1)),
            Err(TextureError::TooLarge { .. })
        ));
        assert!(matches!(
            plan(TextureTarget::D3, 1, (4, 4, limits.max_texture_dimension_3d + 1)),
            Err(TextureError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_region_checks() {
        let info = plan(TextureTarget::D2, 2, (8, 4, 0)).unwrap();

        assert_eq!(info.check_region("t", 0, 0, 0, 8, 4, 8 * 4 * 16).unwrap(), 8 * 16);
        assert_eq!(info.check_region("t", 0, 6, 3, 2, 1, 2 * 16).unwrap(), 2 * 16);
        assert_eq!(info.level_size(1), (4, 2));

        assert!(matches!(
            info.check_region("t", 0, 7, 0, 2, 1, 2 * 16),
            Err(TextureError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            info.check_region("t", 1, 0, 0, 8, 4, 8 * 4 * 16),
            Err(TextureError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            info.check_region("t", 2, 0, 0, 1, 1, 16),
            Err(TextureError::LevelOutOfRange { .. })
        ));
        assert!(matches!(
            info.check_region("t", 0, 0, 0, 2, 2, 63),
            Err(TextureError::PixelLength { expected: 64, actual: 63, .. })
        ));
        assert!(matches!(
            info.check_region("t", 0, u32::MAX, 0, 2, 1, 32),
            Err(TextureError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_sub_image_only_for_2d() {
        assert!(TextureTarget::D2.supports_sub_image());
        for target in [
            TextureTarget::D1,
            TextureTarget::D2Array,
            TextureTarget::D3,
            TextureTarget::Cube,
        ] {
            assert!(!target.supports_sub_image(), "{target:?}");
        }
    }

    #[test]
    fn test_unallocated_handle() {
        let texture = Texture::new("empty", TextureTarget::D2);
        assert!(!texture.is_allocated());
        assert!(matches!(texture.info(), Err(TextureError::NotAllocated { .. })));
        assert!(matches!(texture.bind(0), Err(TextureError::NotAllocated { .. })));
    }

    #[test]
    fn test_default_params_are_nearest_clamped() {
        let texture = Texture::new("t", TextureTarget::D2);
        assert_eq!(texture.params().min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(texture.params().mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(texture.params().wrap_s, wgpu::AddressMode::ClampToEdge);
        assert_eq!(texture.params().wrap_t, wgpu::AddressMode::ClampToEdge);
    }
}
