use crate::error::PipelineError;

const WHAT: &str = "offscreen surface";

/// Fixed-size color buffer the scene pass renders into.
///
/// The surface is written by the scene pass and read once per frame by either
/// the post-process stage or the direct blit. Both passes are recorded into the
/// same encoder, scene first, which orders the write before the read.
///
/// Dimensions never change; a new output resolution requires a new surface.
/// `dispose()` must be called once before the device is torn down.
pub struct OffscreenSurface {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,

    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
}

impl OffscreenSurface {
    /// Usages required for a surface that is both rendered to and sampled.
    pub const REQUIRED_USAGES: wgpu::TextureUsages =
        wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

    /// Allocates a surface of `width` x `height` in `format`.
    pub fn create(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        validate_extent(width, height, device.limits().max_texture_dimension_2d)?;

        let allowed = format.guaranteed_format_features(device.features()).allowed_usages;
        if !allowed.contains(Self::REQUIRED_USAGES) {
            return Err(PipelineError::resource(format!(
                "format {format:?} cannot be both rendered to and sampled"
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen offscreen surface"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: Self::REQUIRED_USAGES | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("offscreen surface created: {width}x{height} {format:?}");

        Ok(Self {
            width,
            height,
            format,
            texture: Some(texture),
            view: Some(view),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.texture.is_none()
    }

    /// Writable view for the scene pass.
    pub fn as_render_target(&self) -> Result<&wgpu::TextureView, PipelineError> {
        self.view.as_ref().ok_or(PipelineError::UseAfterDispose(WHAT))
    }

    /// Sampling view for the post-process / blit pass.
    pub fn as_texture(&self) -> Result<&wgpu::TextureView, PipelineError> {
        self.view.as_ref().ok_or(PipelineError::UseAfterDispose(WHAT))
    }

    /// Underlying texture (copy source for readback).
    pub fn texture(&self) -> Result<&wgpu::Texture, PipelineError> {
        self.texture.as_ref().ok_or(PipelineError::UseAfterDispose(WHAT))
    }

    /// Releases the GPU texture. A second call fails with `UseAfterDispose`.
    pub fn dispose(&mut self) -> Result<(), PipelineError> {
        let texture = self.texture.take().ok_or(PipelineError::UseAfterDispose(WHAT))?;
        self.view = None;
        texture.destroy();
        log::debug!("offscreen surface disposed ({}x{})", self.width, self.height);
        Ok(())
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            log::warn!("offscreen surface dropped without dispose(); releasing now");
            self.view = None;
            texture.destroy();
        }
    }
}

/// Checks that a surface extent is allocatable under `max_dim`.
pub(crate) fn validate_extent(width: u32, height: u32, max_dim: u32) -> Result<(), PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::resource(format!(
            "offscreen surface must be non-empty (got {width}x{height})"
        )));
    }
    if width > max_dim || height > max_dim {
        return Err(PipelineError::resource(format!(
            "offscreen surface {width}x{height} exceeds device limit {max_dim}"
        )));
    }
    Ok(())
}
