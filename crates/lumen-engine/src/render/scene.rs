use crate::asset::SourceImage;
use crate::coords::{Rect, Vec2, Viewport};
use crate::error::PipelineError;

use super::common::{
    begin_color_pass, premul_alpha_blend, triangle_list, ubo_min_binding_size, QuadBuffers,
    QuadVertex, SpriteUniform, QUAD_INDEX_COUNT,
};
use super::offscreen::OffscreenSurface;
use super::RenderCtx;

/// Scene pass: clears the offscreen surface and draws the source image at a
/// fixed position, native size.
///
/// Without an image the pass only clears. The image is uploaded on first use
/// and the CPU copy released.
pub struct SceneRenderer {
    origin: Vec2,
    clear: wgpu::Color,

    pending_upload: Option<SourceImage>,
    image_size: Option<(u32, u32)>,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    sprite_ubo: Option<wgpu::Buffer>,
    quad: Option<QuadBuffers>,

    image_view: Option<wgpu::TextureView>,
    sampler: Option<wgpu::Sampler>,
}

impl SceneRenderer {
    pub fn new(image: Option<SourceImage>, origin: Vec2, clear: wgpu::Color) -> Self {
        let image_size = image.as_ref().map(|i| (i.width(), i.height()));
        Self {
            origin,
            clear,
            pending_upload: image,
            image_size,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            sprite_ubo: None,
            quad: None,
            image_view: None,
            sampler: None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_size.is_some()
    }

    /// Destination rect of the image in target pixels.
    pub fn placement(&self) -> Option<Rect> {
        let (w, h) = self.image_size?;
        Some(Rect::from_origin_size(self.origin, Vec2::new(w as f32, h as f32)))
    }

    /// Records the scene pass into `encoder`, targeting `surface`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        surface: &OffscreenSurface,
    ) -> Result<(), PipelineError> {
        let view = surface.as_render_target()?;
        let (sw, sh) = surface.size();

        let visible = self
            .placement()
            .and_then(|r| r.intersect(Rect::covering(Viewport::new(sw, sh))))
            .is_some();

        if !visible {
            // Clear-only pass.
            let _rpass = begin_color_pass(encoder, view, "lumen scene pass", wgpu::LoadOp::Clear(self.clear));
            return Ok(());
        }

        self.ensure_pipeline(ctx, surface.format());
        self.ensure_image(ctx);
        self.ensure_bindings(ctx);
        self.write_sprite_uniform(ctx, sw, sh);

        let (Some(pipeline), Some(bind_group), Some(quad)) =
            (self.pipeline.as_ref(), self.bind_group.as_ref(), self.quad.as_ref())
        else {
            return Err(PipelineError::resource("scene pass resources unavailable"));
        };

        let mut rpass = begin_color_pass(encoder, view, "lumen scene pass", wgpu::LoadOp::Clear(self.clear));
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        quad.bind(&mut rpass);
        rpass.draw_indexed(0..QUAD_INDEX_COUNT, 0, 0..1);

        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen scene bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: ubo_min_binding_size::<SpriteUniform>(),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen scene pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen scene pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: triangle_list(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("scene pipeline built for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
    }

    fn ensure_image(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "lumen scene"));
        }
        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("lumen scene sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        let Some(image) = self.pending_upload.take() else { return };

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen source image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width() * 4),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        self.image_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.bind_group = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.sprite_ubo.is_some() {
            return;
        }
        let (Some(bgl), Some(view), Some(sampler)) =
            (self.bind_group_layout.as_ref(), self.image_view.as_ref(), self.sampler.as_ref())
        else {
            return;
        };

        let ubo = match self.sprite_ubo.take() {
            Some(ubo) => ubo,
            None => ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen scene sprite ubo"),
                size: std::mem::size_of::<SpriteUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen scene bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.sprite_ubo = Some(ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_sprite_uniform(&self, ctx: &RenderCtx<'_>, width: u32, height: u32) {
        let (Some(ubo), Some(rect)) = (self.sprite_ubo.as_ref(), self.placement()) else { return };
        let u = sprite_uniform(rect, width, height);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }
}

fn sprite_uniform(rect: Rect, width: u32, height: u32) -> SpriteUniform {
    SpriteUniform {
        viewport: [width.max(1) as f32, height.max(1) as f32],
        _pad: [0.0; 2],
        origin: [rect.origin.x, rect.origin.y],
        size: [rect.size.x, rect.size.y],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> SourceImage {
        SourceImage::from_rgba8(w, h, vec![255; (w * h * 4) as usize]).unwrap()
    }

    #[test]
    fn placement_is_native_size_at_origin() {
        let scene = SceneRenderer::new(Some(image(64, 32)), Vec2::new(10.0, 20.0), wgpu::Color::BLACK);
        assert!(scene.has_image());
        assert_eq!(scene.placement(), Some(Rect::new(10.0, 20.0, 64.0, 32.0)));
    }

    #[test]
    fn no_image_means_no_placement() {
        let scene = SceneRenderer::new(None, Vec2::zero(), wgpu::Color::BLACK);
        assert!(!scene.has_image());
        assert_eq!(scene.placement(), None);
    }

    #[test]
    fn sprite_uniform_carries_target_size_and_rect() {
        let u = sprite_uniform(Rect::new(1.0, 2.0, 3.0, 4.0), 1200, 700);
        assert_eq!(u.viewport, [1200.0, 700.0]);
        assert_eq!(u.origin, [1.0, 2.0]);
        assert_eq!(u.size, [3.0, 4.0]);
    }
}
