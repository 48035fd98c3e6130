use crate::error::PipelineError;

use super::common::{begin_color_pass, opaque_target, triangle_list, QuadBuffers, QuadVertex, QUAD_INDEX_COUNT};
use super::offscreen::OffscreenSurface;
use super::{RenderCtx, RenderTarget};

/// Unfiltered copy of the offscreen surface onto the presentation target.
///
/// Used whenever antialiasing is off or unavailable. Texels are fetched with
/// integer coordinates, so the target receives the surface contents exactly.
#[derive(Default)]
pub struct BlitStage {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    quad: Option<QuadBuffers>,
}

impl BlitStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one opaque full-target draw sourcing `surface`.
    pub fn apply(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        surface: &OffscreenSurface,
    ) -> Result<(), PipelineError> {
        let source = surface.as_texture()?;
        self.ensure_pipeline(ctx);

        let (Some(pipeline), Some(bgl)) = (self.pipeline.as_ref(), self.bind_group_layout.as_ref()) else {
            return Err(PipelineError::resource("blit pipeline unavailable"));
        };
        let quad = self.quad.get_or_insert_with(|| QuadBuffers::new(ctx.device, "lumen blit"));

        // Rebuilt every frame; the source view can change on surface recreation.
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen blit bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(source),
            }],
        });

        let mut rpass = begin_color_pass(
            target.encoder,
            target.color_view,
            "lumen blit pass",
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        quad.bind(&mut rpass);
        rpass.draw_indexed(0..QUAD_INDEX_COUNT, 0, 0..1);

        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        let format = ctx.surface_format;
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen blit bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen blit pipeline"),
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
                targets: &[Some(opaque_target(format))],
            }),
            primitive: triangle_list(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("blit pipeline built for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
    }
}
