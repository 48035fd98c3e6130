use std::collections::HashMap;

use crate::error::PipelineError;
use crate::render::common::{
    begin_color_pass, opaque_target, triangle_list, QuadBuffers, QuadVertex, QUAD_INDEX_COUNT,
};
use crate::render::{OffscreenSurface, RenderCtx, RenderTarget};

use super::params::{ParameterBundle, SubMode, Variant};
use super::program::{param, ParamKind, ResourceKind, ShaderProgram, Technique};

/// Runs the selected FXAA technique over the offscreen surface, writing the
/// antialiased image to the presentation target.
///
/// Everything the pass needs from the program is resolved by name before any
/// command is recorded. A failed lookup leaves the target untouched.
pub struct PostProcessStage {
    program: ShaderProgram,

    shader: Option<wgpu::ShaderModule>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<(Technique, wgpu::TextureFormat), wgpu::RenderPipeline>,
    // Creation failures, kept so a rejected program is not rebuilt each frame.
    layout_error: Option<PipelineError>,
    pipeline_errors: HashMap<(Technique, wgpu::TextureFormat), PipelineError>,

    ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    quad: Option<QuadBuffers>,
}

/// Program lookups for one technique, with the uniform block already encoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedPass {
    pub technique: Technique,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub uniform_binding: u32,
    pub uniform_bytes: Vec<u8>,
    pub texture_binding: u32,
    pub sampler_binding: u32,
}

impl PostProcessStage {
    pub fn new(program: ShaderProgram) -> Self {
        Self {
            program,
            shader: None,
            bind_group_layout: None,
            pipeline_layout: None,
            pipelines: HashMap::new(),
            layout_error: None,
            pipeline_errors: HashMap::new(),
            ubo: None,
            sampler: None,
            quad: None,
        }
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Records one full-target draw of `mode`'s technique.
    ///
    /// `bundle` must have been computed for `mode`; a mismatch is reported as a
    /// binding failure. Returns the technique that ran.
    pub fn apply(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        surface: &OffscreenSurface,
        mode: SubMode,
        bundle: &ParameterBundle,
    ) -> Result<Technique, PipelineError> {
        let source = surface.as_texture()?;
        let pass = resolve(&self.program, mode, bundle)?;

        self.ensure_layout(ctx, &pass)?;
        self.ensure_pipeline(ctx, &pass)?;
        self.ensure_buffers(ctx, pass.uniform_bytes.len() as u64);

        let key = (pass.technique, ctx.surface_format);
        let (Some(pipeline), Some(bgl), Some(ubo), Some(sampler), Some(quad)) = (
            self.pipelines.get(&key),
            self.bind_group_layout.as_ref(),
            self.ubo.as_ref(),
            self.sampler.as_ref(),
            self.quad.as_ref(),
        ) else {
            return Err(PipelineError::resource("post-process resources unavailable"));
        };

        ctx.queue.write_buffer(ubo, 0, &pass.uniform_bytes);

        let bind_group = validated(ctx.device, "fxaa bind group", || {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen fxaa bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: pass.uniform_binding,
                        resource: ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: pass.texture_binding,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: pass.sampler_binding,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        })?;

        let mut rpass = begin_color_pass(
            target.encoder,
            target.color_view,
            "lumen fxaa pass",
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        quad.bind(&mut rpass);
        rpass.draw_indexed(0..QUAD_INDEX_COUNT, 0, 0..1);

        Ok(pass.technique)
    }

    fn ensure_layout(&mut self, ctx: &RenderCtx<'_>, pass: &ResolvedPass) -> Result<(), PipelineError> {
        if self.pipeline_layout.is_some() {
            return Ok(());
        }
        if let Some(err) = &self.layout_error {
            return Err(err.clone());
        }

        let built = validated(ctx.device, "fxaa program layout", || self.build_layout(ctx, pass));
        match built {
            Ok((shader, bind_group_layout, pipeline_layout)) => {
                self.shader = Some(shader);
                self.bind_group_layout = Some(bind_group_layout);
                self.pipeline_layout = Some(pipeline_layout);
                Ok(())
            }
            Err(err) => {
                self.layout_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn build_layout(
        &self,
        ctx: &RenderCtx<'_>,
        pass: &ResolvedPass,
    ) -> (wgpu::ShaderModule, wgpu::BindGroupLayout, wgpu::PipelineLayout) {
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.program.label()),
            source: wgpu::ShaderSource::Wgsl(self.program.source().into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen fxaa bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: pass.uniform_binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(pass.uniform_bytes.len() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: pass.texture_binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: pass.sampler_binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen fxaa pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        (shader, bind_group_layout, pipeline_layout)
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, pass: &ResolvedPass) -> Result<(), PipelineError> {
        let format = ctx.surface_format;
        let key = (pass.technique, format);
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        if let Some(err) = self.pipeline_errors.get(&key) {
            return Err(err.clone());
        }
        let (Some(shader), Some(layout)) = (self.shader.as_ref(), self.pipeline_layout.as_ref()) else {
            return Err(PipelineError::resource("fxaa pipeline layout unavailable"));
        };

        let label = format!("lumen fxaa {} pipeline", pass.technique.name());
        let built = validated(ctx.device, &label, || {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(&pass.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[QuadVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(&pass.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(opaque_target(format))],
                }),
                primitive: triangle_list(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });

        match built {
            Ok(pipeline) => {
                log::debug!("fxaa pipeline built: technique={} format={format:?}", pass.technique.name());
                self.pipelines.insert(key, pipeline);
                Ok(())
            }
            Err(err) => {
                self.pipeline_errors.insert(key, err.clone());
                Err(err)
            }
        }
    }

    fn ensure_buffers(&mut self, ctx: &RenderCtx<'_>, ubo_size: u64) {
        if self.ubo.as_ref().map(wgpu::Buffer::size) != Some(ubo_size) {
            self.ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen fxaa params ubo"),
                size: ubo_size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("lumen fxaa linear sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::new(ctx.device, "lumen fxaa"));
        }
    }
}

/// Runs `create` inside a validation error scope, turning a rejected object
/// into a binding failure instead of an uncaptured device error.
fn validated<T>(device: &wgpu::Device, what: &str, create: impl FnOnce() -> T) -> Result<T, PipelineError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(PipelineError::binding(format!("{what} rejected: {err}"))),
    }
}

/// Resolves the technique, parameters and resources `mode` needs from `program`.
pub(crate) fn resolve(
    program: &ShaderProgram,
    mode: SubMode,
    bundle: &ParameterBundle,
) -> Result<ResolvedPass, PipelineError> {
    if bundle.sub_mode() != mode {
        return Err(PipelineError::binding(format!(
            "parameters were computed for {:?}, not {mode:?}",
            bundle.sub_mode()
        )));
    }

    let technique = mode.technique();
    let fragment_entry = program.technique(technique)?.to_string();
    let vertex_entry = program.vertex_entry()?.to_string();
    let uniform_bytes = encode_uniforms(program, bundle)?;

    let block = program.uniform_block()?;
    let texture = program.resource(param::TEX_SCREEN, ResourceKind::Texture)?;
    let sampler = program.sampler()?;

    let groups = [block.group, texture.group, sampler.group];
    if groups.iter().any(|&g| g != 0) {
        return Err(PipelineError::binding(format!(
            "all program resources must live in bind group 0 (got {groups:?})"
        )));
    }
    let bindings = [block.binding, texture.binding, sampler.binding];
    if bindings[0] == bindings[1] || bindings[0] == bindings[2] || bindings[1] == bindings[2] {
        return Err(PipelineError::binding(format!("overlapping bindings {bindings:?}")));
    }

    Ok(ResolvedPass {
        technique,
        vertex_entry,
        fragment_entry,
        uniform_binding: block.binding,
        uniform_bytes,
        texture_binding: texture.binding,
        sampler_binding: sampler.binding,
    })
}

/// Lays out `bundle` at the program's reflected offsets.
///
/// The block starts zeroed; only the inverse viewport size and the active
/// variant's parameters are written.
pub fn encode_uniforms(program: &ShaderProgram, bundle: &ParameterBundle) -> Result<Vec<u8>, PipelineError> {
    let block = program.uniform_block()?;
    // Uniform buffer bindings are sized in 16-byte rows.
    let size = (block.size as usize).div_ceil(16).max(1) * 16;
    let mut bytes = vec![0u8; size];

    let mut put = |name: &str, value: &[f32]| -> Result<(), PipelineError> {
        let slot = program.param(name)?;
        let expected = match slot.kind {
            ParamKind::F32 => 1,
            ParamKind::Vec4F32 => 4,
        };
        if value.len() != expected {
            return Err(PipelineError::binding(format!(
                "parameter `{name}` is {:?}, got {} floats",
                slot.kind,
                value.len()
            )));
        }
        let data: &[u8] = bytemuck::cast_slice(value);
        let start = slot.offset as usize;
        bytes
            .get_mut(start..start + data.len())
            .ok_or_else(|| PipelineError::binding(format!("parameter `{name}` lies outside the uniform block")))?
            .copy_from_slice(data);
        Ok(())
    };

    put(param::INV_VIEWPORT_WIDTH, &[bundle.inv_width])?;
    put(param::INV_VIEWPORT_HEIGHT, &[bundle.inv_height])?;

    match &bundle.variant {
        Variant::Console(c) => {
            put(param::CONSOLE_OPT1, &c.opt1)?;
            put(param::CONSOLE_OPT2, &c.opt2)?;
            put(param::CONSOLE_EDGE_SHARPNESS, &[c.edge_sharpness])?;
            put(param::CONSOLE_EDGE_THRESHOLD, &[c.edge_threshold])?;
            put(param::CONSOLE_EDGE_THRESHOLD_MIN, &[c.edge_threshold_min])?;
        }
        Variant::Quality(q) => {
            put(param::QUALITY_SUBPIX, &[q.subpixel_blend])?;
            put(param::QUALITY_EDGE_THRESHOLD, &[q.edge_threshold])?;
            put(param::QUALITY_EDGE_THRESHOLD_MIN, &[q.edge_threshold_min])?;
        }
    }

    Ok(bytes)
}
