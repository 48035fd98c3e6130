use std::collections::HashSet;

use crate::coords::Viewport;
use crate::error::PipelineError;
use crate::input::ToggleSignals;
use crate::post::{FxaaTunables, PostProcessStage, ShaderProgram};
use crate::render::{BlitStage, OffscreenSurface, RenderCtx, RenderTarget, SceneRenderer};

use super::mode::{decide, AaMode, AaState, BlitReason, EffectiveMode, FramePath};

/// What one encoded frame did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub mode: AaMode,
    pub path: FramePath,
}

/// Drives the per-frame pipeline: scene pass into the offscreen surface, then
/// either the FXAA pass or a direct blit onto the presentation target.
///
/// Mode changes are only taken in `begin_frame`, so a frame never observes a
/// mode change halfway through.
pub struct FrameController {
    surface: OffscreenSurface,
    scene: SceneRenderer,
    blit: BlitStage,
    post: Option<PostProcessStage>,

    state: AaState,
    tunables: FxaaTunables,
    failures: FailureLog,
}

impl FrameController {
    /// Allocates the offscreen surface at `viewport` in `format`.
    ///
    /// `program: None` disables antialiasing for the lifetime of the controller.
    pub fn new(
        device: &wgpu::Device,
        viewport: Viewport,
        format: wgpu::TextureFormat,
        scene: SceneRenderer,
        program: Option<ShaderProgram>,
        tunables: FxaaTunables,
        initial: AaState,
    ) -> Result<Self, PipelineError> {
        let surface = OffscreenSurface::create(device, viewport.width, viewport.height, format)?;

        if program.is_none() {
            log::warn!("no FXAA program loaded; frames will be blitted unprocessed");
        }

        Ok(Self {
            surface,
            scene,
            blit: BlitStage::new(),
            post: program.map(PostProcessStage::new),
            state: initial,
            tunables,
            failures: FailureLog::default(),
        })
    }

    pub fn mode(&self) -> AaMode {
        self.state.mode()
    }

    /// Requested mode together with whether it can actually run.
    pub fn effective_mode(&self) -> EffectiveMode {
        EffectiveMode {
            requested: self.state.mode(),
            program_available: self.post.is_some(),
        }
    }

    pub fn state(&self) -> AaState {
        self.state
    }

    pub fn program_available(&self) -> bool {
        self.post.is_some()
    }

    pub fn surface(&self) -> &OffscreenSurface {
        &self.surface
    }

    /// Applies toggle events sampled at the start of the frame.
    pub fn begin_frame(&mut self, signals: ToggleSignals) -> AaMode {
        if self.state.apply(signals) {
            log::info!("antialiasing: {}", self.effective_mode());
        }
        self.state.mode()
    }

    /// Records the whole frame into `target.encoder`.
    ///
    /// A `ShaderBinding` failure clears the target, is logged once per cause
    /// and returned; the caller may present the frame and carry on.
    pub fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<FrameReport, PipelineError> {
        self.track_presentation(ctx)?;

        self.scene.render(ctx, target.encoder, &self.surface)?;

        let (width, height) = ctx.viewport.size();
        let path = decide(
            self.state,
            self.post.is_some(),
            width,
            height,
            &self.tunables,
        );

        match path {
            FramePath::PostProcess { bundle, .. } => {
                let Some(post) = self.post.as_mut() else {
                    return Err(PipelineError::binding("no FXAA program loaded"));
                };
                if let Err(err) = post.apply(ctx, target, &self.surface, bundle.sub_mode(), &bundle) {
                    if err.is_frame_local() {
                        target.clear();
                        if self.failures.first(&err) {
                            log::error!("FXAA pass skipped: {err}");
                        }
                    }
                    return Err(err);
                }
            }
            FramePath::DirectBlit { reason } => {
                if reason == BlitReason::InvalidViewport {
                    let err = PipelineError::InvalidViewport { width, height };
                    if self.failures.first(&err) {
                        log::warn!("{err}; blitting without antialiasing");
                    }
                }
                self.blit.apply(ctx, target, &self.surface)?;
            }
        }

        Ok(FrameReport {
            mode: self.state.mode(),
            path,
        })
    }

    /// Releases the offscreen surface. Must run before the device is dropped.
    pub fn shutdown(&mut self) -> Result<(), PipelineError> {
        self.surface.dispose()
    }

    /// Recreates the surface when the presentation size or format moved away
    /// from it. A zero-sized presentation keeps the current surface.
    fn track_presentation(&mut self, ctx: &RenderCtx<'_>) -> Result<(), PipelineError> {
        if self.surface.is_disposed() {
            return Err(PipelineError::UseAfterDispose("offscreen surface"));
        }
        if !ctx.viewport.is_valid() {
            return Ok(());
        }

        let wanted = (ctx.viewport.size(), ctx.surface_format);
        if (self.surface.size(), self.surface.format()) == wanted {
            return Ok(());
        }

        let (width, height) = ctx.viewport.size();
        let replacement = OffscreenSurface::create(ctx.device, width, height, ctx.surface_format)?;
        log::info!(
            "offscreen surface {}x{} -> {width}x{height}",
            self.surface.width(),
            self.surface.height()
        );
        self.surface.dispose()?;
        self.surface = replacement;
        Ok(())
    }
}

/// Remembers which failures have already been logged.
#[derive(Debug, Default)]
struct FailureLog {
    seen: HashSet<String>,
}

impl FailureLog {
    /// True the first time a given failure is seen.
    fn first(&mut self, err: &PipelineError) -> bool {
        self.seen.insert(err.to_string())
    }
}
