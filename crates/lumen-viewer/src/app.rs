use anyhow::Context;

use lumen_engine::asset::SourceImage;
use lumen_engine::coords::Vec2;
use lumen_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use lumen_engine::device::Gpu;
use lumen_engine::frame::{AaState, FrameController};
use lumen_engine::input::{Key, Toggles};
use lumen_engine::post::{ShaderProgram, SubMode};
use lumen_engine::render::SceneRenderer;
use lumen_engine::time::ThroughputMeter;

use crate::config::ViewerConfig;

/// The viewer: one image, rendered offscreen, optionally antialiased.
pub struct ViewerApp {
    config: ViewerConfig,
    // Handed to the controller once the GPU is up.
    image: Option<SourceImage>,
    program: Option<ShaderProgram>,

    toggles: Toggles,
    controller: Option<FrameController>,
    meter: ThroughputMeter,
}

impl ViewerApp {
    pub fn new(
        config: ViewerConfig,
        image: Option<SourceImage>,
        program: Option<ShaderProgram>,
    ) -> anyhow::Result<Self> {
        let toggles = Toggles::new(config.input.bindings()?);
        let meter = ThroughputMeter::new(config.logging.report_interval());
        Ok(Self {
            config,
            image,
            program,
            toggles,
            controller: None,
            meter,
        })
    }

    fn initial_state(&self) -> AaState {
        AaState {
            enabled: self.config.input.aa_enabled,
            sub_mode: if self.config.input.quality {
                SubMode::Quality
            } else {
                SubMode::Console
            },
        }
    }
}

impl App for ViewerApp {
    fn on_gpu_ready(&mut self, window: &WindowCtx<'_>, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let scene = SceneRenderer::new(
            self.image.take(),
            Vec2::from(self.config.scene.image_position),
            self.config.scene.clear(),
        );

        let (w, h) = window.physical_size();
        if (w, h) != (self.config.window.width, self.config.window.height) {
            log::info!(
                "window is {w}x{h} physical px (requested {}x{})",
                self.config.window.width,
                self.config.window.height
            );
        }

        let controller = FrameController::new(
            gpu.device(),
            gpu.viewport(),
            gpu.surface_format(),
            scene,
            self.program.take(),
            self.config.fxaa,
            self.initial_state(),
        )
        .context("failed to create the offscreen pipeline")?;

        let bindings = self.toggles.bindings();
        log::info!(
            "ready: {} toggles antialiasing, {} switches variant, Escape exits (antialiasing: {})",
            bindings.toggle_aa,
            bindings.toggle_sub_mode,
            controller.effective_mode()
        );

        self.controller = Some(controller);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input.key_down(Key::Escape) {
            return AppControl::Exit;
        }
        let Some(controller) = self.controller.as_mut() else {
            return AppControl::Continue;
        };

        controller.begin_frame(self.toggles.sample(ctx.input));

        let control = ctx.render(|rctx, target| match controller.encode(rctx, target) {
            Ok(_) => AppControl::Continue,
            // Already logged by the controller; the next frame tries again.
            Err(err) if err.is_frame_local() => AppControl::Continue,
            Err(err) => {
                log::error!("frame failed: {err}");
                AppControl::Exit
            }
        });

        if let Some(report) = self.meter.record(ctx.time.now) {
            log::info!(
                "{:.0} fps ({:.3} ms/frame, {} frames) antialiasing: {}",
                report.fps,
                report.mean_frame_ms,
                report.frames,
                controller.effective_mode()
            );
        }

        control
    }

    fn on_shutdown(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            if let Err(err) = controller.shutdown() {
                log::error!("shutdown: {err}");
            }
        }
    }
}
