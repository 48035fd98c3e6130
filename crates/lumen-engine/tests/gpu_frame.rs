//! Frame pipeline on a real (headless) device.
//!
//! Each test returns early when no adapter is available, so the suite stays
//! green on machines without a GPU or software rasterizer.

use std::sync::mpsc;
use std::time::Duration;

use lumen_engine::asset::SourceImage;
use lumen_engine::coords::{Vec2, Viewport};
use lumen_engine::frame::{AaState, BlitReason, FrameController, FramePath, FrameReport};
use lumen_engine::input::ToggleSignals;
use lumen_engine::post::{FxaaTunables, ShaderProgram, SubMode, Technique};
use lumen_engine::render::{RenderCtx, RenderTarget, SceneRenderer};
use lumen_engine::PipelineError;

// 64 px * 4 bytes = one 256-byte copy row.
const W: u32 = 64;
const H: u32 = 32;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const PROGRAM: &str = include_str!("../../lumen-viewer/assets/fxaa.wgsl");

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
}

/// Diagonal stripes with hard edges, so FXAA has something to do.
fn stripes(w: u32, h: u32) -> SourceImage {
    let mut px = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let on = ((x + y) / 3) % 2 == 0;
            px.extend_from_slice(if on { &[255, 255, 255, 255] } else { &[20, 40, 200, 255] });
        }
    }
    SourceImage::from_rgba8(w, h, px).unwrap()
}

fn presentation_target(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test presentation target"),
        size: wgpu::Extent3d { width: W, height: H, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
    let bytes_per_row = W * 4;
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test readback"),
        size: (bytes_per_row * H) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(H),
            },
        },
        wgpu::Extent3d { width: W, height: H, depth_or_array_layers: 1 },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });

    let mut mapped = None;
    for _ in 0..5_000 {
        let _ = device.poll(wgpu::PollType::Poll);
        if let Ok(r) = rx.try_recv() {
            mapped = Some(r);
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    mapped.expect("readback timed out").expect("map failed");

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();
    data
}

struct Harness {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::Texture,
    controller: FrameController,
}

impl Harness {
    fn new(program: Option<ShaderProgram>, initial: AaState) -> Option<Self> {
        let (device, queue) = device()?;
        let scene = SceneRenderer::new(Some(stripes(W - 8, H - 8)), Vec2::new(4.0, 4.0), wgpu::Color::BLACK);
        let controller = FrameController::new(
            &device,
            Viewport::new(W, H),
            FORMAT,
            scene,
            program,
            FxaaTunables::default(),
            initial,
        )
        .unwrap();
        let target = presentation_target(&device);
        Some(Self { device, queue, target, controller })
    }

    fn frame(&mut self, signals: ToggleSignals) -> FramePath {
        self.encode(signals, Viewport::new(W, H)).unwrap().path
    }

    /// Encodes and submits one frame at `viewport`; the encoder is submitted
    /// even when the controller reports an error.
    fn encode(&mut self, signals: ToggleSignals, viewport: Viewport) -> Result<FrameReport, PipelineError> {
        self.controller.begin_frame(signals);

        let view = self.target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let ctx = RenderCtx::new(&self.device, &self.queue, FORMAT, viewport);
        let report = {
            let mut target = RenderTarget::new(&mut encoder, &view);
            self.controller.encode(&ctx, &mut target)
        };
        self.queue.submit(std::iter::once(encoder.finish()));
        report
    }

    fn presented(&self) -> Vec<u8> {
        read_back(&self.device, &self.queue, &self.target)
    }

    fn offscreen(&self) -> Vec<u8> {
        read_back(&self.device, &self.queue, self.controller.surface().texture().unwrap())
    }
}

/// True once `texture.destroy()` has run; views of a destroyed texture are
/// rejected by validation.
fn is_destroyed(device: &wgpu::Device, texture: &wgpu::Texture) -> bool {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let _view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    pollster::block_on(scope.pop()).is_some()
}

fn all_black(pixels: &[u8]) -> bool {
    pixels.chunks_exact(4).all(|px| px == [0, 0, 0, 255])
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.controller.shutdown();
    }
}

#[test]
fn aa_off_presents_the_offscreen_surface_unchanged() {
    let Some(mut h) = Harness::new(None, AaState::default()) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let path = h.frame(ToggleSignals::default());
    assert_eq!(path, FramePath::DirectBlit { reason: BlitReason::AaOff });

    let offscreen = h.offscreen();
    assert!(offscreen.iter().any(|&b| b != 0), "scene pass drew nothing");
    assert_eq!(h.presented(), offscreen);
}

#[test]
fn missing_program_ignores_the_aa_toggle() {
    let Some(mut h) = Harness::new(None, AaState::default()) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let path = h.frame(ToggleSignals { toggle_aa: true, toggle_sub_mode: false });
    assert_eq!(path, FramePath::DirectBlit { reason: BlitReason::ProgramUnavailable });
    assert_eq!(h.presented(), h.offscreen());
}

#[test]
fn both_fxaa_techniques_run_and_only_touch_the_target() {
    let program = ShaderProgram::from_wgsl("fxaa.wgsl", PROGRAM).unwrap();
    let initial = AaState { enabled: true, sub_mode: SubMode::Console };
    let Some(mut h) = Harness::new(Some(program), initial) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let path = h.frame(ToggleSignals::default());
    assert!(matches!(path, FramePath::PostProcess { technique: Technique::Console, .. }));
    let source = h.offscreen();
    let console = h.presented();

    let path = h.frame(ToggleSignals { toggle_aa: false, toggle_sub_mode: true });
    assert!(matches!(path, FramePath::PostProcess { technique: Technique::Quality, .. }));
    let quality = h.presented();

    // The scene is redrawn identically each frame; the post-process never writes to it.
    assert_eq!(h.offscreen(), source);
    assert_eq!(console.len(), source.len());
    assert_eq!(quality.len(), source.len());
    // Hard diagonal edges must be softened somewhere.
    assert_ne!(console, source);
    assert_ne!(quality, source);
}

#[test]
fn disposed_surface_is_refused() {
    let Some(mut h) = Harness::new(None, AaState::default()) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    h.controller.shutdown().unwrap();
    assert!(h.controller.surface().is_disposed());
    assert!(h.controller.shutdown().is_err());
}

#[test]
fn presentation_resize_recreates_the_offscreen_surface() {
    let Some(mut h) = Harness::new(None, AaState::default()) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    h.frame(ToggleSignals::default());
    let old = h.controller.surface().texture().unwrap().clone();
    assert!(!is_destroyed(&h.device, &old));

    let report = h.encode(ToggleSignals::default(), Viewport::new(W / 2, H / 2)).unwrap();
    assert_eq!(report.path, FramePath::DirectBlit { reason: BlitReason::AaOff });
    assert_eq!(h.controller.surface().size(), (W / 2, H / 2));
    assert!(!h.controller.surface().is_disposed());
    assert!(is_destroyed(&h.device, &old));

    // Same size again: the surface is kept.
    let current = h.controller.surface().texture().unwrap().clone();
    h.encode(ToggleSignals::default(), Viewport::new(W / 2, H / 2)).unwrap();
    assert!(!is_destroyed(&h.device, &current));
}

#[test]
fn missing_technique_blanks_the_frame_and_the_loop_recovers() {
    let console_only = PROGRAM.replace("fn fs_quality", "fn fs_quality_disabled");
    let program = ShaderProgram::from_wgsl("console-only", console_only).unwrap();
    let initial = AaState { enabled: true, sub_mode: SubMode::Quality };
    let Some(mut h) = Harness::new(Some(program), initial) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let err = h.encode(ToggleSignals::default(), Viewport::new(W, H)).unwrap_err();
    assert!(matches!(err, PipelineError::ShaderBinding(_)), "{err}");
    assert!(all_black(&h.presented()));

    // Same cause on the next frame, still no panic.
    assert!(h.encode(ToggleSignals::default(), Viewport::new(W, H)).is_err());

    let path = h.frame(ToggleSignals { toggle_aa: false, toggle_sub_mode: true });
    assert!(matches!(path, FramePath::PostProcess { technique: Technique::Console, .. }));
    assert!(!all_black(&h.presented()));
}

#[test]
fn depth_screen_texture_is_a_binding_error_not_a_crash() {
    let depth = PROGRAM
        .replace("texScreen: texture_2d<f32>", "texScreen: texture_depth_2d")
        .replace(
            "return textureSampleLevel(texScreen, samLinear, uv, 0.0);",
            "return vec4<f32>(textureSampleLevel(texScreen, samLinear, uv, 0));",
        );
    let program = ShaderProgram::from_wgsl("depth-screen", depth).unwrap();
    let initial = AaState { enabled: true, sub_mode: SubMode::Console };
    let Some(mut h) = Harness::new(Some(program), initial) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let err = h.encode(ToggleSignals::default(), Viewport::new(W, H)).unwrap_err();
    assert!(matches!(err, PipelineError::ShaderBinding(_)), "{err}");
    assert!(err.to_string().contains("texture_depth_2d"), "{err}");
    assert!(all_black(&h.presented()));
}

#[test]
fn vertex_inputs_the_quad_cannot_feed_are_a_binding_error() {
    let mismatched = PROGRAM
        .replace(
            "fn vs_fullscreen(@location(0) pos: vec2<f32>) -> VsOut {",
            "fn vs_fullscreen(@location(0) pos: vec2<f32>, @location(3) extra: f32) -> VsOut {",
        )
        .replace("out.uv = pos;", "out.uv = pos + vec2<f32>(extra * 0.0);");
    assert_ne!(mismatched, PROGRAM);
    let program = ShaderProgram::from_wgsl("extra-input", mismatched).unwrap();
    let initial = AaState { enabled: true, sub_mode: SubMode::Console };
    let Some(mut h) = Harness::new(Some(program), initial) else {
        eprintln!("no GPU adapter; skipping");
        return;
    };

    let err = h.encode(ToggleSignals::default(), Viewport::new(W, H)).unwrap_err();
    assert!(matches!(err, PipelineError::ShaderBinding(_)), "{err}");
    assert!(all_black(&h.presented()));

    // Turning AA off still presents the scene.
    let path = h.frame(ToggleSignals { toggle_aa: true, toggle_sub_mode: false });
    assert_eq!(path, FramePath::DirectBlit { reason: BlitReason::AaOff });
    assert_eq!(h.presented(), h.offscreen());
}
