use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Callbacks the runtime drives, in order: `on_gpu_ready` once, then
/// `on_window_event` / `on_frame` until exit, then `on_shutdown` once while
/// the GPU is still alive.
pub trait App {
    /// GPU resources can be created here. An error aborts startup.
    fn on_gpu_ready(&mut self, window: &WindowCtx<'_>, gpu: &Gpu<'_>) -> anyhow::Result<()>;

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Release GPU resources. The device is dropped right after this returns.
    fn on_shutdown(&mut self) {}
}
