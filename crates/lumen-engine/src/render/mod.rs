//! GPU passes: scene, direct blit, and the offscreen surface between them.
//!
//! Each pass owns its pipelines and buffers and builds them lazily for the
//! target format it is first asked to draw into.

mod blit;
pub(crate) mod common;
mod ctx;
mod offscreen;
mod scene;

pub use blit::BlitStage;
pub use ctx::{RenderCtx, RenderTarget};
pub use offscreen::OffscreenSurface;
pub use scene::SceneRenderer;
